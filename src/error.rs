//! Error types for the slidecrawl application.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Invalid command-line input, reported before any browser launch.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputError {
    /// Presentation ID is not a numeric token
    #[error("Invalid presentation ID: {0}")]
    InvalidPresentationId(String),

    /// Mode is neither `image` nor `video`
    #[error("Invalid presentation mode: {0}")]
    InvalidMode(String),
}

/// Error type for browser automation.
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Browser process could not be configured or started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// DevTools protocol call failed
    #[error("Browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// Element did not appear before the timeout elapsed
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// In-page script returned something unexpected
    #[error("Failed to evaluate script: {0}")]
    Evaluation(String),
}

/// Error type for writing artifacts to disk.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("File I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure while downloading
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Failed to download {url}: status {status}")]
    DownloadFailure { url: String, status: u16 },

    /// Media URL has no usable file name
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),
}

/// Error type for a crawl run.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// Browser collaborator failed
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// File store collaborator failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A control the crawl cannot continue without is absent
    #[error("Required element missing: {0}")]
    RequiredElementMissing(String),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for preparing a run from command-line input.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Presentation ID or mode was rejected
    #[error(transparent)]
    Input(#[from] InputError),

    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}
