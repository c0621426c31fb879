//! Slidecrawl - Reading Bear presentation downloader.
//!
//! This library provides functionality for:
//! - Driving a headless browser through a paginated slideshow
//! - Classifying slides and synthesizing caption sentences
//! - Saving slide media and sentences idempotently under one directory per presentation

pub mod browser;
pub mod config;
pub mod console;
pub mod crawler;
pub mod error;
pub mod session;
pub mod slide;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use browser::{BrowserSession, ChromeSession};
pub use config::Config;
pub use console::Console;
pub use crawler::{CrawlOutcome, CrawlSummary, SlideshowCrawler};
pub use error::{BrowserError, ConfigError, CrawlError, InputError, SetupError, StoreError};
pub use session::{PresentationMode, PresentationSession};
pub use slide::{CaptionBuffer, ExtractedWord, SlideObservation};
pub use store::{FileStore, LocalFileStore};
