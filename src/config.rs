//! Configuration management for slidecrawl.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "Slidecrawl";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder replaced by the presentation ID in the menu selector template.
pub const PRESENTATION_ID_PLACEHOLDER: &str = "{id}";

/// Upper bound for every configured wait.
pub const MAX_WAIT: Duration = Duration::from_secs(60 * 60);

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote site settings.
    pub site: SiteConfig,

    /// CSS selectors for slideshow controls and content.
    pub selectors: SelectorsConfig,

    /// Waits and timeouts.
    pub timing: TimingConfig,

    /// Browser launch settings.
    pub browser: BrowserConfig,

    /// File paths.
    pub paths: PathsConfig,

    /// Enable verbose debug logging.
    pub debug: bool,
}

/// Remote site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin the crawl starts from.
    pub base_url: String,

    /// Selector for a presentation's menu entry; `{id}` is substituted.
    pub menu_selector_template: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.readingbear.org".to_string(),
            menu_selector_template: r#".PresentationItem .Title a[href$="PresentationID={id}"]"#
                .to_string(),
        }
    }
}

impl SiteConfig {
    /// Builds the menu entry selector for a presentation.
    pub fn menu_selector(&self, presentation_id: &str) -> String {
        self.menu_selector_template
            .replace(PRESENTATION_ID_PLACEHOLDER, presentation_id)
    }
}

/// Selectors for the slideshow page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorsConfig {
    /// Button starting the image slideshow.
    pub image_slideshow: String,
    /// Button starting the video slideshow.
    pub video_slideshow: String,
    /// "Next slide" control.
    pub next_slide: String,
    /// Marker present only once the presentation is exhausted.
    pub end_of_presentation: String,
    /// Slide image.
    pub image: String,
    /// Slide video.
    pub video: String,
    /// Caption word element containing karaoke chunk spans.
    pub caption: String,
    /// Chunk element inside a caption word.
    pub caption_chunk: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            image_slideshow: "#btnPresentationType_sf".to_string(),
            video_slideshow: "#btnPresentationType_ss".to_string(),
            next_slide: "#btnNextSlide".to_string(),
            end_of_presentation: "#EndOfPresentationWindow[style]".to_string(),
            image: ".PresentationImageCopyright + img".to_string(),
            video: "#PresentationPlayerContainer video".to_string(),
            caption: ".KaraokeWord".to_string(),
            caption_chunk: "span".to_string(),
        }
    }
}

/// Wait and timeout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Unconditional wait after starting the slideshow, in seconds.
    ///
    /// The first slide renders after an unpredictable delay and the site
    /// offers no readiness signal; "next slide" is unreliable until then.
    pub settle_delay_sec: f64,

    /// Bounded wait for the end-of-presentation marker, in milliseconds.
    pub end_check_timeout_ms: u64,

    /// Wait for required controls to appear, in seconds.
    pub element_timeout_sec: f64,

    /// Interval between selector polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_sec: 10.0,
            end_check_timeout_ms: 2000,
            element_timeout_sec: 30.0,
            poll_interval_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        bounded_secs(self.settle_delay_sec)
    }

    pub fn end_check_timeout(&self) -> Duration {
        Duration::from_millis(self.end_check_timeout_ms).min(MAX_WAIT)
    }

    pub fn element_timeout(&self) -> Duration {
        bounded_secs(self.element_timeout_sec)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms).min(MAX_WAIT)
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window.
    pub headless: bool,

    /// Window width in pixels.
    pub window_width: u32,

    /// Window height in pixels.
    pub window_height: u32,

    /// Disable the HTTP cache; the site renders inconsistently with it on.
    pub disable_cache: bool,

    /// Path to a Chromium executable. Auto-detected when unset.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1080,
            window_height: 1024,
            disable_cache: true,
            executable: None,
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root directory; each presentation gets its own subdirectory.
    pub output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("slides"),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.site.base_url).is_err() {
            return Err(invalid("site.base_url", "must be an absolute URL"));
        }

        if !self
            .site
            .menu_selector_template
            .contains(PRESENTATION_ID_PLACEHOLDER)
        {
            return Err(invalid(
                "site.menu_selector_template",
                "must contain the {id} placeholder",
            ));
        }

        let selectors = [
            ("selectors.image_slideshow", &self.selectors.image_slideshow),
            ("selectors.video_slideshow", &self.selectors.video_slideshow),
            ("selectors.next_slide", &self.selectors.next_slide),
            (
                "selectors.end_of_presentation",
                &self.selectors.end_of_presentation,
            ),
            ("selectors.image", &self.selectors.image),
            ("selectors.video", &self.selectors.video),
            ("selectors.caption", &self.selectors.caption),
            ("selectors.caption_chunk", &self.selectors.caption_chunk),
        ];
        for (key, value) in selectors {
            if value.trim().is_empty() {
                return Err(invalid(key, "must not be empty"));
            }
        }

        if !within_max_wait(self.timing.settle_delay_sec) {
            return Err(invalid(
                "timing.settle_delay_sec",
                "must be between 0 and 3600 seconds",
            ));
        }

        if !within_max_wait(self.timing.element_timeout_sec) {
            return Err(invalid(
                "timing.element_timeout_sec",
                "must be between 0 and 3600 seconds",
            ));
        }

        if Duration::from_millis(self.timing.end_check_timeout_ms) > MAX_WAIT {
            return Err(invalid(
                "timing.end_check_timeout_ms",
                "must be at most 3600000 milliseconds",
            ));
        }

        if self.timing.poll_interval_ms == 0 {
            return Err(invalid("timing.poll_interval_ms", "must be greater than 0"));
        }

        Ok(())
    }
}

/// Converts seconds to a duration, clamped to `0..=MAX_WAIT`.
fn bounded_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0))
        .unwrap_or(MAX_WAIT)
        .min(MAX_WAIT)
}

fn within_max_wait(secs: f64) -> bool {
    Duration::try_from_secs_f64(secs).is_ok_and(|d| d <= MAX_WAIT)
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.base_url, "https://www.readingbear.org");
        assert_eq!(config.timing.settle_delay(), Duration::from_secs(10));
        assert_eq!(config.timing.end_check_timeout(), Duration::from_secs(2));
        assert!(config.browser.headless);
        assert!(config.browser.disable_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_menu_selector() {
        let site = SiteConfig::default();
        assert_eq!(
            site.menu_selector("42"),
            r#".PresentationItem .Title a[href$="PresentationID=42"]"#
        );
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.timing.settle_delay_sec = 3.5;
        config.paths.output_directory = PathBuf::from("/tmp/bear");
        let file = NamedTempFile::new().unwrap();

        config.save_to(file.path()).unwrap();

        let loaded = Config::load_from(file.path()).unwrap();
        assert_eq!(loaded.timing.settle_delay_sec, 3.5);
        assert_eq!(loaded.paths.output_directory, PathBuf::from("/tmp/bear"));
        assert_eq!(loaded.selectors.next_slide, "#btnNextSlide");
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.timing.poll_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "debug = true\n[timing]\nsettle_delay_sec = 1.0\n").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert!(config.debug);
        assert_eq!(config.timing.settle_delay_sec, 1.0);
        assert_eq!(config.timing.end_check_timeout_ms, 2000);
        assert_eq!(config.selectors.caption, ".KaraokeWord");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.site.menu_selector_template = "a.menu".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.selectors.next_slide = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.settle_delay_sec = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_waits_rejected() {
        let mut config = Config::default();
        config.timing.settle_delay_sec = 1e20;
        assert!(config.validate().is_err());
        // Accessor clamps instead of panicking
        assert_eq!(config.timing.settle_delay(), MAX_WAIT);

        let mut config = Config::default();
        config.timing.element_timeout_sec = f64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(config.timing.element_timeout(), MAX_WAIT);

        let mut config = Config::default();
        config.timing.settle_delay_sec = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.end_check_timeout_ms = u64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(config.timing.end_check_timeout(), MAX_WAIT);

        let mut config = Config::default();
        config.timing.settle_delay_sec = 3600.0;
        assert!(config.validate().is_ok());
    }
}
