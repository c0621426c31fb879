//! Presentation session: what one crawl run targets and where it writes.

use crate::config::Config;
use crate::error::{InputError, SetupError};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

/// Presentation IDs are plain decimal tokens.
static PRESENTATION_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Which slideshow variant to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    /// Still images, one per slide.
    Image,
    /// Caption slides followed by a video for each word.
    Video,
}

impl PresentationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PresentationMode::Image => "image",
            PresentationMode::Video => "video",
        }
    }
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresentationMode {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(PresentationMode::Image),
            "video" => Ok(PresentationMode::Video),
            other => Err(InputError::InvalidMode(other.to_string())),
        }
    }
}

/// One crawl run. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationSession {
    presentation_id: String,
    mode: PresentationMode,
    output_directory: PathBuf,
}

impl PresentationSession {
    /// Validates raw command-line tokens, then loads the configuration and
    /// builds a session rooted at its output directory.
    ///
    /// Input is checked first: a rejected ID or mode returns before the
    /// config file is read or created. `config_path` falls back to the
    /// platform config location; `overrides` is applied before validation.
    pub fn prepare<F>(
        presentation_id: &str,
        mode: &str,
        config_path: Option<&Path>,
        overrides: F,
    ) -> Result<(Config, Self), SetupError>
    where
        F: FnOnce(&mut Config),
    {
        let (presentation_id, mode) = parse_input(presentation_id, mode)?;

        let mut config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        overrides(&mut config);
        config.validate()?;

        let session = Self::new(presentation_id, mode, &config.paths.output_directory);
        Ok((config, session))
    }

    /// Builds a session from already validated parts.
    pub fn new(presentation_id: String, mode: PresentationMode, output_root: &Path) -> Self {
        let output_directory = output_root.join(&presentation_id);
        Self {
            presentation_id,
            mode,
            output_directory,
        }
    }

    pub fn presentation_id(&self) -> &str {
        &self.presentation_id
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    /// `<output_root>/<presentation_id>`. Not created until the first write.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }
}

/// Validates a raw ID and mode.
///
/// The ID is checked before the mode, so a run with both wrong reports
/// the ID.
pub fn parse_input(
    presentation_id: &str,
    mode: &str,
) -> Result<(String, PresentationMode), InputError> {
    let presentation_id = validate_presentation_id(presentation_id)?;
    let mode = mode.parse()?;
    Ok((presentation_id, mode))
}

/// Checks that a presentation ID is a non-empty run of ASCII digits.
pub fn validate_presentation_id(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if PRESENTATION_ID_REGEX.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(InputError::InvalidPresentationId(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("image".parse::<PresentationMode>(), Ok(PresentationMode::Image));
        assert_eq!("video".parse::<PresentationMode>(), Ok(PresentationMode::Video));
        assert_eq!(
            "Video".parse::<PresentationMode>(),
            Err(InputError::InvalidMode("Video".to_string()))
        );
        assert!("".parse::<PresentationMode>().is_err());
    }

    #[test]
    fn test_presentation_id_validation() {
        assert_eq!(validate_presentation_id("123").unwrap(), "123");
        assert_eq!(validate_presentation_id(" 7 ").unwrap(), "7");
        assert!(validate_presentation_id("").is_err());
        assert!(validate_presentation_id("abc").is_err());
        assert!(validate_presentation_id("12a").is_err());
        assert!(validate_presentation_id("-5").is_err());
    }

    #[test]
    fn test_session_output_directory() {
        let session =
            PresentationSession::new("55".to_string(), PresentationMode::Video, Path::new("/data/bear"));
        assert_eq!(session.presentation_id(), "55");
        assert_eq!(session.mode(), PresentationMode::Video);
        assert_eq!(session.output_directory(), Path::new("/data/bear/55"));
    }

    #[test]
    fn test_input_reports_id_first() {
        let err = parse_input("x", "audio").unwrap_err();
        assert_eq!(err, InputError::InvalidPresentationId("x".to_string()));

        let err = parse_input("9", "audio").unwrap_err();
        assert_eq!(err, InputError::InvalidMode("audio".to_string()));

        assert_eq!(
            parse_input(" 12 ", "image").unwrap(),
            ("12".to_string(), PresentationMode::Image)
        );
    }

    #[test]
    fn test_rejected_input_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config").join("config.toml");
        let output_root = dir.path().join("out");

        for (id, mode) in [("abc", "image"), ("42", "audio"), ("", "")] {
            let result =
                PresentationSession::prepare(id, mode, Some(&config_path), |config| {
                    config.paths.output_directory = output_root.clone();
                });

            assert!(matches!(result, Err(SetupError::Input(_))));
            assert!(!config_path.exists());
            assert!(!dir.path().join("config").exists());
            assert!(!output_root.exists());
        }
    }

    #[test]
    fn test_prepare_builds_session_from_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        let output_root = dir.path().join("out");

        let (config, session) =
            PresentationSession::prepare("42", "video", Some(&config_path), |config| {
                config.paths.output_directory = output_root.clone();
                config.timing.settle_delay_sec = 1.5;
            })
            .unwrap();

        assert!(config_path.exists());
        assert_eq!(config.timing.settle_delay_sec, 1.5);
        assert_eq!(session.mode(), PresentationMode::Video);
        assert_eq!(session.output_directory(), output_root.join("42"));
        // Output is only created by the first write
        assert!(!output_root.exists());
    }

    #[test]
    fn test_prepare_rejects_invalid_override() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let result = PresentationSession::prepare("42", "image", Some(&config_path), |config| {
            config.timing.settle_delay_sec = 1e20;
        });

        assert!(matches!(result, Err(SetupError::Config(_))));
    }
}
