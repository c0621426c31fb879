//! Slide content model.
//!
//! A slide is observed, classified into a [`SlideObservation`], and then
//! handled by the crawler. Caption text is synthesized from karaoke chunk
//! markup and buffered in a [`CaptionBuffer`] until the matching video shows
//! up.

use crate::error::ConfigError;
use crate::utils::last_path_segment;
use scraper::{Html, Selector};
use std::fmt;

/// What the current slide shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideObservation {
    /// A slide image with its resolved source URL.
    ImageMedia { url: String },
    /// A slide video with its resolved source URL.
    VideoMedia { url: String },
    /// A caption sentence, already synthesized from its chunks.
    Caption { text: String },
    /// Nothing the current mode cares about.
    Empty,
}

/// Word a video illustrates, derived from its file name.
///
/// Used as the stem of the sentence file written next to the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedWord(String);

impl ExtractedWord {
    /// Takes the last path segment, drops everything from the first `.`, then
    /// everything from the first `-`.
    ///
    /// `https://host/media/tree-03.mp4` yields `tree`.
    pub fn from_media_url(url: &str) -> Option<Self> {
        let segment = last_path_segment(url)?;
        let basename = segment.split('.').next().unwrap_or_default();
        let word = basename.split('-').next().unwrap_or_default();
        if word.is_empty() {
            None
        } else {
            Some(Self(word.to_string()))
        }
    }

    /// Name of the sentence file for this word.
    pub fn sentence_filename(&self) -> String {
        format!("{}.txt", self.0)
    }
}

impl fmt::Display for ExtractedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Joins caption chunk groups into one sentence.
///
/// Chunks within a group are concatenated with no separator and the group is
/// trimmed. Groups are joined by a single space and a period is appended.
pub fn build_sentence<G, C>(groups: G) -> String
where
    G: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let words: Vec<String> = groups
        .into_iter()
        .map(|chunks| {
            chunks
                .into_iter()
                .map(|c| c.as_ref().to_string())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect();

    format!("{}.", words.join(" "))
}

/// Extracts caption chunk text from caption element markup.
#[derive(Debug)]
pub struct CaptionParser {
    chunk: Selector,
}

impl CaptionParser {
    /// Creates a parser matching chunk elements with `chunk_selector`.
    pub fn new(chunk_selector: &str) -> Result<Self, ConfigError> {
        let chunk = Selector::parse(chunk_selector).map_err(|e| ConfigError::InvalidValue {
            key: "selectors.caption_chunk".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { chunk })
    }

    /// Returns the text of each chunk element in document order.
    pub fn chunks(&self, caption_html: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(caption_html);
        fragment
            .select(&self.chunk)
            .map(|elem| elem.text().collect::<String>())
            .collect()
    }

    /// Synthesizes the sentence for a slide from its caption elements.
    pub fn sentence<S: AsRef<str>>(&self, caption_elements: &[S]) -> String {
        build_sentence(
            caption_elements
                .iter()
                .map(|html| self.chunks(html.as_ref())),
        )
    }
}

/// Pairs each caption with the next video in video mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptionBuffer {
    /// No sentence waiting for a video.
    #[default]
    AwaitingCaption,
    /// A sentence was seen and is waiting for its video.
    CaptionBuffered(String),
}

impl CaptionBuffer {
    /// Records a caption. The last caption before a video wins.
    pub fn observe_caption(&mut self, sentence: String) {
        *self = CaptionBuffer::CaptionBuffered(sentence);
    }

    /// Records a video and hands back the sentence it pairs with, if any.
    pub fn observe_video(&mut self) -> Option<String> {
        match std::mem::take(self) {
            CaptionBuffer::CaptionBuffered(sentence) => Some(sentence),
            CaptionBuffer::AwaitingCaption => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_from_media_url() {
        let word = ExtractedWord::from_media_url("https://cdn.example.org/v/tree-03.mp4").unwrap();
        assert_eq!(word.to_string(), "tree");
        assert_eq!(word.sentence_filename(), "tree.txt");
    }

    #[test]
    fn test_word_without_hyphen_or_extension() {
        assert_eq!(
            ExtractedWord::from_media_url("https://h/v/cat.mp4").unwrap().to_string(),
            "cat"
        );
        assert_eq!(
            ExtractedWord::from_media_url("https://h/v/dog").unwrap().to_string(),
            "dog"
        );
        // Dot is cut before the hyphen
        assert_eq!(
            ExtractedWord::from_media_url("https://h/v/a.b-c.mp4").unwrap().to_string(),
            "a"
        );
    }

    #[test]
    fn test_word_unusable_urls() {
        assert!(ExtractedWord::from_media_url("https://h/v/").is_none());
        assert!(ExtractedWord::from_media_url("https://h/v/-01.mp4").is_none());
        assert!(ExtractedWord::from_media_url("https://h/v/.mp4").is_none());
    }

    #[test]
    fn test_build_sentence_concatenates_then_joins() {
        let sentence = build_sentence([vec!["c", "a", "t"], vec![" is", " on", " mat"]]);
        assert_eq!(sentence, "cat is on mat.");
    }

    #[test]
    fn test_build_sentence_empty() {
        let groups: Vec<Vec<String>> = Vec::new();
        assert_eq!(build_sentence(groups), ".");
    }

    #[test]
    fn test_caption_parser_chunks() {
        let parser = CaptionParser::new("span").unwrap();
        let html = r#"<div class="KaraokeWord"><span>b</span><span>ea</span><span>r</span></div>"#;
        assert_eq!(parser.chunks(html), vec!["b", "ea", "r"]);
    }

    #[test]
    fn test_caption_parser_sentence() {
        let parser = CaptionParser::new("span").unwrap();
        let elements = [
            r#"<div class="KaraokeWord"><span>th</span><span>e</span></div>"#,
            r#"<div class="KaraokeWord"> <span>c</span><span>a</span><span>t</span> </div>"#,
            r#"<div class="KaraokeWord"><span>r</span><span>a</span><span>n</span></div>"#,
        ];
        assert_eq!(parser.sentence(&elements[..]), "the cat ran.");
    }

    #[test]
    fn test_caption_parser_rejects_bad_selector() {
        assert!(CaptionParser::new("span[").is_err());
    }

    #[test]
    fn test_caption_buffer_pairs_last_caption() {
        let mut buffer = CaptionBuffer::default();
        assert_eq!(buffer, CaptionBuffer::AwaitingCaption);

        buffer.observe_caption("stale.".to_string());
        buffer.observe_caption("fresh.".to_string());
        assert_eq!(buffer, CaptionBuffer::CaptionBuffered("fresh.".to_string()));

        assert_eq!(buffer.observe_video().as_deref(), Some("fresh."));
        assert_eq!(buffer, CaptionBuffer::AwaitingCaption);
    }

    #[test]
    fn test_caption_buffer_video_without_caption() {
        let mut buffer = CaptionBuffer::default();
        assert_eq!(buffer.observe_video(), None);
        assert_eq!(buffer, CaptionBuffer::AwaitingCaption);
    }
}
