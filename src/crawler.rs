//! Slideshow crawler.
//!
//! Opens a presentation's menu entry, starts the image or video slideshow,
//! and walks the slides until the end-of-presentation marker shows up,
//! saving every new image, video and caption sentence along the way.

use crate::browser::BrowserSession;
use crate::config::{Config, SelectorsConfig, SiteConfig, TimingConfig};
use crate::console::Console;
use crate::error::{BrowserError, ConfigError, CrawlError, StoreError};
use crate::session::{PresentationMode, PresentationSession};
use crate::slide::{CaptionBuffer, CaptionParser, ExtractedWord, SlideObservation};
use crate::store::FileStore;
use crate::utils::last_path_segment;

/// Counters for one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Slides observed before the end marker appeared.
    pub slides_visited: usize,
    /// Media files downloaded this run.
    pub media_downloaded: usize,
    /// Media files already on disk.
    pub media_skipped: usize,
    /// Total bytes downloaded.
    pub bytes_downloaded: u64,
    /// Sentence files written this run.
    pub sentences_written: usize,
    /// Sentence files already on disk.
    pub sentences_skipped: usize,
    /// Videos seen with no caption buffered before them.
    pub videos_without_caption: usize,
}

/// How a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The slideshow ran to its end marker.
    Completed(CrawlSummary),
    /// The site has no menu entry for the presentation. Nothing was written.
    MenuEntryMissing,
}

/// Drives one browser page through a presentation.
pub struct SlideshowCrawler {
    site: SiteConfig,
    selectors: SelectorsConfig,
    timing: TimingConfig,
    captions: CaptionParser,
    console: Console,
}

impl SlideshowCrawler {
    /// Creates a crawler from configuration.
    pub fn new(config: &Config, console: Console) -> Result<Self, ConfigError> {
        Ok(Self {
            site: config.site.clone(),
            selectors: config.selectors.clone(),
            timing: config.timing.clone(),
            captions: CaptionParser::new(&config.selectors.caption_chunk)?,
            console,
        })
    }

    /// Crawls the presentation, writing artifacts through `store`.
    ///
    /// `store` is expected to be rooted at the session's output directory.
    pub async fn crawl<B, S>(
        &self,
        browser: &mut B,
        store: &S,
        session: &PresentationSession,
    ) -> Result<CrawlOutcome, CrawlError>
    where
        B: BrowserSession + ?Sized,
        S: FileStore + ?Sized,
    {
        if !self.open_menu(browser, session.presentation_id()).await? {
            return Ok(CrawlOutcome::MenuEntryMissing);
        }

        self.console.step(&format!(
            "Starting {} slideshow for presentation {}",
            session.mode(),
            session.presentation_id()
        ));
        self.start_slideshow(browser, session.mode()).await?;

        let summary = self.crawl_slides(browser, store, session.mode()).await?;

        self.console.success(&format!(
            "Finished crawling {} slideshow for presentation {}",
            session.mode(),
            session.presentation_id()
        ));
        Ok(CrawlOutcome::Completed(summary))
    }

    /// Opens the menu entry for `presentation_id`.
    ///
    /// Returns `false` if the site lists no such presentation.
    async fn open_menu<B>(&self, browser: &mut B, presentation_id: &str) -> Result<bool, CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        browser.goto(&self.site.base_url).await?;
        self.console.debug(&format!("Opened {}", self.site.base_url));

        let selector = self.site.menu_selector(presentation_id);
        if !browser.has_element(&selector).await? {
            self.console.warning(&format!(
                "No link for presentation ID {} present. Exiting.",
                presentation_id
            ));
            return Ok(false);
        }

        browser
            .click(&selector, self.timing.element_timeout())
            .await
            .map_err(required)?;
        self.console
            .info(&format!("Navigated to menu for presentation {}", presentation_id));
        Ok(true)
    }

    /// Starts the slideshow and waits out the settle delay.
    async fn start_slideshow<B>(
        &self,
        browser: &mut B,
        mode: PresentationMode,
    ) -> Result<(), CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        let selector = match mode {
            PresentationMode::Image => &self.selectors.image_slideshow,
            PresentationMode::Video => &self.selectors.video_slideshow,
        };
        browser
            .click(selector, self.timing.element_timeout())
            .await
            .map_err(required)?;

        // "Next slide" misbehaves until the first slide has rendered, and the
        // page gives no signal for that.
        let settle = self.timing.settle_delay();
        self.console.info(&format!(
            "Waiting {} seconds for first slide to load...",
            settle.as_secs_f64()
        ));
        tokio::time::sleep(settle).await;
        self.console.info("Finished wait.");
        Ok(())
    }

    async fn crawl_slides<B, S>(
        &self,
        browser: &mut B,
        store: &S,
        mode: PresentationMode,
    ) -> Result<CrawlSummary, CrawlError>
    where
        B: BrowserSession + ?Sized,
        S: FileStore + ?Sized,
    {
        let mut summary = CrawlSummary::default();
        let mut captions = CaptionBuffer::default();

        while !self.is_finished(browser).await? {
            let observation = self.observe(browser, mode).await?;
            summary.slides_visited += 1;
            self.handle(observation, &mut captions, store, &mut summary)
                .await?;

            self.next_slide(browser).await?;
            self.console.info("Navigated to next slide");
        }

        self.report(&summary, mode);
        Ok(summary)
    }

    /// Short bounded check for the end-of-presentation marker.
    async fn is_finished<B>(&self, browser: &mut B) -> Result<bool, CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        Ok(browser
            .wait_for(
                &self.selectors.end_of_presentation,
                self.timing.end_check_timeout(),
            )
            .await?)
    }

    /// Classifies the current slide.
    ///
    /// In video mode a caption takes precedence over a video on the same
    /// slide.
    async fn observe<B>(
        &self,
        browser: &mut B,
        mode: PresentationMode,
    ) -> Result<SlideObservation, CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        match mode {
            PresentationMode::Image => {
                if browser.has_element(&self.selectors.image).await? {
                    return Ok(match browser.media_src(&self.selectors.image).await? {
                        Some(url) => SlideObservation::ImageMedia { url },
                        None => SlideObservation::Empty,
                    });
                }
            }
            PresentationMode::Video => {
                if browser.has_element(&self.selectors.caption).await? {
                    let markup = browser.outer_html_all(&self.selectors.caption).await?;
                    return Ok(SlideObservation::Caption {
                        text: self.captions.sentence(&markup),
                    });
                }
                if browser.has_element(&self.selectors.video).await? {
                    return Ok(match browser.media_src(&self.selectors.video).await? {
                        Some(url) => SlideObservation::VideoMedia { url },
                        None => SlideObservation::Empty,
                    });
                }
            }
        }
        Ok(SlideObservation::Empty)
    }

    async fn handle<S>(
        &self,
        observation: SlideObservation,
        captions: &mut CaptionBuffer,
        store: &S,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError>
    where
        S: FileStore + ?Sized,
    {
        match observation {
            SlideObservation::ImageMedia { url } => {
                self.console.info(&format!("Detected image: {}", url));
                self.save_media(store, &url, summary).await?;
            }
            SlideObservation::Caption { text } => {
                self.console.info(&format!("Detected sentence: {}", text));
                captions.observe_caption(text);
            }
            SlideObservation::VideoMedia { url } => {
                self.console.info(&format!("Detected video: {}", url));
                let sentence = captions.observe_video();
                self.save_media(store, &url, summary).await?;

                let Some(word) = ExtractedWord::from_media_url(&url) else {
                    self.console.warning(&format!(
                        "Could not derive a word from {}, no sentence file written",
                        url
                    ));
                    return Ok(());
                };

                match sentence {
                    Some(sentence) => self.save_sentence(store, &word, &sentence, summary).await?,
                    None => {
                        summary.videos_without_caption += 1;
                        self.console.warning(&format!(
                            "No caption seen before video for '{}', no sentence file written",
                            word
                        ));
                    }
                }
            }
            SlideObservation::Empty => {
                self.console.debug("Nothing to save on this slide");
            }
        }
        Ok(())
    }

    /// Downloads a media file unless a file of the same name exists.
    async fn save_media<S>(
        &self,
        store: &S,
        url: &str,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError>
    where
        S: FileStore + ?Sized,
    {
        let name =
            last_path_segment(url).ok_or_else(|| StoreError::InvalidUrl(url.to_string()))?;
        let path = store.root().join(&name);

        if store.exists(&name).await? {
            summary.media_skipped += 1;
            self.console.skip(&format!(
                "File already exists at target location, skipping download ({})",
                path.display()
            ));
            return Ok(());
        }

        let bytes = store.download(url, &name).await?;
        summary.media_downloaded += 1;
        summary.bytes_downloaded += bytes;
        self.console.success(&format!(
            "Downloaded file: {} ({} bytes)",
            path.display(),
            bytes
        ));
        Ok(())
    }

    /// Writes `<word>.txt` unless it exists.
    async fn save_sentence<S>(
        &self,
        store: &S,
        word: &ExtractedWord,
        sentence: &str,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError>
    where
        S: FileStore + ?Sized,
    {
        let name = word.sentence_filename();
        let path = store.root().join(&name);

        if store.exists(&name).await? {
            summary.sentences_skipped += 1;
            self.console.skip(&format!(
                "Sentence file already exists, skipping write ({})",
                path.display()
            ));
            return Ok(());
        }

        store.write_text(&name, sentence).await?;
        summary.sentences_written += 1;
        self.console
            .success(&format!("Wrote sentence file: {}", path.display()));
        Ok(())
    }

    async fn next_slide<B>(&self, browser: &mut B) -> Result<(), CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        browser
            .click(&self.selectors.next_slide, self.timing.element_timeout())
            .await
            .map_err(required)
    }

    fn report(&self, summary: &CrawlSummary, mode: PresentationMode) {
        self.console.info(&format!(
            "Visited {} slides: {} downloaded, {} already present",
            self.console.count(summary.slides_visited),
            self.console.count(summary.media_downloaded),
            summary.media_skipped
        ));
        if mode == PresentationMode::Video {
            self.console.info(&format!(
                "Sentences: {} written, {} already present, {} videos without caption",
                self.console.count(summary.sentences_written),
                summary.sentences_skipped,
                summary.videos_without_caption
            ));
        }
    }
}

/// A control the crawl clicks must exist; its absence ends the run.
fn required(err: BrowserError) -> CrawlError {
    match err {
        BrowserError::ElementNotFound(selector) => CrawlError::RequiredElementMissing(selector),
        other => CrawlError::Browser(other),
    }
}
