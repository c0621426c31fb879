//! Slidecrawl CLI - Reading Bear presentation downloader.

use anyhow::{Context, Result};
use clap::Parser;
use slidecrawl::browser::{BrowserSession, ChromeSession};
use slidecrawl::config::Config;
use slidecrawl::console::Console;
use slidecrawl::crawler::{CrawlOutcome, SlideshowCrawler};
use slidecrawl::error::SetupError;
use slidecrawl::session::PresentationSession;
use slidecrawl::store::LocalFileStore;
use std::path::PathBuf;

/// Downloads the images or videos of a Reading Bear presentation.
#[derive(Parser, Debug)]
#[command(name = "slidecrawl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Numeric presentation ID, as in the site's `PresentationID=` links.
    #[arg(allow_hyphen_values = true)]
    presentation_id: String,

    /// Slideshow to crawl: `image` or `video`.
    mode: String,

    /// Root directory for output (overrides config).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait for the first slide to render (overrides config).
    #[arg(long)]
    settle_delay: Option<f64>,

    /// Show the browser window.
    #[arg(long)]
    headed: bool,

    /// Print debug output.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    // Bad input ends the run before anything touches the disk or network
    let output = args.output;
    let settle_delay = args.settle_delay;
    let headed = args.headed;
    let debug = args.debug;
    let prepared = PresentationSession::prepare(
        &args.presentation_id,
        &args.mode,
        args.config.as_deref(),
        |config| {
            if let Some(output) = output {
                config.paths.output_directory = output;
            }
            if let Some(delay) = settle_delay {
                config.timing.settle_delay_sec = delay;
            }
            if headed {
                config.browser.headless = false;
            }
            config.debug |= debug;
        },
    );
    let (config, session) = match prepared {
        Ok(prepared) => prepared,
        Err(SetupError::Input(e)) => {
            console.error(&e.to_string());
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    console.section("Slidecrawl - Reading Bear Downloader");
    console.success(&format!(
        "Configuration loaded (settle delay {:.1}s)",
        config.timing.settle_delay().as_secs_f64()
    ));

    let console = console.with_debug(config.debug);

    console.info(&format!(
        "Crawling presentation {} in {} mode",
        session.presentation_id(),
        session.mode()
    ));
    console.info(&format!(
        "Output root: {}",
        config.paths.output_directory.display()
    ));

    let crawler = SlideshowCrawler::new(&config, console.clone())
        .context("Invalid selector configuration")?;
    let store = LocalFileStore::new(session.output_directory())
        .context("Failed to create HTTP client")?;

    console.step("Launching browser...");
    let mut browser = ChromeSession::launch(&config.browser, config.timing.poll_interval())
        .await
        .context("Failed to launch browser")?;

    let result = crawler.crawl(&mut browser, &store, &session).await;

    if let Err(e) = browser.close().await {
        console.warning(&format!("Failed to close browser: {}", e));
    }

    match result.context("Crawl failed")? {
        CrawlOutcome::Completed(summary) => {
            console.success(&format!(
                "Saved {} new files to {}",
                console.count(summary.media_downloaded + summary.sentences_written),
                session.output_directory().display()
            ));
        }
        CrawlOutcome::MenuEntryMissing => {
            console.info("Nothing to crawl.");
        }
    }

    console.section("Done!");
    Ok(())
}
