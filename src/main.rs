//! Mekuru CLI - heuristic image gallery scraper and downloader.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mekuru::config::Config;
use mekuru::console::Console;
use mekuru::detect::{DetectEvent, EventSink};
use mekuru::fetch::HttpFetcher;
use mekuru::scrape::{GalleryScraper, ScrapeOutcome};
use std::path::PathBuf;

/// Heuristic image gallery scraper and downloader.
#[derive(Parser, Debug)]
#[command(name = "mekuru")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a config file (defaults to the platform config dir).
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a single gallery or listing URL.
    Scrape {
        /// Gallery or listing/category URL.
        url: String,

        /// Override the output directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Scrape every URL in a file (one per line, `#` comments skipped).
    Batch {
        /// File with one URL per line.
        file: PathBuf,
    },
}

/// Event sink that renders detection events as muted console lines.
struct ConsoleEvents {
    console: Console,
}

impl EventSink for ConsoleEvents {
    fn on_event(&self, event: DetectEvent) {
        match event {
            DetectEvent::ContainerMatched {
                selector,
                image_count,
            } => self.console.detail(&format!(
                "gallery container matched '{selector}' ({image_count} images)"
            )),
            DetectEvent::ContainerFallback { image_count } => self
                .console
                .detail(&format!("fallback container picked ({image_count} images)")),
            DetectEvent::NoContainer => self
                .console
                .detail("no gallery container, scanning whole page"),
            DetectEvent::TagContainerScored { score, tag_count } => self
                .console
                .detail(&format!("tag container scored {score} ({tag_count} tags)")),
            DetectEvent::ListingDetected { thumb_link_count } => self.console.detail(&format!(
                "listing structure detected ({thumb_link_count} thumb links)"
            )),
            DetectEvent::GalleryLinksFound { count } => self
                .console
                .detail(&format!("{count} gallery links harvested")),
            DetectEvent::NextPageFound { url, strategy } => self
                .console
                .detail(&format!("next page via {strategy}: {url}")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.section("Mekuru - Gallery Scraper");

    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path).context("Failed to load configuration")?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.validate().context("Invalid configuration")?;
    console.success("Configuration loaded");

    if let Command::Scrape {
        output: Some(output),
        ..
    } = &args.command
    {
        config.download.output_dir = output.clone();
    }

    let fetcher = HttpFetcher::new(&config.scraper).context("Failed to build HTTP client")?;
    let events = ConsoleEvents {
        console: console.clone(),
    };
    let scraper = GalleryScraper::new(config, Box::new(fetcher), Box::new(events))?;

    match args.command {
        Command::Scrape { url, .. } => {
            let outcome = scraper.scrape(&url).await?;
            report_outcome(&console, &outcome);
        }
        Command::Batch { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let urls: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect();

            if urls.is_empty() {
                console.warning("No URLs found in batch file");
                return Ok(());
            }

            console.info(&format!("Batch of {} URLs", urls.len()));
            let summary = scraper.scrape_batch(&urls).await;
            console.section("Batch summary");
            console.summary_row("total", &summary.total.to_string());
            console.summary_row("completed", &summary.completed.to_string());
            console.summary_row("failed", &summary.failed.to_string());
        }
    }

    console.section("Done!");
    Ok(())
}

fn report_outcome(console: &Console, outcome: &ScrapeOutcome) {
    match outcome {
        ScrapeOutcome::Gallery { images, stats } => {
            console.success(&format!(
                "Gallery complete: {} images, {} downloaded, {} failed",
                images,
                stats.downloaded,
                stats.failed()
            ));
        }
        ScrapeOutcome::Listing {
            galleries,
            completed,
            failed,
        } => {
            console.success(&format!(
                "Listing complete: {galleries} galleries ({completed} ok, {failed} failed)"
            ));
        }
        ScrapeOutcome::NoContent => {
            console.warning("No content found at URL");
        }
    }
}
