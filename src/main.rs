mod cli;
mod download;
mod feed;
mod filter;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::Args;
use crate::download::DownloadOutcome;
use crate::filter::OrderSelector;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;

    let summary = run(&args, &client).await?;
    if let Some(summary) = summary {
        summary.print();
    }

    Ok(())
}

/// Totals for one completed run.
#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    downloaded: u32,
    skipped: u32,
    bytes: u64,
    duration: Duration,
}

impl RunSummary {
    fn from_outcomes(outcomes: &[DownloadOutcome], duration: Duration) -> Self {
        let mut summary = Self {
            duration,
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome {
                DownloadOutcome::Downloaded { bytes, .. } => {
                    summary.downloaded += 1;
                    summary.bytes += bytes;
                }
                DownloadOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }

        summary
    }

    fn print(&self) {
        println!();
        println!("=== Summary ===");
        println!("  Downloaded: {}", self.downloaded);
        println!("  Skipped:    {}", self.skipped);
        println!("  Bytes:      {}", self.bytes);
        println!("  Duration:   {:.1}s", self.duration.as_secs_f64());
    }
}

fn nothing_to_download(order: &str) -> String {
    format!("No scenes available to download for {order}")
}

/// Fetch the order feed, pick the requested scenes, and download them.
///
/// Returns `None` when there was nothing to download.
async fn run(args: &Args, client: &reqwest::Client) -> Result<Option<RunSummary>> {
    let target_dir = PathBuf::from(&args.target_directory);
    if !target_dir.exists() {
        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("failed to create {}", target_dir.display()))?;
        println!("Created target_directory:{}", args.target_directory);
    }

    let feed_url = feed::feed_url(&args.host, &args.email)?;
    let entries = feed::fetch_entries(client, &feed_url).await;

    let selector = OrderSelector::new(&args.order);
    let links = filter::select_links(&entries, &selector);

    if links.is_empty() {
        println!("{}", nothing_to_download(&args.order));
        return Ok(None);
    }
    println!(
        "Found {} scenes to download in order:{}",
        links.len(),
        args.order
    );

    let start = std::time::Instant::now();
    let outcomes = download::execute_downloads(client, &links, &target_dir, args.resume)
        .await?;

    println!("Scene downloads complete.");
    Ok(Some(RunSummary::from_outcomes(&outcomes, start.elapsed())))
}
