use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{self, HeaderMap};
use tokio::io::AsyncWriteExt;

/// Result of a single download task
#[derive(Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    Skipped { path: PathBuf },
}

/// What to do with a task before touching the network for its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Download,
    Skip,
}

/// Task descriptor for one scene: where it comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub target: PathBuf,
}

impl DownloadTask {
    pub fn new(url: &str, target_dir: &Path) -> Result<Self> {
        let filename = target_filename(url);
        if filename.is_empty() {
            return Err(anyhow!("cannot derive a file name from link {url}"));
        }

        Ok(Self {
            url: url.to_string(),
            target: target_dir.join(filename),
        })
    }
}

/// Everything after the last `/` of the link, taken verbatim.
pub fn target_filename(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

fn parse_content_length(headers: &HeaderMap) -> Result<u64> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or_else(|| anyhow!("response has no content-length header"))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| anyhow!("invalid content-length header: {value:?}"))
}

/// Size of the remote file as reported by a HEAD request.
pub async fn remote_content_length(client: &reqwest::Client, url: &str) -> Result<u64> {
    let resp = client
        .head(url)
        .send()
        .await
        .with_context(|| format!("size check failed for {url}"))?
        .error_for_status()?;

    // Read the header directly; the body size hint of a HEAD response is always zero.
    parse_content_length(resp.headers()).with_context(|| format!("size check failed for {url}"))
}

/// Decide whether a task needs downloading.
///
/// Without `resume` every task is downloaded. With it, a local file whose
/// size equals the remote content-length is considered complete; anything
/// else is fetched again from the start.
pub async fn plan_task(
    client: &reqwest::Client,
    task: &DownloadTask,
    resume: bool,
) -> Result<Plan> {
    if !resume {
        return Ok(Plan::Download);
    }

    let local_len = match tokio::fs::metadata(&task.target).await {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Plan::Download),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to stat {}", task.target.display()));
        }
    };

    let remote_len = remote_content_length(client, &task.url).await?;
    tracing::debug!(
        "{}: local {local_len} bytes, remote {remote_len} bytes",
        task.target.display()
    );

    if local_len == remote_len {
        Ok(Plan::Skip)
    } else {
        Ok(Plan::Download)
    }
}

/// Stream the remote file into `target`, truncating whatever was there.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    target: &Path,
    pb: &ProgressBar,
) -> Result<u64> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to request {url}"))?
        .error_for_status()?;

    if let Some(len) = resp.content_length() {
        pb.set_length(len);
    }

    let mut file = tokio::fs::File::create(target)
        .await
        .with_context(|| format!("failed to create {}", target.display()))?;

    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading response body")?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;

    Ok(written)
}

pub fn copy_notice(task: &DownloadTask) -> String {
    format!("Copying {} to {}", task.url, task.target.display())
}

pub fn skip_notice(task: &DownloadTask) -> String {
    format!("Skipping {} already downloaded", task.target.display())
}

/// Download the selected links into `target_dir`, one after another.
///
/// Each link's target is derived at its turn, so the first failure (bad
/// link, size check, or transfer) aborts the run with every earlier file
/// left on disk.
pub async fn execute_downloads(
    client: &reqwest::Client,
    links: &[String],
    target_dir: &Path,
    resume: bool,
) -> Result<Vec<DownloadOutcome>> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}",
    )?
    .progress_chars("=>-");

    let mut outcomes = Vec::with_capacity(links.len());

    for link in links {
        let task = DownloadTask::new(link, target_dir)?;

        match plan_task(client, &task, resume).await? {
            Plan::Skip => {
                println!("{}", skip_notice(&task));
                outcomes.push(DownloadOutcome::Skipped { path: task.target });
            }
            Plan::Download => {
                println!("{}", copy_notice(&task));

                let pb = ProgressBar::new(0);
                pb.set_style(style.clone());
                pb.set_message(target_filename(&task.url).to_string());

                match download_file(client, &task.url, &task.target, &pb).await {
                    Ok(bytes) => {
                        pb.finish_with_message("done");
                        outcomes.push(DownloadOutcome::Downloaded {
                            path: task.target,
                            bytes,
                        });
                    }
                    Err(e) => {
                        pb.abandon_with_message("FAIL");
                        return Err(e);
                    }
                }
            }
        }
    }

    Ok(outcomes)
}
