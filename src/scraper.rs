use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONNECTION, REFERER};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::api;
use crate::storage::{self, PageRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// All knobs for one run. Delays are explicit fields rather than module
/// globals so tests can zero them.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub max_retries: u32,
    /// Courtesy pause before each page ID.
    pub page_delay: Duration,
    /// Constant pause between retry attempts for one ID.
    pub retry_delay: Duration,
    pub output_folder: PathBuf,
}

impl ScrapeConfig {
    pub fn for_language(lang: &str) -> Self {
        Self {
            base_url: format!("https://{lang}.vikidia.org"),
            max_retries: 5,
            page_delay: Duration::from_secs(1),
            retry_delay: Duration::from_secs(2),
            output_folder: PathBuf::from("pages"),
        }
    }
}

/// Run summary printed after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub scraped: usize,
    pub missing: usize,
    pub skipped: usize,
    pub saved: usize,
}

/// Build the shared HTTP client: per-request timeout plus browser-like
/// headers, with the User-Agent picked once per process.
pub fn build_client() -> Result<Client> {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Walk `[start, end)` sequentially, collecting one record per resolved ID.
///
/// Per-page failures never abort the run: an ID whose metadata fetch
/// exhausts its retries, or whose response body does not parse, is logged,
/// counted in `skipped` and left out of the result (no row in the export).
pub async fn run(
    client: &Client,
    config: &ScrapeConfig,
    start: u64,
    end: u64,
) -> Result<(Vec<PageRecord>, ScrapeStats)> {
    let total = end.saturating_sub(start) as usize;
    let mut records = Vec::new();
    let mut stats = ScrapeStats { total, scraped: 0, missing: 0, skipped: 0, saved: 0 };

    std::fs::create_dir_all(&config.output_folder).with_context(|| {
        format!("Failed to create output folder {}", config.output_folder.display())
    })?;

    info!(
        "Starting scraping from page {} to {}, max retries: {}",
        start, end, config.max_retries
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for page_id in start..end {
        tokio::time::sleep(config.page_delay).await;

        let Some(body) = fetch_metadata(client, config, page_id).await else {
            stats.skipped += 1;
            pb.inc(1);
            continue;
        };

        match api::parse_page_entry(&body, page_id) {
            Ok(Some(entry)) if entry.is_missing() => {
                info!("Page ID {page_id} is missing, skipping");
                records.push(PageRecord {
                    page_id,
                    title: String::new(),
                    revisions_count: 0,
                });
                stats.missing += 1;
            }
            Ok(Some(entry)) => {
                let title = api::sanitize_title(entry.title.as_deref().unwrap_or(""));
                info!("Scraped page ID {page_id}: {title}");
                records.push(PageRecord {
                    page_id,
                    title: title.clone(),
                    revisions_count: entry.revisions.len(),
                });
                stats.scraped += 1;
                if fetch_and_save_content(client, config, &title, page_id).await {
                    stats.saved += 1;
                }
            }
            Ok(None) => {
                warn!("Page ID {page_id} not present in API response, skipping");
                stats.skipped += 1;
            }
            Err(e) => {
                warn!("Malformed response body for page ID {page_id}, skipping: {e}");
                stats.skipped += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraping completed. Total pages collected: {}", records.len());

    Ok((records, stats))
}

/// One metadata call inside a bounded retry loop with constant backoff.
/// Returns `None` once the retry budget is spent and the ID is abandoned.
async fn fetch_metadata(client: &Client, config: &ScrapeConfig, page_id: u64) -> Option<String> {
    let url = api::metadata_url(&config.base_url, page_id);
    let mut retries = 0;

    while retries < config.max_retries {
        match request_text(client, &url).await {
            Ok(body) => return Some(body),
            Err(e) => {
                retries += 1;
                error!(
                    "Error fetching page {page_id} (attempt {retries}/{}): {e}",
                    config.max_retries
                );
                if retries < config.max_retries {
                    tokio::time::sleep(config.retry_delay).await;
                } else {
                    error!(
                        "Skipping page ID {page_id} after {} failed attempts",
                        config.max_retries
                    );
                }
            }
        }
    }
    None
}

async fn request_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Fetch the raw wikitext by (sanitized) title and write it under its shard.
/// Single attempt: a failure here leaves the metadata record in place with
/// no saved file. Returns whether a file was written.
async fn fetch_and_save_content(
    client: &Client,
    config: &ScrapeConfig,
    title: &str,
    page_id: u64,
) -> bool {
    let response = client
        .get(api::raw_url(&config.base_url))
        .query(&[("title", title), ("action", "raw")])
        .send()
        .await
        .and_then(|r| r.error_for_status());

    let content = match response {
        Ok(r) => match r.text().await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read raw content for {title}: {e}");
                return false;
            }
        },
        Err(e) => {
            error!("Failed to fetch raw content for {title}: {e}");
            return false;
        }
    };

    match storage::save_page_content(&config.output_folder, page_id, &content) {
        Ok(path) => {
            info!("Saved raw content for page ID {page_id} in {}", path.display());
            true
        }
        Err(e) => {
            error!("Failed to save content for page ID {page_id}: {e}");
            false
        }
    }
}
