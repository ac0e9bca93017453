//! Paper discovery and download.
//!
//! The listing page loads papers as it is scrolled, so the crawler keeps
//! re-reading the rendered links, sends unseen ones through the resolver and
//! downloader, and scrolls when a pass yields nothing new. A run ends when
//! the paper limit is hit or several scrolls in a row stop growing the page.

mod downloader;
mod events;
mod navigator;
mod resolver;
mod sanitize;

pub use downloader::{PdfDownloader, DEFAULT_TIMEOUT as DEFAULT_DOWNLOAD_TIMEOUT};
pub use events::CrawlEvent;
pub use navigator::{navigate_to_date, rewrite_date_url};
pub use resolver::{resolve_pdf_link, ResolveError, PDF_BUTTON_XPATH};
pub use sanitize::{safe_filename, MAX_STEM_CHARS};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::browser::{BrowserDriver, BrowserError, BrowserLauncher};

/// Daily papers listing.
pub const LISTING_URL: &str = "https://huggingface.co/papers";

/// Paper links on the listing page.
pub const PAPER_LINK_XPATH: &str =
    "//a[contains(@class, 'cursor-pointer') and contains(@href, '/papers/')]";

/// Default root for per-date download directories.
pub const DEFAULT_DOWNLOAD_ROOT: &str = "downloaded_papers";

/// Errors that end a crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crawl tuning. Defaults match the listing site's behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Listing page opened before the date is applied.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Directory holding one subdirectory per date.
    #[serde(default = "default_download_root")]
    pub download_root: PathBuf,
    /// Seconds to wait for a detail page's PDF button.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,
    /// Seconds to let new content load after scrolling.
    #[serde(default = "default_scroll_pause")]
    pub scroll_pause_secs: u64,
    /// Consecutive scrolls without page growth tolerated before stopping.
    #[serde(default = "default_max_stall_retries")]
    pub max_stall_retries: u32,
}

fn default_listing_url() -> String {
    LISTING_URL.to_string()
}

fn default_download_root() -> PathBuf {
    PathBuf::from(DEFAULT_DOWNLOAD_ROOT)
}

fn default_resolve_timeout() -> u64 {
    20
}

fn default_scroll_pause() -> u64 {
    5
}

fn default_max_stall_retries() -> u32 {
    3
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            download_root: default_download_root(),
            resolve_timeout_secs: default_resolve_timeout(),
            scroll_pause_secs: default_scroll_pause(),
            max_stall_retries: default_max_stall_retries(),
        }
    }
}

impl CrawlConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_secs(self.scroll_pause_secs)
    }

    /// Directory for one date's papers.
    pub fn download_dir(&self, date: &str) -> PathBuf {
        self.download_root.join(date)
    }
}

/// What to crawl.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// `YYYY-MM-DD`; today (local time) when unset.
    pub date: Option<String>,
    /// Stop after this many downloads.
    pub limit: Option<usize>,
    pub headless: bool,
}

impl Default for CrawlRequest {
    fn default() -> Self {
        Self {
            date: None,
            limit: None,
            headless: true,
        }
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    Exhausted,
}

/// Result of a finished crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub download_dir: PathBuf,
    pub downloaded: usize,
    pub stop: StopReason,
}

/// A paper link read from the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperLink {
    pub href: String,
    pub title: String,
}

impl PaperLink {
    /// Title if there is one, else the link.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.href
        } else {
            &self.title
        }
    }
}

/// Mutable state of one crawl.
struct CrawlSession {
    download_dir: PathBuf,
    processed: HashSet<String>,
    downloaded: usize,
    stall_retries: u32,
}

impl CrawlSession {
    fn new(download_dir: PathBuf) -> Self {
        Self {
            download_dir,
            processed: HashSet::new(),
            downloaded: 0,
            stall_retries: 0,
        }
    }

    fn limit_reached(&self, limit: Option<usize>) -> bool {
        limit.is_some_and(|max| self.downloaded >= max)
    }

    fn record_success(&mut self, href: String) {
        self.processed.insert(href);
        self.downloaded += 1;
        self.stall_retries = 0;
    }

    fn report(&self, stop: StopReason) -> CrawlReport {
        CrawlReport {
            download_dir: self.download_dir.clone(),
            downloaded: self.downloaded,
            stop,
        }
    }
}

/// Drives browser sessions over the listing page.
pub struct Crawler<L> {
    launcher: L,
    downloader: PdfDownloader,
    config: CrawlConfig,
    events: Option<mpsc::Sender<CrawlEvent>>,
}

impl<L: BrowserLauncher> Crawler<L> {
    pub fn new(launcher: L, downloader: PdfDownloader, config: CrawlConfig) -> Self {
        Self {
            launcher,
            downloader,
            config,
            events: None,
        }
    }

    /// Report progress on `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<CrawlEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Download the papers listed for a date.
    ///
    /// The browser is launched here and released before returning, whether
    /// the crawl succeeded or not.
    pub async fn run(&self, request: CrawlRequest) -> Result<CrawlReport, CrawlError> {
        let date = resolve_date(request.date.as_deref())?;

        let mut driver = self.launcher.launch(request.headless).await?;
        let outcome = self.crawl(&mut driver, &date, request.limit).await;

        match driver.release().await {
            Ok(()) => info!("Browser closed"),
            Err(e) => warn!("Failed to close browser cleanly: {}", e),
        }

        match outcome {
            Ok(report) => {
                info!(
                    "Download complete. Total papers downloaded: {}",
                    report.downloaded
                );
                self.emit(CrawlEvent::Finished {
                    downloaded: report.downloaded,
                    stop: report.stop,
                })
                .await;
                Ok(report)
            }
            Err(e) => {
                error!("Crawl aborted: {}", e);
                Err(e)
            }
        }
    }

    async fn crawl(
        &self,
        driver: &mut L::Driver,
        date: &str,
        limit: Option<usize>,
    ) -> Result<CrawlReport, CrawlError> {
        driver.navigate(&self.config.listing_url).await?;
        info!("Navigated to {}", self.config.listing_url);
        navigate_to_date(driver, date).await?;

        let download_dir = self.config.download_dir(date);
        tokio::fs::create_dir_all(&download_dir).await?;
        info!("Downloading papers to: {}", download_dir.display());
        self.emit(CrawlEvent::Navigated {
            date: date.to_string(),
            download_dir: download_dir.clone(),
        })
        .await;

        let mut session = CrawlSession::new(download_dir);

        loop {
            let papers = scan_papers(driver).await?;
            self.emit(CrawlEvent::Scanned {
                found: papers.len(),
            })
            .await;

            let mut progressed = false;
            for paper in papers {
                if session.limit_reached(limit) {
                    info!(
                        "Reached the specified limit of {} papers. Stopping download.",
                        session.downloaded
                    );
                    return Ok(session.report(StopReason::LimitReached));
                }
                if session.processed.contains(&paper.href) {
                    continue;
                }
                if let Some(path) = self.process(driver, &paper, &session.download_dir).await {
                    session.record_success(paper.href);
                    progressed = true;
                    info!("Total papers processed: {}", session.downloaded);
                    self.emit(CrawlEvent::Downloaded {
                        path,
                        total: session.downloaded,
                    })
                    .await;
                }
            }

            if progressed {
                session.stall_retries = 0;
            } else {
                info!("No new papers found. Attempting to scroll...");
                let grew = scroll_for_more(driver, self.config.scroll_pause()).await?;
                if grew {
                    session.stall_retries = 0;
                } else {
                    session.stall_retries += 1;
                }
                self.emit(CrawlEvent::Scrolled {
                    grew,
                    stalls: session.stall_retries,
                })
                .await;

                if session.stall_retries > self.config.max_stall_retries {
                    info!("Reached the end of the page. Exiting.");
                    return Ok(session.report(StopReason::Exhausted));
                }
                if !grew {
                    info!(
                        "No new content loaded. Retry {}/{}",
                        session.stall_retries, self.config.max_stall_retries
                    );
                }
            }

            info!("Processed {} papers so far.", session.processed.len());
        }
    }

    /// Resolve and download one paper, returning where it was saved.
    async fn process(
        &self,
        driver: &mut L::Driver,
        paper: &PaperLink,
        download_dir: &Path,
    ) -> Option<PathBuf> {
        let label = paper.label().to_string();
        info!("Processing: {}", label);
        self.emit(CrawlEvent::Started {
            label: label.clone(),
        })
        .await;

        let reason = match resolve_pdf_link(driver, paper, self.config.resolve_timeout()).await {
            Ok(pdf_url) => {
                let dest = download_dir.join(safe_filename(&paper.title, &paper.href));
                if self.downloader.download(&pdf_url, &dest).await {
                    return Some(dest);
                }
                "download failed".to_string()
            }
            Err(e) => e.to_string(),
        };

        self.emit(CrawlEvent::Skipped { label, reason }).await;
        None
    }

    async fn emit(&self, event: CrawlEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event).await;
        }
    }
}

/// Read the paper links currently rendered on the listing.
async fn scan_papers<D: BrowserDriver + ?Sized>(
    driver: &mut D,
) -> Result<Vec<PaperLink>, BrowserError> {
    let anchors = driver.find_anchors(PAPER_LINK_XPATH).await?;
    Ok(anchors
        .into_iter()
        .filter_map(|a| {
            a.href.map(|href| PaperLink {
                href,
                title: a.text.trim().to_string(),
            })
        })
        .collect())
}

/// Scroll to the bottom, wait, and report whether the page grew.
async fn scroll_for_more<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    pause: Duration,
) -> Result<bool, BrowserError> {
    let last_height = driver.scroll_height().await?;
    driver.scroll_to_bottom().await?;
    tokio::time::sleep(pause).await;
    let new_height = driver.scroll_height().await?;
    Ok(new_height != last_height)
}

/// Validate a requested date, defaulting to today.
pub fn resolve_date(date: Option<&str>) -> Result<String, CrawlError> {
    match date {
        None => Ok(chrono::Local::now().format("%Y-%m-%d").to_string()),
        Some(d) => {
            let well_formed = d.len() == 10 && NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok();
            if well_formed {
                Ok(d.to_string())
            } else {
                Err(CrawlError::InvalidDate(d.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_date() {
        assert_eq!(resolve_date(Some("2024-03-01")).unwrap(), "2024-03-01");
        assert!(matches!(
            resolve_date(Some("2024-3-1")),
            Err(CrawlError::InvalidDate(_))
        ));
        assert!(matches!(
            resolve_date(Some("2024-02-30")),
            Err(CrawlError::InvalidDate(_))
        ));
        let today = resolve_date(None).unwrap();
        assert!(NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn test_download_dir_depends_only_on_date() {
        let config = CrawlConfig::default();
        assert_eq!(
            config.download_dir("2024-03-01"),
            PathBuf::from("downloaded_papers/2024-03-01")
        );
        assert_eq!(config.download_dir("2024-03-01"), config.download_dir("2024-03-01"));
    }

    #[test]
    fn test_session_limit() {
        let mut session = CrawlSession::new(PathBuf::from("d"));
        assert!(!session.limit_reached(None));
        assert!(session.limit_reached(Some(0)));
        session.stall_retries = 2;
        session.record_success("a".into());
        assert_eq!(session.stall_retries, 0);
        assert!(session.limit_reached(Some(1)));
        assert!(!session.limit_reached(Some(2)));
    }

    #[test]
    fn test_paper_label() {
        let untitled = PaperLink {
            href: "https://huggingface.co/papers/1".into(),
            title: String::new(),
        };
        assert_eq!(untitled.label(), "https://huggingface.co/papers/1");
    }

    #[test]
    fn test_config_defaults() {
        let config: CrawlConfig = toml::from_str("").unwrap();
        assert_eq!(config, CrawlConfig::default());
        assert_eq!(config.resolve_timeout(), Duration::from_secs(20));
        assert_eq!(config.scroll_pause(), Duration::from_secs(5));
        assert_eq!(config.max_stall_retries, 3);
    }
}
