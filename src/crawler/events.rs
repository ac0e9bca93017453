//! Crawl progress events.

use std::path::PathBuf;

use super::StopReason;

/// Events emitted while a crawl runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// Listing page for the date is loaded
    Navigated { date: String, download_dir: PathBuf },
    /// Paper links currently rendered on the listing
    Scanned { found: usize },
    /// Processing started for a paper
    Started { label: String },
    /// Paper saved to disk
    Downloaded { path: PathBuf, total: usize },
    /// Paper failed this pass and stays eligible for the next
    Skipped { label: String, reason: String },
    /// Scrolled to the bottom; `stalls` is the consecutive no-growth count
    Scrolled { grew: bool, stalls: u32 },
    /// Crawl finished
    Finished { downloaded: usize, stop: StopReason },
}
