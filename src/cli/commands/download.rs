//! Download command.

use console::style;
use tokio::sync::mpsc;

use paperdigest::browser::ChromeLauncher;
use paperdigest::config::Settings;
use paperdigest::crawler::{CrawlEvent, CrawlRequest, Crawler, PdfDownloader, StopReason};

use crate::cli::helpers::{spinner, truncate};

/// Crawl the listing for a date and download its papers.
pub async fn cmd_download(
    settings: &Settings,
    date: Option<String>,
    number: usize,
    no_headless: bool,
) -> anyhow::Result<()> {
    let launcher = ChromeLauncher::new(settings.browser.clone());
    let downloader = PdfDownloader::new(settings.download_timeout())?;

    let (event_tx, mut event_rx) = mpsc::channel::<CrawlEvent>(100);
    let crawler = Crawler::new(launcher, downloader, settings.crawl.clone()).with_events(event_tx);

    let pb = spinner(format!("Opening {}...", crawler.config().listing_url));

    // Spawn event handler task (UI layer)
    let pb_events = pb.clone();
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                CrawlEvent::Navigated { date, .. } => {
                    pb_events.set_message(format!("Scanning papers for {}...", date));
                }
                CrawlEvent::Started { label } => {
                    pb_events.set_message(format!("Resolving {}", truncate(&label, 60)));
                }
                CrawlEvent::Downloaded { path, total } => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    pb_events.println(format!("{} [{}] {}", style("✓").green(), total, name));
                }
                CrawlEvent::Skipped { label, reason } => {
                    pb_events.println(format!(
                        "{} {} ({})",
                        style("!").yellow(),
                        truncate(&label, 60),
                        reason
                    ));
                }
                CrawlEvent::Scrolled { grew: false, stalls } => {
                    pb_events.set_message(format!("Waiting for more papers (attempt {})", stalls));
                }
                CrawlEvent::Scrolled { grew: true, .. } => {
                    pb_events.set_message("Loading more papers...");
                }
                CrawlEvent::Scanned { .. } | CrawlEvent::Finished { .. } => {}
            }
        }
    });

    let request = CrawlRequest {
        date,
        limit: if number > 0 { Some(number) } else { None },
        headless: settings.browser.headless && !no_headless,
    };
    let result = crawler.run(request).await;

    // Dropping the crawler closes the channel so the handler can finish
    drop(crawler);
    let _ = event_handler.await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            println!("{} Crawl failed: {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    let reason = match report.stop {
        StopReason::LimitReached => "limit reached",
        StopReason::Exhausted => "no more papers",
    };
    println!(
        "{} Downloaded {} papers ({})",
        style("✓").green(),
        report.downloaded,
        reason
    );
    println!(
        "  {} Saved to {}",
        style("→").dim(),
        report.download_dir.display()
    );

    Ok(())
}
