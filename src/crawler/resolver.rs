//! Resolving a paper's PDF link from its detail page.
//!
//! Each candidate is opened in its own tab so a broken detail page can't
//! leave the listing tab somewhere unexpected. Whatever happens, the extra
//! tab is closed and the listing tab is focused again before returning.

use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

use super::PaperLink;
use crate::browser::{BrowserDriver, BrowserError};

/// The "View PDF" button on a paper's detail page.
pub const PDF_BUTTON_XPATH: &str = "//a[contains(@class, 'btn') and contains(text(), 'View PDF')]";

/// Why a PDF link could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("timed out waiting for the PDF link")]
    Timeout,

    #[error("no PDF link on the detail page")]
    MissingElement,

    #[error("browser error: {0}")]
    Browser(BrowserError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<BrowserError> for ResolveError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::Timeout(_) => ResolveError::Timeout,
            BrowserError::ElementNotFound(_) => ResolveError::MissingElement,
            other => ResolveError::Browser(other),
        }
    }
}

/// Find the PDF URL behind a paper link.
///
/// Failures are logged here and returned for the caller to skip the paper;
/// they never concern the session as a whole.
pub async fn resolve_pdf_link<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    paper: &PaperLink,
    timeout: Duration,
) -> Result<String, ResolveError> {
    let result = read_pdf_link(driver, &paper.href, timeout).await;
    restore_main_tab(driver).await;

    if let Err(ref e) = result {
        let label = paper.label();
        match e {
            ResolveError::Timeout => warn!("Timeout while processing paper: {}", label),
            ResolveError::MissingElement => {
                warn!("Could not find PDF button for paper: {}", label)
            }
            ResolveError::Browser(err) => error!("Browser error for paper {}: {}", label, err),
            ResolveError::Unexpected(msg) => {
                error!("Unexpected error processing paper {}: {}", label, msg)
            }
        }
    }
    result
}

async fn read_pdf_link<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    href: &str,
    timeout: Duration,
) -> Result<String, ResolveError> {
    driver.open_tab().await?;
    let newest = driver.tab_count().saturating_sub(1);
    driver.switch_tab(newest).await?;
    driver.navigate(href).await?;

    let button = driver.wait_for_clickable(PDF_BUTTON_XPATH, timeout).await?;
    let pdf_url = button
        .href
        .filter(|h| !h.trim().is_empty())
        .ok_or(ResolveError::MissingElement)?;

    if !(pdf_url.starts_with("http://") || pdf_url.starts_with("https://")) {
        return Err(ResolveError::Unexpected(format!(
            "PDF link is not an HTTP URL: {}",
            pdf_url
        )));
    }
    Ok(pdf_url)
}

/// Close every tab but the first and focus the first.
async fn restore_main_tab<D: BrowserDriver + ?Sized>(driver: &mut D) {
    while driver.tab_count() > 1 {
        let last = driver.tab_count() - 1;
        if let Err(e) = driver.switch_tab(last).await {
            error!("Failed to focus tab {} for closing: {}", last, e);
            break;
        }
        if let Err(e) = driver.close_tab().await {
            error!("Failed to close tab {}: {}", last, e);
            break;
        }
    }
    if let Err(e) = driver.switch_tab(0).await {
        error!("Failed to focus the listing tab: {}", e);
    }
}
