//! Selecting the listing page for a date.

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::browser::{BrowserDriver, BrowserError};

fn date_param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"date=\d{4}-\d{2}-\d{2}").expect("valid regex"))
}

/// Point `current_url` at `date`.
///
/// An existing `date=YYYY-MM-DD` value is replaced in place; otherwise the
/// parameter is appended with `&` or `?` depending on whether the URL
/// already has a query string.
pub fn rewrite_date_url(current_url: &str, date: &str) -> String {
    let date_param = format!("date={}", date);
    if current_url.contains("date=") {
        date_param_regex()
            .replace_all(current_url, date_param.as_str())
            .into_owned()
    } else {
        let sep = if current_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", current_url, sep, date_param)
    }
}

/// Navigate the focused tab to the listing for `date`.
///
/// Not retried: a failure here ends the crawl.
pub async fn navigate_to_date<D: BrowserDriver + ?Sized>(
    driver: &mut D,
    date: &str,
) -> Result<(), BrowserError> {
    let current = driver.current_url().await?;
    let target = rewrite_date_url(&current, date);
    driver.navigate(&target).await?;
    info!("Navigated to papers for date: {}", date);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_existing_date() {
        assert_eq!(
            rewrite_date_url("https://huggingface.co/papers?date=2024-01-01&x=1", "2024-02-02"),
            "https://huggingface.co/papers?date=2024-02-02&x=1"
        );
    }

    #[test]
    fn test_appends_to_bare_url() {
        assert_eq!(
            rewrite_date_url("https://huggingface.co/papers", "2024-03-01"),
            "https://huggingface.co/papers?date=2024-03-01"
        );
    }

    #[test]
    fn test_appends_to_existing_query() {
        assert_eq!(
            rewrite_date_url("https://huggingface.co/papers?sort=trending", "2024-03-01"),
            "https://huggingface.co/papers?sort=trending&date=2024-03-01"
        );
    }

    #[test]
    fn test_malformed_date_value_left_alone() {
        assert_eq!(
            rewrite_date_url("https://huggingface.co/papers?date=today", "2024-03-01"),
            "https://huggingface.co/papers?date=today"
        );
    }
}
