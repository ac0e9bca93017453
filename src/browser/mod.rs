//! Browser session management.
//!
//! The crawler only talks to a browser through [`BrowserDriver`], a small
//! capability interface over one browser session and its tabs. The real
//! implementation drives Chrome over CDP with chromiumoxide; tests script a
//! fake driver instead.

mod config;
#[cfg(feature = "browser")]
mod chrome;
mod scripts;

pub use config::BrowserEngineConfig;

#[cfg(feature = "browser")]
pub use chrome::{ChromeLauncher, ChromeSession};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("No tab at index {0}")]
    NoSuchTab(usize),

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unavailable,
}

/// An anchor element read from the rendered DOM.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Anchor {
    /// Absolute `href`, if the anchor carries one.
    pub href: Option<String>,
    /// Visible text, trimmed.
    #[serde(default)]
    pub text: String,
}

/// Capabilities the crawler needs from one browser session.
///
/// A session always has at least one tab. Tab indices follow creation
/// order, so index 0 is the tab the session started with.
#[async_trait]
pub trait BrowserDriver: Send {
    /// URL of the focused tab.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Navigate the focused tab and wait for the load event.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// All anchors in the focused tab matching an XPath expression, in
    /// document order.
    async fn find_anchors(&mut self, xpath: &str) -> Result<Vec<Anchor>, BrowserError>;

    /// Wait until an anchor matching `xpath` is clickable and return it.
    ///
    /// Returns [`BrowserError::Timeout`] if none becomes clickable in time.
    async fn wait_for_clickable(
        &mut self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<Anchor, BrowserError>;

    /// Open a blank tab. Focus stays where it was.
    async fn open_tab(&mut self) -> Result<(), BrowserError>;

    /// Close the focused tab. Focus moves to the first tab.
    async fn close_tab(&mut self) -> Result<(), BrowserError>;

    /// Focus the tab at `index`.
    async fn switch_tab(&mut self, index: usize) -> Result<(), BrowserError>;

    /// Number of open tabs.
    fn tab_count(&self) -> usize;

    /// `document.body.scrollHeight` of the focused tab.
    async fn scroll_height(&mut self) -> Result<u64, BrowserError>;

    /// Scroll the focused tab to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    /// Shut the browser down. Called once per launched session.
    async fn release(&mut self) -> Result<(), BrowserError>;
}

/// Starts browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Driver: BrowserDriver;

    /// Start a session. Failure here is fatal to the crawl.
    async fn launch(&self, headless: bool) -> Result<Self::Driver, BrowserError>;
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeLauncher {
    config: BrowserEngineConfig,
}

#[cfg(not(feature = "browser"))]
impl ChromeLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

#[cfg(not(feature = "browser"))]
pub enum NoBrowser {}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserDriver for NoBrowser {
    async fn current_url(&mut self) -> Result<String, BrowserError> {
        match *self {}
    }
    async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        match *self {}
    }
    async fn find_anchors(&mut self, _xpath: &str) -> Result<Vec<Anchor>, BrowserError> {
        match *self {}
    }
    async fn wait_for_clickable(
        &mut self,
        _xpath: &str,
        _timeout: Duration,
    ) -> Result<Anchor, BrowserError> {
        match *self {}
    }
    async fn open_tab(&mut self) -> Result<(), BrowserError> {
        match *self {}
    }
    async fn close_tab(&mut self) -> Result<(), BrowserError> {
        match *self {}
    }
    async fn switch_tab(&mut self, _index: usize) -> Result<(), BrowserError> {
        match *self {}
    }
    fn tab_count(&self) -> usize {
        match *self {}
    }
    async fn scroll_height(&mut self) -> Result<u64, BrowserError> {
        match *self {}
    }
    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        match *self {}
    }
    async fn release(&mut self) -> Result<(), BrowserError> {
        match *self {}
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Driver = NoBrowser;

    async fn launch(&self, _headless: bool) -> Result<NoBrowser, BrowserError> {
        let _ = &self.config;
        Err(BrowserError::Unavailable)
    }
}
