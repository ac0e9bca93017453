//! Chrome session over CDP.
//!
//! Uses chromiumoxide to launch (or attach to) Chrome and drives it tab by
//! tab. A "tab" is a chromiumoxide [`Page`]; the focused tab is tracked
//! here because CDP has no notion of a current window.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::js::EvaluationResult;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::scripts;
use super::{Anchor, BrowserDriver, BrowserEngineConfig, BrowserError, BrowserLauncher};

/// Delay between polls while waiting for an element.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        BrowserError::Protocol(e.to_string())
    }
}

/// Launches Chrome sessions.
pub struct ChromeLauncher {
    config: BrowserEngineConfig,
}

impl ChromeLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }

    /// Find Chrome executable.
    fn find_chrome(&self) -> Result<PathBuf, BrowserError> {
        if let Some(ref path) = self.config.executable {
            return Ok(path.clone());
        }

        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        // Check if in PATH via `which`
        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(BrowserError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or set CHROME_PATH"
                .to_string(),
        ))
    }

    async fn launch_local(&self, headless: bool) -> Result<(Browser, Handler), BrowserError> {
        info!("Launching browser (headless={})", headless);

        let chrome_path = self.find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("Failed to build browser config: {}", e)))?;

        Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<(Browser, Handler), BrowserError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("Failed to reach remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| BrowserError::Launch(format!("Bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Launch("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Driver = ChromeSession;

    async fn launch(&self, headless: bool) -> Result<ChromeSession, BrowserError> {
        let remote = self.config.remote_url.clone();
        let (browser, mut handler) = match remote {
            Some(ref url) => self.connect_remote(url).await?,
            None => self.launch_local(headless).await?,
        };

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let first = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(format!("Failed to open first tab: {}", e)));
            }
        };

        Ok(ChromeSession {
            browser,
            handler_task,
            tabs: vec![first],
            active: 0,
            remote: remote.is_some(),
            released: false,
        })
    }
}

/// One running browser and the tabs this crate opened in it.
pub struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    tabs: Vec<Page>,
    active: usize,
    remote: bool,
    released: bool,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, BrowserError> {
        self.tabs
            .get(self.active)
            .ok_or(BrowserError::NoSuchTab(self.active))
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, BrowserError> {
        let result = self.page()?.evaluate(script).await?;
        decode(result)
    }
}

/// Close the focused tab and forget it only once the close went through,
/// so the tab list never drifts from what the browser has open.
async fn close_focused<P, F, Fut>(
    tabs: &mut Vec<P>,
    active: &mut usize,
    close: F,
) -> Result<(), BrowserError>
where
    P: Clone,
    F: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<(), BrowserError>>,
{
    if tabs.len() <= 1 {
        return Err(BrowserError::Protocol(
            "refusing to close the last tab".to_string(),
        ));
    }
    let page = tabs
        .get(*active)
        .cloned()
        .ok_or(BrowserError::NoSuchTab(*active))?;
    close(page).await?;
    tabs.remove(*active);
    *active = 0;
    Ok(())
}

/// Decode an evaluation result, treating a missing value as JSON null.
fn decode<T: DeserializeOwned>(result: EvaluationResult) -> Result<T, BrowserError> {
    let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
        .map_err(|e| BrowserError::Protocol(format!("Unexpected script result: {}", e)))
}

#[async_trait]
impl BrowserDriver for ChromeSession {
    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.page()?.url().await?.unwrap_or_default())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        debug!("Navigating tab {} to {}", self.active, url);
        self.page()?.goto(url).await?;
        Ok(())
    }

    async fn find_anchors(&mut self, xpath: &str) -> Result<Vec<Anchor>, BrowserError> {
        self.eval(scripts::find_anchors(xpath)).await
    }

    async fn wait_for_clickable(
        &mut self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<Anchor, BrowserError> {
        let script = scripts::first_clickable(xpath);
        let deadline = tokio::time::Instant::now() + timeout;
        let mut last_error = None;
        let mut evaluated = false;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.eval::<Option<Anchor>>(script.clone()))
                .await
            {
                Ok(Ok(Some(anchor))) => return Ok(anchor),
                Ok(Ok(None)) => evaluated = true,
                // The document may be mid-navigation; keep polling.
                Ok(Err(e)) => last_error = Some(e),
                Err(_) => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return match last_error {
                    Some(e) if !evaluated => Err(e),
                    _ => Err(BrowserError::Timeout(timeout)),
                };
            }
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    async fn open_tab(&mut self) -> Result<(), BrowserError> {
        let page = self.browser.new_page("about:blank").await?;
        self.tabs.push(page);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), BrowserError> {
        close_focused(&mut self.tabs, &mut self.active, |page: Page| async move {
            page.close().await.map_err(BrowserError::from)
        })
        .await
    }

    async fn switch_tab(&mut self, index: usize) -> Result<(), BrowserError> {
        let page = self.tabs.get(index).ok_or(BrowserError::NoSuchTab(index))?;
        page.bring_to_front().await?;
        self.active = index;
        Ok(())
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    async fn scroll_height(&mut self) -> Result<u64, BrowserError> {
        let height: f64 = self.eval(scripts::SCROLL_HEIGHT.to_string()).await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.page()?
            .evaluate(scripts::SCROLL_TO_BOTTOM.to_string())
            .await?;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let tabs = std::mem::take(&mut self.tabs);
        let result = if self.remote {
            // Leave a shared browser running; only close our own tabs.
            for page in tabs {
                if let Err(e) = page.close().await {
                    warn!("Failed to close tab: {}", e);
                }
            }
            Ok(())
        } else {
            drop(tabs);
            let closed = self.browser.close().await.map(|_| ());
            if let Err(e) = self.browser.wait().await {
                warn!("Failed waiting for browser exit: {}", e);
            }
            closed.map_err(BrowserError::from)
        };

        self.handler_task.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_focused_forgets_closed_tab() {
        let mut tabs = vec!["listing", "detail"];
        let mut active = 1;
        close_focused(&mut tabs, &mut active, |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(tabs, vec!["listing"]);
        assert_eq!(active, 0);
    }

    #[tokio::test]
    async fn test_close_focused_keeps_tab_when_close_fails() {
        let mut tabs = vec!["listing", "detail"];
        let mut active = 1;
        let err = close_focused(&mut tabs, &mut active, |_| async {
            Err(BrowserError::Protocol("target crashed".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, BrowserError::Protocol(_)));
        assert_eq!(tabs, vec!["listing", "detail"]);
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_close_focused_refuses_last_tab() {
        let mut tabs = vec!["listing"];
        let mut active = 0;
        let result = close_focused(&mut tabs, &mut active, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(BrowserError::Protocol(_))));
        assert_eq!(tabs.len(), 1);
    }
}
