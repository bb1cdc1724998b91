// capture/chrome.rs - Chromium Driver
//
// Drives a local Chromium/Chrome over the DevTools Protocol via chromiumoxide.
// The CDP handler runs as its own tokio task for the lifetime of the session.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use log::{debug, info};
use tokio::task::JoinHandle;

use super::browser::{BrowserLauncher, BrowserOptions, BrowserSession};
use super::CaptureError;

/// Launches a fresh Chromium process per capture run
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    options: BrowserOptions,
}

impl ChromeLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn config(&self) -> anyhow::Result<BrowserConfig> {
        let (width, height) = self.options.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .args(self.options.args.iter().map(String::as_str));

        builder = if self.options.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(ref path) = self.options.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| anyhow!(e))
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, CaptureError> {
        let session = ChromeSession::start(self)
            .await
            .map_err(|e| CaptureError::Launch(format!("{e:#}")))?;
        Ok(Box::new(session))
    }
}

struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    elements: Vec<Element>,
}

impl ChromeSession {
    async fn start(launcher: &ChromeLauncher) -> anyhow::Result<Self> {
        let config = launcher.config().context("invalid browser configuration")?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to start Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        info!("Chromium started (headless: {})", launcher.options.headless);
        Ok(Self {
            browser,
            handler,
            page: None,
            elements: Vec::new(),
        })
    }

    fn page(&self) -> Result<&Page, CaptureError> {
        self.page.as_ref().ok_or_else(|| CaptureError::Navigation {
            url: String::new(),
            reason: "no page is open".into(),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<(), CaptureError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| CaptureError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.elements.clear();
        self.page = Some(page);
        Ok(())
    }

    async fn ready_state(&mut self) -> Result<String, CaptureError> {
        let nav_err = |reason: String| CaptureError::Navigation {
            url: String::new(),
            reason,
        };
        self.page()?
            .evaluate("document.readyState")
            .await
            .map_err(|e| nav_err(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| nav_err(e.to_string()))
    }

    async fn find_elements(&mut self, selector: &str) -> Result<usize, CaptureError> {
        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .map_err(|e| CaptureError::Selector {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;
        self.elements = elements;
        Ok(self.elements.len())
    }

    async fn screenshot_element(&mut self, index: usize) -> Result<Vec<u8>, CaptureError> {
        let element = self.elements.get(index).ok_or_else(|| CaptureError::Screenshot {
            index,
            reason: format!("only {} elements were found", self.elements.len()),
        })?;
        element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| CaptureError::Screenshot {
                index,
                reason: e.to_string(),
            })
    }

    async fn close(mut self: Box<Self>) -> Result<(), CaptureError> {
        self.elements.clear();
        self.page = None;

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for Chromium to exit: {}", e);
        }
        closed
            .map(|_| ())
            .map_err(|e| CaptureError::Close(e.to_string()))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
