// capture/browser.rs - Browser Automation Seam
//
// The pipeline drives a browser only through these traits. Production uses
// the Chromium driver in `chrome.rs`; tests script a fake session.

use std::path::PathBuf;

use async_trait::async_trait;

use super::CaptureError;
use crate::constants::browser::{QUIET_ARGS, WINDOW_HEIGHT, WINDOW_WIDTH};

/// How the browser process is started
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Explicit browser binary; when `None` the driver searches the usual locations
    pub executable: Option<PathBuf>,
    pub window_size: (u32, u32),
    /// Extra command-line switches passed to the browser
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            window_size: (WINDOW_WIDTH, WINDOW_HEIGHT),
            args: QUIET_ARGS.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, CaptureError>;
}

/// One running browser with at most one open page
///
/// Elements found by [`find_elements`](BrowserSession::find_elements) are kept
/// by the session and addressed by their position in document order.
#[async_trait]
pub trait BrowserSession: Send {
    /// Open `url` in a fresh page
    async fn goto(&mut self, url: &str) -> Result<(), CaptureError>;

    /// Current `document.readyState` of the open page
    async fn ready_state(&mut self) -> Result<String, CaptureError>;

    /// Run a CSS query and return how many elements matched
    async fn find_elements(&mut self, selector: &str) -> Result<usize, CaptureError>;

    /// PNG bytes of the `index`-th matched element
    async fn screenshot_element(&mut self, index: usize) -> Result<Vec<u8>, CaptureError>;

    /// Shut the browser down
    async fn close(self: Box<Self>) -> Result<(), CaptureError>;
}
