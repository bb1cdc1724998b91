// capture/error.rs - Capture Pipeline Errors
//
// Display text is what ends up in the log pane after "Error: ".

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::app::CropMargins;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("page did not finish loading within {0:?}")]
    PageLoadTimeout(Duration),

    #[error("element query `{selector}` failed: {reason}")]
    Selector { selector: String, reason: String },

    #[error("screenshot of element {index} failed: {reason}")]
    Screenshot { index: usize, reason: String },

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "crop margins (left {}, right {}, top {}, bottom {}) leave nothing of a {width}x{height} image",
        .margins.left, .margins.right, .margins.top, .margins.bottom
    )]
    InvalidCrop {
        width: u32,
        height: u32,
        margins: CropMargins,
    },

    #[error("browser did not shut down cleanly: {0}")]
    Close(String),
}

impl CaptureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CaptureError::Io {
            path: path.into(),
            source,
        }
    }
}
