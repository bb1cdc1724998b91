// capture/mod.rs - Element Screenshot Capture
//
// Drives a headless browser to screenshot every element of a class on a
// page, then crops and saves the results.

mod browser;
mod chrome;
pub mod crop;
mod error;
mod pipeline;

pub use browser::{BrowserLauncher, BrowserOptions, BrowserSession};
pub use chrome::ChromeLauncher;
pub use error::CaptureError;
pub use pipeline::{run, CaptureEvent, CaptureReport, PipelineOptions};
