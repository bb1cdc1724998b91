//! IMGCatcher - Element Screenshot Library
//!
//! Core of the screenshot tool: form state and validation, settings
//! persistence, and the headless-browser capture pipeline.

pub mod app;
pub mod capture;
pub mod constants;
pub mod settings;

// Re-export commonly used types
pub use app::{AppState, CaptureRequest, CropMargins, FormFields};
pub use capture::{CaptureError, CaptureEvent, CaptureReport, ChromeLauncher, PipelineOptions};
pub use settings::SettingsStore;
