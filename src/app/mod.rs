// app/mod.rs - Application State and Form Logic
//
// Platform-independent state owned by the UI thread: the form fields,
// the log pane contents, and form submission.

mod controller;
mod log_sink;
mod state;

pub use controller::{submit, SubmitError};
pub use log_sink::LogSink;
pub use state::*;
