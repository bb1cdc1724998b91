// app/controller.rs - Form Submission
//
// Validates the form, persists it, and prepares the state for a capture run.
// Dispatching the pipeline itself is left to the UI runtime.

use log::{info, warn};
use thiserror::Error;

use super::state::{AppState, CaptureRequest, InputError};
use crate::constants::dialog;
use crate::settings::{SettingsError, SettingsStore};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("a capture is already running")]
    Busy,
}

impl SubmitError {
    /// Title of the blocking dialog shown for this error
    pub fn dialog_title(&self) -> &'static str {
        match self {
            SubmitError::Input(_) => dialog::INPUT_ERROR_TITLE,
            SubmitError::Settings(_) | SubmitError::Busy => dialog::ERROR_TITLE,
        }
    }

    pub fn dialog_text(&self) -> String {
        match self {
            SubmitError::Input(_) => dialog::INPUT_ERROR_TEXT.to_string(),
            other => other.to_string(),
        }
    }
}

/// Read and validate the form, write the settings file, then clear the log
/// and mark a capture as running. Nothing is written when validation fails.
pub fn submit(state: &mut AppState, store: &SettingsStore) -> Result<CaptureRequest, SubmitError> {
    if !state.can_start() {
        return Err(SubmitError::Busy);
    }

    let request = state.read_fields().inspect_err(|e| warn!("Rejected form input: {}", e))?;
    store.save(&request)?;
    state.begin_capture();

    info!(
        "Capture requested: url={}, class={}, count={}, folder={:?}",
        request.url, request.target_class, request.max_count, request.output_folder
    );
    Ok(request)
}
