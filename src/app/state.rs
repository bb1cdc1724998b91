// app/state.rs - Core Application State
//
// Form fields, the capture request built from them, and the state record
// owned by the UI thread.

use std::path::PathBuf;

use thiserror::Error;

use super::log_sink::LogSink;
use crate::constants::capture::{DEFAULT_FOLDER_NAME, DEFAULT_TARGET_CLASS, FALLBACK_FOLDER};

/// Pixels trimmed from each edge of a captured element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropMargins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl CropMargins {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }

    /// True when every margin is zero and the crop step can be skipped
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

/// Everything one capture run needs, built fresh from the form each time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub url: String,
    pub target_class: String,
    pub output_folder: PathBuf,
    pub max_count: u32,
    pub crop: CropMargins,
}

impl CaptureRequest {
    /// CSS selector for the elements this request captures
    pub fn selector(&self) -> String {
        format!("div.{}", self.target_class)
    }

    /// Destination of the `index`-th (0-based) screenshot
    pub fn screenshot_path(&self, index: usize) -> PathBuf {
        self.output_folder.join(format!(
            "{}{}.png",
            crate::constants::capture::FILE_PREFIX,
            index + 1
        ))
    }
}

/// A count or crop field that does not hold a non-negative integer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} must be a non-negative integer, got {value:?}")]
pub struct InputError {
    pub field: &'static str,
    pub value: String,
}

/// Identifies a single text field of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    Count,
    OutputFolder,
    TargetClass,
    CropLeft,
    CropRight,
    CropTop,
    CropBottom,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Url => "URL:",
            Field::Count => "Number of Screenshots:",
            Field::OutputFolder => "Output Folder:",
            Field::TargetClass => "Element Class:",
            Field::CropLeft => "Crop Left (pixels):",
            Field::CropRight => "Crop Right (pixels):",
            Field::CropTop => "Crop Top (pixels):",
            Field::CropBottom => "Crop Bottom (pixels):",
        }
    }

    /// Crop margin fields, in the order the form shows them
    pub fn crops() -> &'static [Field] {
        &[Field::CropLeft, Field::CropRight, Field::CropTop, Field::CropBottom]
    }
}

/// Raw text of every form field, exactly as typed or loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub url: String,
    pub num_screenshots: String,
    pub output_folder: String,
    pub target_class: String,
    pub crop_left: String,
    pub crop_right: String,
    pub crop_top: String,
    pub crop_bottom: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            url: String::new(),
            num_screenshots: String::new(),
            output_folder: String::new(),
            target_class: DEFAULT_TARGET_CLASS.to_string(),
            crop_left: String::new(),
            crop_right: String::new(),
            crop_top: String::new(),
            crop_bottom: String::new(),
        }
    }
}

impl FormFields {
    /// Fields for a first start, with the output folder under the user's pictures
    pub fn first_start() -> Self {
        let folder = dirs::picture_dir()
            .map(|dir| dir.join(DEFAULT_FOLDER_NAME))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_FOLDER));
        Self {
            output_folder: folder.display().to_string(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Url => &self.url,
            Field::Count => &self.num_screenshots,
            Field::OutputFolder => &self.output_folder,
            Field::TargetClass => &self.target_class,
            Field::CropLeft => &self.crop_left,
            Field::CropRight => &self.crop_right,
            Field::CropTop => &self.crop_top,
            Field::CropBottom => &self.crop_bottom,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Url => &mut self.url,
            Field::Count => &mut self.num_screenshots,
            Field::OutputFolder => &mut self.output_folder,
            Field::TargetClass => &mut self.target_class,
            Field::CropLeft => &mut self.crop_left,
            Field::CropRight => &mut self.crop_right,
            Field::CropTop => &mut self.crop_top,
            Field::CropBottom => &mut self.crop_bottom,
        };
        *slot = value;
    }

    /// Parse the form into a request. Blank integers become 0, anything else
    /// that is not a `u32` is an error.
    pub fn to_request(&self) -> Result<CaptureRequest, InputError> {
        let max_count = parse_int("Number of Screenshots", &self.num_screenshots)?;
        let crop = CropMargins {
            left: parse_int("Crop Left", &self.crop_left)?,
            right: parse_int("Crop Right", &self.crop_right)?,
            top: parse_int("Crop Top", &self.crop_top)?,
            bottom: parse_int("Crop Bottom", &self.crop_bottom)?,
        };

        let target_class = match self.target_class.trim() {
            "" => DEFAULT_TARGET_CLASS.to_string(),
            class => class.to_string(),
        };

        Ok(CaptureRequest {
            url: self.url.clone(),
            target_class,
            output_folder: PathBuf::from(&self.output_folder),
            max_count,
            crop,
        })
    }
}

impl From<&CaptureRequest> for FormFields {
    fn from(request: &CaptureRequest) -> Self {
        Self {
            url: request.url.clone(),
            num_screenshots: request.max_count.to_string(),
            output_folder: request.output_folder.display().to_string(),
            target_class: request.target_class.clone(),
            crop_left: request.crop.left.to_string(),
            crop_right: request.crop.right.to_string(),
            crop_top: request.crop.top.to_string(),
            crop_bottom: request.crop.bottom.to_string(),
        }
    }
}

fn parse_int(field: &'static str, text: &str) -> Result<u32, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u32>().map_err(|_| InputError {
        field,
        value: text.to_string(),
    })
}

/// Main application state
/// Owned by the UI thread; the capture task only talks to it through messages.
#[derive(Debug, Default)]
pub struct AppState {
    pub fields: FormFields,
    pub log: LogSink,
    /// Whether a capture task is in flight
    pub running: bool,
}

impl AppState {
    pub fn new(fields: FormFields) -> Self {
        Self {
            fields,
            log: LogSink::default(),
            running: false,
        }
    }

    /// Append one line to the log pane
    pub fn update_log(&mut self, line: impl Into<String>) {
        self.log.push(line);
    }

    /// Build a capture request from the current form state
    pub fn read_fields(&self) -> Result<CaptureRequest, InputError> {
        self.fields.to_request()
    }

    /// Mark a capture as started; clears the log from the previous run
    pub fn begin_capture(&mut self) {
        self.log.clear();
        self.running = true;
    }

    pub fn finish_capture(&mut self) {
        self.running = false;
    }

    /// The trigger stays disabled while a capture is running
    pub fn can_start(&self) -> bool {
        !self.running
    }
}
