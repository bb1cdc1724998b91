// settings.rs - Settings Persistence
//
// One flat JSON record in the working directory. Saving writes typed values;
// loading hands back plain text for the form and does not check types.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::app::{CaptureRequest, FormFields};
use crate::constants::capture::DEFAULT_TARGET_CLASS;
use crate::constants::settings::FILE_NAME;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("settings file must hold a JSON object")]
    NotAnObject,
}

/// On-disk shape of the settings file
#[derive(Debug, Serialize)]
struct SettingsRecord<'a> {
    url: &'a str,
    num_screenshots: u32,
    output_folder: String,
    crop_left: u32,
    crop_right: u32,
    crop_top: u32,
    crop_bottom: u32,
    target_class: &'a str,
}

impl<'a> From<&'a CaptureRequest> for SettingsRecord<'a> {
    fn from(request: &'a CaptureRequest) -> Self {
        Self {
            url: &request.url,
            num_screenshots: request.max_count,
            output_folder: request.output_folder.display().to_string(),
            crop_left: request.crop.left,
            crop_right: request.crop.right,
            crop_top: request.crop.top,
            crop_bottom: request.crop.bottom,
            target_class: &request.target_class,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` relative to the process working directory
    pub fn in_working_dir() -> Self {
        Self::new(FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the settings file with `request`
    pub fn save(&self, request: &CaptureRequest) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&SettingsRecord::from(request))?;
        fs::write(&self.path, json).map_err(|source| {
            error!("Failed to write settings: {}", source);
            SettingsError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        info!("Settings saved to {:?}", self.path);
        Ok(())
    }

    /// Read the previous form values, or `None` when no settings file exists
    pub fn load(&self) -> Result<Option<FormFields>, SettingsError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value: Value = serde_json::from_str(&contents).map_err(|e| {
            error!("Failed to parse settings: {}", e);
            SettingsError::Parse(e)
        })?;
        let Value::Object(map) = value else {
            error!("Settings file {:?} does not hold an object", self.path);
            return Err(SettingsError::NotAnObject);
        };

        let mut fields = FormFields {
            url: field_text(&map, "url"),
            num_screenshots: field_text(&map, "num_screenshots"),
            output_folder: field_text(&map, "output_folder"),
            target_class: field_text(&map, "target_class"),
            crop_left: field_text(&map, "crop_left"),
            crop_right: field_text(&map, "crop_right"),
            crop_top: field_text(&map, "crop_top"),
            crop_bottom: field_text(&map, "crop_bottom"),
        };
        // Files written before the class became configurable have no such key
        if fields.target_class.is_empty() {
            fields.target_class = DEFAULT_TARGET_CLASS.to_string();
        }

        info!("Settings loaded from {:?}", self.path);
        Ok(Some(fields))
    }
}

/// Text shown in the form for one stored key; absent keys become empty
fn field_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
