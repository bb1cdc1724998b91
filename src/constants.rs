// constants.rs - Application-wide Constants
//
// Centralized defaults for the capture pipeline, the settings file and the form window.

/// Capture pipeline defaults
pub mod capture {
    use std::time::Duration;

    /// Class name the form starts with when nothing else is configured
    pub const DEFAULT_TARGET_CLASS: &str = "main-container";
    /// Upper bound on waiting for `document.readyState == "complete"`
    pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
    /// First readiness poll interval, doubled after each miss
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// Readiness poll interval ceiling
    pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);
    /// Extra wait after the document is ready, for script-rendered content
    pub const SETTLE_DELAY: Duration = Duration::from_secs(1);
    /// Output file prefix; files are `<prefix><n>.png`, 1-indexed
    pub const FILE_PREFIX: &str = "screenshot_";
    /// Folder name used under the user's pictures directory when no settings exist
    pub const DEFAULT_FOLDER_NAME: &str = "IMGCatcher";
    /// Fallback when the platform has no pictures directory
    pub const FALLBACK_FOLDER: &str = "screenshots";
}

/// Headless browser defaults
pub mod browser {
    /// Viewport width handed to the browser on launch
    pub const WINDOW_WIDTH: u32 = 1920;
    /// Viewport height handed to the browser on launch
    pub const WINDOW_HEIGHT: u32 = 1080;
    /// Arguments that keep Chromium quiet on stderr
    pub const QUIET_ARGS: &[&str] = &["--log-level=3", "--disable-logging", "--silent"];
}

/// Settings persistence
pub mod settings {
    /// Settings file, resolved against the process working directory
    pub const FILE_NAME: &str = "settings.json";
}

/// Form window
pub mod window {
    pub const TITLE: &str = "Screenshot Capture Tool";
    pub const WIDTH: f32 = 720.0;
    pub const HEIGHT: f32 = 640.0;
    pub const MIN_WIDTH: f32 = 520.0;
    pub const MIN_HEIGHT: f32 = 480.0;
    /// Width of the label column in the form grid
    pub const LABEL_WIDTH: f32 = 170.0;
}

/// Modal dialog texts
pub mod dialog {
    pub const INPUT_ERROR_TITLE: &str = "Input Error";
    pub const INPUT_ERROR_TEXT: &str =
        "Please enter valid integer values for number of screenshots and cropping dimensions.";
    pub const ERROR_TITLE: &str = "Error";
}
