// capture/pipeline.rs - Capture Pipeline
//
// launch → load → wait for readiness → query → screenshot → crop → close → reveal.
// Progress lines go out over a channel; the UI thread owns the log pane.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::channel::mpsc;
use futures::SinkExt;
use log::{error, info, warn};

use super::browser::{BrowserLauncher, BrowserSession};
use super::{crop, CaptureError};
use crate::app::CaptureRequest;
use crate::constants::capture::{LOAD_TIMEOUT, MAX_POLL_INTERVAL, POLL_INTERVAL, SETTLE_DELAY};

/// Timing and side-effect knobs for a capture run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Upper bound on waiting for the page to report `complete`
    pub load_timeout: Duration,
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    /// Extra wait once the document is ready
    pub settle_delay: Duration,
    /// Open the output folder in the file manager after a successful run
    pub reveal_folder: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            load_timeout: LOAD_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            max_poll_interval: MAX_POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
            reveal_folder: true,
        }
    }
}

/// What a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Elements matching the selector
    pub found: usize,
    pub requested: u32,
    /// Files written, in order
    pub written: Vec<PathBuf>,
    /// Description of the failure that ended the run, if any
    pub error: Option<String>,
}

/// Sent from the capture task to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Log(String),
    Finished(CaptureReport),
}

/// Mirrors every line to `log` and to the UI channel
struct Progress<'a> {
    events: &'a mut mpsc::Sender<CaptureEvent>,
}

impl Progress<'_> {
    async fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.send(CaptureEvent::Log(text)).await;
    }

    async fn warn(&mut self, text: String) {
        warn!("{}", text);
        self.send(CaptureEvent::Log(text)).await;
    }

    async fn error(&mut self, err: &CaptureError) {
        error!("Capture failed: {}", err);
        self.send(CaptureEvent::Log(format!("Error: {err}"))).await;
    }

    async fn send(&mut self, event: CaptureEvent) {
        // A closed receiver means the window is gone; keep going regardless
        let _ = self.events.send(event).await;
    }
}

/// Run one capture. Any failure is reported as a single `Error:` line; a
/// `Finished` event is always sent last.
pub async fn run(
    request: &CaptureRequest,
    launcher: &dyn BrowserLauncher,
    options: &PipelineOptions,
    events: &mut mpsc::Sender<CaptureEvent>,
) -> Result<CaptureReport, CaptureError> {
    let mut progress = Progress { events };
    let mut report = CaptureReport {
        requested: request.max_count,
        ..Default::default()
    };

    let result = run_session(request, launcher, options, &mut progress, &mut report).await;
    if let Err(ref e) = result {
        progress.error(e).await;
        report.error = Some(e.to_string());
    }

    progress.send(CaptureEvent::Finished(report.clone())).await;
    result.map(|()| report)
}

async fn run_session(
    request: &CaptureRequest,
    launcher: &dyn BrowserLauncher,
    options: &PipelineOptions,
    progress: &mut Progress<'_>,
    report: &mut CaptureReport,
) -> Result<(), CaptureError> {
    progress.line("Starting browser...").await;
    let mut session = launcher.launch().await?;

    let outcome = capture_elements(session.as_mut(), request, options, progress, report).await;

    // Released on every path once launched
    progress.line("Closing the browser...").await;
    match session.close().await {
        Ok(()) => progress.line("Browser closed.").await,
        Err(e) => progress.warn(format!("Warning: {e}")).await,
    }

    outcome?;

    if options.reveal_folder {
        reveal_folder(&request.output_folder, progress).await;
    }
    Ok(())
}

async fn capture_elements(
    session: &mut dyn BrowserSession,
    request: &CaptureRequest,
    options: &PipelineOptions,
    progress: &mut Progress<'_>,
    report: &mut CaptureReport,
) -> Result<(), CaptureError> {
    progress.line(format!("Opening URL: {}", request.url)).await;
    session.goto(&request.url).await?;

    progress.line("Waiting for the page to load...").await;
    wait_until_ready(session, options).await?;

    progress
        .line(format!("Finding div elements with class: {}", request.target_class))
        .await;
    let found = session.find_elements(&request.selector()).await?;
    report.found = found;
    progress.line(format!("Found {found} div elements.")).await;

    let requested = request.max_count as usize;
    if found < requested {
        progress
            .line(format!("Requested {requested} screenshots but only {found} elements match."))
            .await;
    }

    let folder = &request.output_folder;
    if !folder.exists() {
        progress
            .line(format!("Creating output folder: {}", folder.display()))
            .await;
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|e| CaptureError::io(folder, e))?;
    }

    for index in 0..requested.min(found) {
        let path = request.screenshot_path(index);
        progress
            .line(format!(
                "Capturing screenshot of div {} and saving to {}",
                index + 1,
                path.display()
            ))
            .await;

        let png = session.screenshot_element(index).await?;
        tokio::fs::write(&path, &png)
            .await
            .map_err(|e| CaptureError::io(&path, e))?;
        report.written.push(path.clone());
        progress
            .line(format!("Screenshot saved to {}", path.display()))
            .await;

        if !request.crop.is_empty() {
            let (width, height) = crop::crop_in_place(&path, request.crop)?;
            progress
                .line(format!(
                    "Cropped screenshot saved to {} ({width}x{height})",
                    path.display()
                ))
                .await;
        }
    }

    Ok(())
}

/// Poll `document.readyState` with doubling backoff until it is `complete`
async fn wait_until_ready(
    session: &mut dyn BrowserSession,
    options: &PipelineOptions,
) -> Result<(), CaptureError> {
    let poll = async {
        let mut interval = options.poll_interval;
        loop {
            if session.ready_state().await? == "complete" {
                return Ok::<(), CaptureError>(());
            }
            tokio::time::sleep(interval).await;
            interval = (interval * 2).min(options.max_poll_interval);
        }
    };

    tokio::time::timeout(options.load_timeout, poll)
        .await
        .map_err(|_| CaptureError::PageLoadTimeout(options.load_timeout))??;

    if !options.settle_delay.is_zero() {
        tokio::time::sleep(options.settle_delay).await;
    }
    Ok(())
}

async fn reveal_folder(folder: &Path, progress: &mut Progress<'_>) {
    let target = folder.to_path_buf();
    let opened = tokio::task::spawn_blocking(move || open::that(&target)).await;
    match opened {
        Ok(Ok(())) => info!("Opened {:?} in the file manager", folder),
        Ok(Err(e)) => {
            progress
                .warn(format!("Could not open {}: {e}", folder.display()))
                .await
        }
        Err(e) => warn!("Folder reveal task failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures::StreamExt;
    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;
    use crate::app::CropMargins;

    /// Scripted stand-in for a browser
    #[derive(Clone)]
    struct FakeLauncher {
        /// Sizes of the elements the page "contains"
        elements: Vec<(u32, u32)>,
        /// Polls that report `loading` before `complete`; `None` never completes
        loading_polls: Option<usize>,
        fail_launch: bool,
        fail_goto: bool,
        closes: Arc<AtomicUsize>,
    }

    impl FakeLauncher {
        fn with_elements(count: usize) -> Self {
            Self {
                elements: vec![(40, 30); count],
                loading_polls: Some(0),
                fail_launch: false,
                fail_goto: false,
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    struct FakeSession {
        script: FakeLauncher,
        polls: usize,
    }

    fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([shade, 80, 160, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>, CaptureError> {
            if self.fail_launch {
                return Err(CaptureError::Launch("no browser installed".into()));
            }
            Ok(Box::new(FakeSession {
                script: self.clone(),
                polls: 0,
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn goto(&mut self, url: &str) -> Result<(), CaptureError> {
            if self.script.fail_goto {
                return Err(CaptureError::Navigation {
                    url: url.into(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".into(),
                });
            }
            Ok(())
        }

        async fn ready_state(&mut self) -> Result<String, CaptureError> {
            self.polls += 1;
            let ready = matches!(self.script.loading_polls, Some(n) if self.polls > n);
            Ok(if ready { "complete" } else { "loading" }.into())
        }

        async fn find_elements(&mut self, _selector: &str) -> Result<usize, CaptureError> {
            Ok(self.script.elements.len())
        }

        async fn screenshot_element(&mut self, index: usize) -> Result<Vec<u8>, CaptureError> {
            let (w, h) = self.script.elements[index];
            Ok(png(w, h, index as u8))
        }

        async fn close(self: Box<Self>) -> Result<(), CaptureError> {
            self.script.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            load_timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(1),
            max_poll_interval: Duration::from_millis(5),
            settle_delay: Duration::ZERO,
            reveal_folder: false,
        }
    }

    fn request(folder: &Path, max_count: u32) -> CaptureRequest {
        CaptureRequest {
            url: "https://example.com".into(),
            target_class: "main-container".into(),
            output_folder: folder.to_path_buf(),
            max_count,
            crop: CropMargins::default(),
        }
    }

    /// Run the pipeline and collect the log lines it sent
    async fn capture(
        request: &CaptureRequest,
        launcher: &FakeLauncher,
        options: &PipelineOptions,
    ) -> (Result<CaptureReport, CaptureError>, Vec<String>, CaptureReport) {
        let (mut tx, rx) = mpsc::channel(256);
        let result = run(request, launcher, options, &mut tx).await;
        drop(tx);

        let events: Vec<CaptureEvent> = rx.collect().await;
        let mut lines = Vec::new();
        let mut finished = None;
        for event in events {
            match event {
                CaptureEvent::Log(line) => lines.push(line),
                CaptureEvent::Finished(report) => finished = Some(report),
            }
        }
        (result, lines, finished.expect("Finished event"))
    }

    fn png_files(folder: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(folder)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".png"))
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_captures_requested_count_when_enough_match() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let launcher = FakeLauncher::with_elements(3);

        let (result, lines, finished) = capture(&request(&out, 2), &launcher, &options()).await;

        let report = result.unwrap();
        assert_eq!(report.found, 3);
        assert_eq!(report.written.len(), 2);
        assert_eq!(finished, report);
        assert_eq!(png_files(&out), ["screenshot_1.png", "screenshot_2.png"]);

        assert_eq!(lines.first().unwrap(), "Starting browser...");
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("Capturing screenshot")).count(),
            2
        );
        assert_eq!(lines.last().unwrap(), "Browser closed.");
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn test_captures_only_matches_when_more_requested() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::with_elements(2);

        let (result, lines, _) = capture(&request(dir.path(), 5), &launcher, &options()).await;

        assert_eq!(result.unwrap().written.len(), 2);
        assert_eq!(png_files(dir.path()), ["screenshot_1.png", "screenshot_2.png"]);
        assert!(lines.iter().any(|l| l.contains("only 2 elements match")));
    }

    #[tokio::test]
    async fn test_zero_count_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::with_elements(3);

        let (result, lines, _) = capture(&request(dir.path(), 0), &launcher, &options()).await;

        assert!(result.unwrap().written.is_empty());
        assert!(png_files(dir.path()).is_empty());
        assert!(!lines.iter().any(|l| l.starts_with("Error:")));
    }

    #[tokio::test]
    async fn test_second_run_overwrites_same_files() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::with_elements(2);
        let req = request(dir.path(), 2);

        capture(&req, &launcher, &options()).await.0.unwrap();
        let first = png_files(dir.path());
        let (result, lines, _) = capture(&req, &launcher, &options()).await;

        result.unwrap();
        assert_eq!(png_files(dir.path()), first);
        assert!(!lines.iter().any(|l| l.starts_with("Creating output folder")));
    }

    #[tokio::test]
    async fn test_zero_margins_keep_screenshot_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::with_elements(1);

        let (_, lines, _) = capture(&request(dir.path(), 1), &launcher, &options()).await;

        let written = std::fs::read(dir.path().join("screenshot_1.png")).unwrap();
        assert_eq!(written, png(40, 30, 0));
        assert!(!lines.iter().any(|l| l.starts_with("Cropped")));
    }

    #[tokio::test]
    async fn test_margins_crop_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = FakeLauncher::with_elements(2);
        let mut req = request(dir.path(), 2);
        req.crop = CropMargins::new(5, 5, 2, 8);

        capture(&req, &launcher, &options()).await.0.unwrap();

        for name in png_files(dir.path()) {
            let img = image::open(dir.path().join(name)).unwrap();
            assert_eq!((img.width(), img.height()), (30, 20));
        }
    }

    #[tokio::test]
    async fn test_invalid_crop_reports_one_error_and_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::with_elements(3);
        // Second element is too narrow for the margins
        launcher.elements[1] = (8, 30);
        let mut req = request(dir.path(), 3);
        req.crop = CropMargins::new(5, 5, 0, 0);

        let (result, lines, finished) = capture(&req, &launcher, &options()).await;

        assert!(matches!(result, Err(CaptureError::InvalidCrop { width: 8, .. })));
        assert_eq!(lines.iter().filter(|l| l.starts_with("Error:")).count(), 1);
        assert!(lines.last().unwrap().starts_with("Error:"));
        assert!(finished.error.is_some());
        assert_eq!(png_files(dir.path()), ["screenshot_1.png", "screenshot_2.png"]);
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn test_browser_is_closed_when_navigation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::with_elements(1);
        launcher.fail_goto = true;

        let (result, lines, _) = capture(&request(dir.path(), 1), &launcher, &options()).await;

        assert!(matches!(result, Err(CaptureError::Navigation { .. })));
        assert_eq!(launcher.closes(), 1);
        assert!(lines.iter().any(|l| l == "Browser closed."));
    }

    #[tokio::test]
    async fn test_launch_failure_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::with_elements(1);
        launcher.fail_launch = true;

        let (result, lines, _) = capture(&request(dir.path(), 1), &launcher, &options()).await;

        assert!(matches!(result, Err(CaptureError::Launch(_))));
        assert_eq!(lines, ["Starting browser...", "Error: failed to launch browser: no browser installed"]);
        assert_eq!(launcher.closes(), 0);
    }

    #[tokio::test]
    async fn test_waits_for_page_to_complete() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::with_elements(1);
        launcher.loading_polls = Some(3);

        let (result, _, _) = capture(&request(dir.path(), 1), &launcher, &options()).await;

        assert_eq!(result.unwrap().written.len(), 1);
    }

    #[tokio::test]
    async fn test_page_load_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::with_elements(1);
        launcher.loading_polls = None;
        let opts = PipelineOptions {
            load_timeout: Duration::from_millis(30),
            ..options()
        };

        let (result, lines, _) = capture(&request(dir.path(), 1), &launcher, &opts).await;

        assert!(matches!(result, Err(CaptureError::PageLoadTimeout(_))));
        assert!(lines.last().unwrap().contains("did not finish loading"));
        assert_eq!(launcher.closes(), 1);
        assert!(png_files(dir.path()).is_empty());
    }
}
