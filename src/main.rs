//! IMGCatcher - Element Screenshot Tool
//!
//! Form window with:
//! - URL, count, output folder and element class fields
//! - Cropping options
//! - Log pane streaming progress of the capture task

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use anyhow::Context;
use iced::widget::scrollable::RelativeOffset;
use iced::widget::{
    button, column, container, horizontal_space, row, scrollable, text, text_input, Column,
};
use iced::{window, Alignment, Color, Element, Font, Length, Padding, Size, Task, Theme};
use log::{error, info};

use imgcatcher::app::{self, AppState, Field, FormFields, SubmitError};
use imgcatcher::capture::{self, BrowserLauncher, CaptureEvent, ChromeLauncher, PipelineOptions};
use imgcatcher::constants::window::{HEIGHT, LABEL_WIDTH, MIN_HEIGHT, MIN_WIDTH, TITLE, WIDTH};
use imgcatcher::settings::SettingsStore;

// Color palette (modern dark theme)
mod colors {
    use iced::Color;

    pub const BG_PRIMARY: Color = Color::from_rgb(0.09, 0.09, 0.12);
    pub const BG_SECONDARY: Color = Color::from_rgb(0.12, 0.12, 0.16);

    pub const ACCENT: Color = Color::from_rgb(0.35, 0.55, 0.95);
    pub const ACCENT_HOVER: Color = Color::from_rgb(0.45, 0.65, 1.0);
    pub const DISABLED: Color = Color::from_rgb(0.16, 0.16, 0.22);

    pub const TEXT_PRIMARY: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.95);
    pub const TEXT_SECONDARY: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.6);
    pub const TEXT_MUTED: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.4);

    pub const BORDER: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.1);
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
enum Message {
    FieldChanged(Field, String),
    BrowseFolder,
    StartCapture,
    Capture(CaptureEvent),
}

// ============================================================================
// Application State
// ============================================================================

struct ImgCatcherApp {
    state: AppState,
    store: SettingsStore,
    launcher: Arc<dyn BrowserLauncher>,
    pipeline: PipelineOptions,
    log_id: scrollable::Id,
}

impl ImgCatcherApp {
    fn new(fields: FormFields, store: SettingsStore) -> (Self, Task<Message>) {
        let app = Self {
            state: AppState::new(fields),
            store,
            launcher: Arc::new(ChromeLauncher::default()),
            pipeline: PipelineOptions::default(),
            log_id: scrollable::Id::unique(),
        };
        (app, Task::none())
    }

    fn title(&self) -> String {
        if self.state.running {
            format!("{TITLE} - capturing...")
        } else {
            TITLE.to_string()
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FieldChanged(field, value) => self.state.fields.set(field, value),

            Message::BrowseFolder => {
                let mut dialog = rfd::FileDialog::new().set_title("Select Output Folder");
                let current = &self.state.fields.output_folder;
                if !current.is_empty() && std::path::Path::new(current).is_dir() {
                    dialog = dialog.set_directory(current);
                }
                if let Some(folder) = dialog.pick_folder() {
                    info!("Output folder selected: {:?}", folder);
                    self.state
                        .fields
                        .set(Field::OutputFolder, folder.display().to_string());
                }
            }

            Message::StartCapture => match app::submit(&mut self.state, &self.store) {
                Ok(request) => return self.spawn_capture(request),
                Err(e) => show_error(&e),
            },

            Message::Capture(CaptureEvent::Log(line)) => {
                self.state.update_log(line);
                return scrollable::snap_to(self.log_id.clone(), RelativeOffset::END);
            }

            Message::Capture(CaptureEvent::Finished(report)) => {
                self.state.finish_capture();
                match report.error {
                    Some(ref e) => info!("Capture ended with an error: {}", e),
                    None => info!(
                        "Capture finished: {} of {} requested written ({} found)",
                        report.written.len(),
                        report.requested,
                        report.found
                    ),
                }
            }
        }

        Task::none()
    }

    /// Run the pipeline on the async executor; its events come back as messages
    fn spawn_capture(&self, request: app::CaptureRequest) -> Task<Message> {
        let launcher = Arc::clone(&self.launcher);
        let options = self.pipeline.clone();

        let events = iced::stream::channel(64, move |mut output| async move {
            // Failures were already reported on the channel
            let _ = capture::run(&request, launcher.as_ref(), &options, &mut output).await;
        });
        Task::run(events, Message::Capture)
    }

    fn view(&self) -> Element<'_, Message> {
        let fields = &self.state.fields;

        let output_row = row![
            label(Field::OutputFolder),
            input(Field::OutputFolder, fields, "Folder for screenshot_<n>.png"),
            button(text("Browse").size(13))
                .padding(Padding::from([6, 14]))
                .on_press(Message::BrowseFolder),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let form = column![
            field_row(Field::Url, fields, "https://example.com"),
            field_row(Field::Count, fields, "0"),
            output_row,
            field_row(Field::TargetClass, fields, "main-container"),
        ]
        .spacing(10);

        let crop_rows = Field::crops()
            .iter()
            .map(|&field| field_row(field, fields, "0"));
        let crop_group = container(
            column![text("Cropping Options").size(14).color(colors::TEXT_SECONDARY)]
                .push(Column::with_children(crop_rows).spacing(8))
                .spacing(10),
        )
        .padding(12)
        .width(Length::Fill)
        .style(|_| container::Style {
            background: Some(iced::Background::Color(colors::BG_SECONDARY)),
            border: iced::Border {
                color: colors::BORDER,
                width: 1.0,
                radius: 8.0.into(),
            },
            ..Default::default()
        });

        let content = column![
            form,
            crop_group,
            self.view_log(),
            container(self.view_capture_button()).center_x(Length::Fill),
        ]
        .spacing(14)
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_| container::Style {
                background: Some(iced::Background::Color(colors::BG_PRIMARY)),
                ..Default::default()
            })
            .into()
    }

    fn view_log(&self) -> Element<'_, Message> {
        let lines = self.state.log.lines().iter().map(|line| {
            text(line.as_str())
                .size(12)
                .font(Font::MONOSPACE)
                .color(colors::TEXT_PRIMARY)
                .into()
        });

        let log = scrollable(Column::with_children(lines).spacing(2).padding(8))
            .id(self.log_id.clone())
            .width(Length::Fill)
            .height(Length::Fill);

        container(log)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_| container::Style {
                background: Some(iced::Background::Color(Color::BLACK)),
                border: iced::Border {
                    color: colors::BORDER,
                    width: 1.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            })
            .into()
    }

    fn view_capture_button(&self) -> Element<'_, Message> {
        let enabled = self.state.can_start();
        let caption = if enabled {
            "Capture Screenshots"
        } else {
            "Capturing..."
        };

        let capture_button = button(text(caption).size(15).color(colors::TEXT_PRIMARY))
            .padding(Padding::from([10, 28]))
            .style(move |_, s| {
                let bg = match s {
                    _ if !enabled => colors::DISABLED,
                    button::Status::Hovered | button::Status::Pressed => colors::ACCENT_HOVER,
                    _ => colors::ACCENT,
                };
                button::Style {
                    background: Some(iced::Background::Color(bg)),
                    text_color: colors::TEXT_PRIMARY,
                    border: iced::Border {
                        radius: 6.0.into(),
                        ..Default::default()
                    },
                    ..Default::default()
                }
            })
            .on_press_maybe(enabled.then_some(Message::StartCapture));

        row![capture_button, horizontal_space().width(12), self.view_status()]
            .align_y(Alignment::Center)
            .into()
    }

    fn view_status(&self) -> Element<'_, Message> {
        let status = match self.state.log.lines().last() {
            Some(line) if self.state.running => line.as_str(),
            _ => "",
        };
        text(status).size(11).color(colors::TEXT_MUTED).into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn label(field: Field) -> Element<'static, Message> {
    text(field.label())
        .size(13)
        .color(colors::TEXT_SECONDARY)
        .width(Length::Fixed(LABEL_WIDTH))
        .into()
}

fn input<'a>(field: Field, fields: &'a FormFields, placeholder: &'a str) -> Element<'a, Message> {
    text_input(placeholder, fields.get(field))
        .on_input(move |value| Message::FieldChanged(field, value))
        .padding(6)
        .size(13)
        .into()
}

fn field_row<'a>(field: Field, fields: &'a FormFields, placeholder: &'a str) -> Element<'a, Message> {
    row![label(field), input(field, fields, placeholder)]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}

/// Blocking modal, shown before any capture starts
fn show_error(err: &SubmitError) {
    error!("{}", err);
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(err.dialog_title())
        .set_description(err.dialog_text())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

// ============================================================================
// Main
// ============================================================================

fn main() -> anyhow::Result<()> {
    // Initialize logger with renderer and CDP chatter filtered out
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Error)
        .filter_module("naga", log::LevelFilter::Error)
        .filter_module("chromiumoxide", log::LevelFilter::Warn)
        .init();
    info!("IMGCatcher starting...");

    let store = SettingsStore::in_working_dir();
    let fields = match store.load() {
        Ok(Some(fields)) => fields,
        Ok(None) => {
            info!("No settings at {:?}, starting with defaults", store.path());
            FormFields::first_start()
        }
        Err(e) => {
            error!("Failed to load settings from {:?}: {}", store.path(), e);
            return Err(e).context("failed to load settings");
        }
    };

    iced::application(ImgCatcherApp::title, ImgCatcherApp::update, ImgCatcherApp::view)
        .theme(ImgCatcherApp::theme)
        .window(window::Settings {
            size: Size::new(WIDTH, HEIGHT),
            min_size: Some(Size::new(MIN_WIDTH, MIN_HEIGHT)),
            ..Default::default()
        })
        .run_with(move || ImgCatcherApp::new(fields, store))?;

    Ok(())
}
