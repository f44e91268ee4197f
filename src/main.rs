//! Desktop front-end for yt-dlp: paste a URL, pick a resolution, get an MP4.

// Window state and button handlers
mod app;
// Environment-driven startup settings
mod config;
// yt-dlp download runner
mod downloader;
// User-facing error type
mod error;
// Locating the yt-dlp executable
mod extractor;
// Format listing and filtering
mod formats;
// Formats, progress and worker events
mod model;
// Progress line parsing
mod progress;
// Background task tracking
mod tasks;
// Thumbnail fetching for the preview
mod thumbnail;

use app::TubeApp;
use config::AppConfig;
use tasks::TaskRunner;

// eframe/egui for GUI application framework
use eframe::egui::{self, Visuals};

/// Program entry point: initializes logging and the runtime, then launches the GUI
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting tube_to_mp4 v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env();
    let tasks = TaskRunner::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(config.window_title.clone()),
        ..Default::default()
    };
    let title = config.window_title.clone();
    let app = TubeApp::new(config, tasks);

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(app)
        }),
    )?;
    Ok(())
}
