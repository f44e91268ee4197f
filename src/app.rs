//! The application window and its handlers.

use std::path::{Path, PathBuf};

use eframe::{egui, App, Frame};
use egui::{TextureHandle, TextureOptions};
use rfd::FileDialog;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::{AppEvent, DownloadProgress, DownloadRequest, FetchedVideo, FormatEntry, TaskKind};
use crate::tasks::TaskRunner;
use crate::{downloader, extractor, formats, thumbnail};

/// Trimmed URL, or [`AppError::MissingUrl`].
pub fn validate_url(input: &str) -> Result<String, AppError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(AppError::MissingUrl);
    }
    Ok(url.to_string())
}

/// Checks the inputs in order and only then asks for the destination
/// folder, so the picker never opens for an incomplete form.
pub fn prepare_download(
    url_input: &str,
    formats: &[FormatEntry],
    selected: Option<usize>,
    pick_folder: impl FnOnce() -> Option<PathBuf>,
) -> Result<DownloadRequest, AppError> {
    let url = validate_url(url_input)?;
    if formats.is_empty() {
        return Err(AppError::NoFormatsFetched);
    }
    let format = selected
        .and_then(|i| formats.get(i))
        .ok_or(AppError::MissingFormat)?;
    let output_dir = pick_folder().ok_or(AppError::MissingOutputDir)?;

    Ok(DownloadRequest {
        url,
        output_dir,
        format_id: format.format_id.clone(),
        resolution: format.resolution(),
    })
}

async fn run_fetch(ytdlp_override: Option<PathBuf>, url: String) -> Result<FetchedVideo, AppError> {
    let ytdlp = extractor::locate(ytdlp_override.as_deref())?;
    formats::fetch_formats(&ytdlp, &url).await
}

async fn run_download(
    ytdlp_override: Option<PathBuf>,
    request: DownloadRequest,
    on_progress: impl FnMut(DownloadProgress) + Send,
) -> Result<Option<PathBuf>, AppError> {
    let ytdlp = extractor::locate(ytdlp_override.as_deref())?;
    downloader::spawn_download(&ytdlp, request, on_progress).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogLevel {
    Info,
    Error,
}

/// A modal message; the form is disabled while one is open.
#[derive(Debug, Clone)]
struct Dialog {
    level: DialogLevel,
    message: String,
}

/// Button presses collected while drawing, handled after the frame's UI.
enum Action {
    Fetch,
    Download,
    Cancel,
}

/// Application state for the GUI
pub struct TubeApp {
    config: AppConfig,
    tasks: TaskRunner,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
    /// Input field for the video URL
    url_input: String,
    /// Result of the last successful fetch
    video: Option<FetchedVideo>,
    /// Index into `video.formats`
    selected: Option<usize>,
    /// Bumped on every fetch so late thumbnails are dropped
    generation: u64,
    thumbnail: Option<TextureHandle>,
    /// Folder the picker opens in; remembered for the session only
    last_output_dir: PathBuf,
    progress: Option<DownloadProgress>,
    status: String,
    dialog: Option<Dialog>,
}

impl TubeApp {
    pub fn new(config: AppConfig, tasks: TaskRunner) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            last_output_dir: config.initial_output_dir.clone(),
            config,
            tasks,
            events_tx,
            events_rx,
            url_input: String::new(),
            video: None,
            selected: None,
            generation: 0,
            thumbnail: None,
            progress: None,
            status: String::new(),
            dialog: None,
        }
    }

    fn formats(&self) -> &[FormatEntry] {
        self.video
            .as_ref()
            .map(|v| v.formats.as_slice())
            .unwrap_or_default()
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.dialog = Some(Dialog {
            level: DialogLevel::Error,
            message: message.into(),
        });
    }

    fn show_info(&mut self, message: impl Into<String>) {
        self.dialog = Some(Dialog {
            level: DialogLevel::Info,
            message: message.into(),
        });
    }

    fn start_fetch(&mut self, ctx: &egui::Context) {
        let url = match validate_url(&self.url_input) {
            Ok(url) => url,
            Err(e) => return self.show_error(e.to_string()),
        };

        let tx = self.events_tx.clone();
        let ctx_c = ctx.clone();
        let ytdlp_override = self.config.ytdlp_override.clone();
        let spawned = self.tasks.spawn(TaskKind::Fetch, async move {
            let result = run_fetch(ytdlp_override, url).await;
            let _ = tx.send(AppEvent::FormatsFetched(result));
            ctx_c.request_repaint();
        });

        match spawned {
            Ok(()) => self.status = "Fetching formats…".to_string(),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn start_download(
        &mut self,
        ctx: &egui::Context,
        pick_folder: impl FnOnce(&Path) -> Option<PathBuf>,
    ) {
        let start_dir = self.last_output_dir.clone();
        let request = match prepare_download(&self.url_input, self.formats(), self.selected, || {
            pick_folder(&start_dir)
        }) {
            Ok(request) => request,
            Err(e) => return self.show_error(e.to_string()),
        };
        self.last_output_dir = request.output_dir.clone();

        let tx = self.events_tx.clone();
        let progress_tx = self.events_tx.clone();
        let ctx_c = ctx.clone();
        let progress_ctx = ctx.clone();
        let ytdlp_override = self.config.ytdlp_override.clone();
        let resolution = request.resolution.clone();
        let spawned = self.tasks.spawn(TaskKind::Download, async move {
            let on_progress = move |p: DownloadProgress| {
                let _ = progress_tx.send(AppEvent::Progress(p));
                progress_ctx.request_repaint();
            };
            let result = run_download(ytdlp_override, request, on_progress).await;
            let _ = tx.send(AppEvent::DownloadFinished(result));
            ctx_c.request_repaint();
        });

        match spawned {
            Ok(()) => {
                self.progress = Some(DownloadProgress::default());
                self.status = format!("Downloading {resolution}…");
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn cancel_download(&mut self) {
        if self.tasks.cancel(TaskKind::Download) {
            self.progress = None;
            self.status = "Download cancelled".to_string();
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: AppEvent) {
        match event {
            AppEvent::FormatsFetched(Ok(video)) => {
                self.generation += 1;
                self.thumbnail = None;
                self.status.clear();
                self.selected = Some(0);
                if let Some(url) = video.thumbnail.clone() {
                    let generation = self.generation;
                    let tx = self.events_tx.clone();
                    let ctx_c = ctx.clone();
                    self.tasks.spawn_blocking(move || {
                        if let Some(image) = thumbnail::fetch_thumbnail(&url) {
                            let _ = tx.send(AppEvent::Thumbnail { generation, image });
                            ctx_c.request_repaint();
                        }
                    });
                }
                self.video = Some(video);
            }
            AppEvent::FormatsFetched(Err(e)) => {
                log::warn!("Format fetch failed: {e}");
                self.generation += 1;
                self.video = None;
                self.selected = None;
                self.thumbnail = None;
                self.status.clear();
                self.show_error(format!("Failed to fetch formats: {e}"));
            }
            AppEvent::Thumbnail { generation, image } => {
                if generation == self.generation {
                    self.thumbnail =
                        Some(ctx.load_texture("thumbnail", image, TextureOptions::default()));
                }
            }
            AppEvent::Progress(p) => {
                // Late updates from a cancelled download are ignored.
                if self.progress.is_some() {
                    self.progress = Some(p);
                }
            }
            AppEvent::DownloadFinished(result) => {
                self.progress = None;
                self.status.clear();
                match result {
                    Ok(Some(path)) => {
                        self.show_info(format!("Download completed!\n{}", path.display()))
                    }
                    Ok(None) => self.show_info("Download completed!"),
                    Err(e) => self.show_error(format!("Failed to download video: {e}")),
                }
            }
        }
    }

    fn draw_form(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        let fetching = self.tasks.is_running(TaskKind::Fetch);
        let downloading = self.tasks.is_running(TaskKind::Download);

        ui.heading("Video to MP4");
        ui.add_space(8.0);

        ui.label("Video URL:");
        ui.add(
            egui::TextEdit::singleline(&mut self.url_input)
                .hint_text("https://…")
                .desired_width(f32::INFINITY),
        );
        if ui
            .add_enabled(!fetching, egui::Button::new("Fetch Available Formats"))
            .clicked()
        {
            action = Some(Action::Fetch);
        }
        ui.add_space(8.0);

        if let Some(video) = &self.video {
            ui.horizontal(|ui| {
                if let Some(tex) = &self.thumbnail {
                    ui.add(egui::Image::new(tex).max_width(160.0));
                }
                ui.label(egui::RichText::new(&video.title).strong());
            });
            ui.add_space(8.0);
        }

        ui.label("Select Resolution:");
        let labels: Vec<String> = self.formats().iter().map(FormatEntry::label).collect();
        let current = self
            .selected
            .and_then(|i| labels.get(i).cloned())
            .unwrap_or_default();
        egui::ComboBox::from_id_source("resolution")
            .width(260.0)
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (i, label) in labels.iter().enumerate() {
                    ui.selectable_value(&mut self.selected, Some(i), label);
                }
            });
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!downloading, egui::Button::new("Download MP4"))
                .clicked()
            {
                action = Some(Action::Download);
            }
            if downloading && ui.button("Cancel").clicked() {
                action = Some(Action::Cancel);
            }
        });
        ui.add_space(8.0);

        let progress = self.progress.unwrap_or_default();
        ui.add(egui::ProgressBar::new(progress.percent() / 100.0).show_percentage());
        if self.progress.is_some() && progress.downloaded > 0 {
            ui.label(progress.size_label());
        } else {
            ui.label(&self.status);
        }

        action
    }

    fn draw_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else { return };
        let title = match dialog.level {
            DialogLevel::Info => "Success",
            DialogLevel::Error => "Error",
        };

        let mut close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&dialog.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.dialog = None;
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for TubeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(ctx, event);
        }

        let modal = self.dialog.is_some();
        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal, |ui| {
                action = self.draw_form(ui);
            });
        });
        self.draw_dialog(ctx);

        match action {
            Some(Action::Fetch) => self.start_fetch(ctx),
            Some(Action::Download) => self.start_download(ctx, |dir| {
                FileDialog::new().set_directory(dir).pick_folder()
            }),
            Some(Action::Cancel) => self.cancel_download(),
            None => {}
        }

        if self.tasks.is_running(TaskKind::Fetch) || self.tasks.is_running(TaskKind::Download) {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
