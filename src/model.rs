use std::fmt;
use std::path::PathBuf;

use eframe::egui::ColorImage;
use humansize::{FormatSizeOptions, DECIMAL, format_size};

use crate::error::AppError;

/// One downloadable resolution of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// Frame height in pixels
    pub height: u32,
    /// Opaque yt-dlp format identifier
    pub format_id: String,
    /// Size in bytes when yt-dlp knows it
    pub filesize: Option<u64>,
}

impl FormatEntry {
    /// Resolution string such as `1080p`.
    pub fn resolution(&self) -> String {
        format!("{}p", self.height)
    }

    /// Text shown in the resolution dropdown.
    pub fn label(&self) -> String {
        match self.filesize {
            Some(bytes) => format!("{} ({})", self.resolution(), human_size(bytes)),
            None => format!("{} (Unknown size)", self.resolution()),
        }
    }
}

/// Result of a successful format fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchedVideo {
    pub title: String,
    pub thumbnail: Option<String>,
    /// Highest resolution first
    pub formats: Vec<FormatEntry>,
}

/// Byte counters reported by yt-dlp during a transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    /// Exact total if known, otherwise yt-dlp's estimate
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Percentage in `0.0..=100.0`; zero while the total is unknown.
    pub fn percent(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => {
                ((self.downloaded as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as f32
            }
            _ => 0.0,
        }
    }

    pub fn size_label(&self) -> String {
        match self.total {
            Some(total) if total > 0 => format!(
                "Downloaded: {} / {}",
                human_size(self.downloaded),
                human_size(total)
            ),
            _ => format!("Downloaded: {}", human_size(self.downloaded)),
        }
    }
}

/// Validated input for the download runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub format_id: String,
    pub resolution: String,
}

/// Kinds of background work; at most one of each runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Fetch,
    Download,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Fetch => f.write_str("format fetch"),
            TaskKind::Download => f.write_str("download"),
        }
    }
}

/// Messages sent from worker tasks to the UI thread.
pub enum AppEvent {
    FormatsFetched(Result<FetchedVideo, AppError>),
    /// Preview for the fetch numbered `generation`
    Thumbnail { generation: u64, image: ColorImage },
    Progress(DownloadProgress),
    /// Final file path when yt-dlp printed one
    DownloadFinished(Result<Option<PathBuf>, AppError>),
}

/// Decimal units, one decimal place (e.g. `12.3 MB`).
pub fn human_size(bytes: u64) -> String {
    let options = FormatSizeOptions::from(DECIMAL).decimal_places(1);
    format_size(bytes, options)
}
