use thiserror::Error;

use crate::model::TaskKind;

/// Errors surfaced to the user as a modal dialog.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Please enter a video URL")]
    MissingUrl,
    #[error("No formats available. Please fetch formats first.")]
    NoFormatsFetched,
    #[error("No format selected. Please choose a resolution first.")]
    MissingFormat,
    #[error("Please select a download folder")]
    MissingOutputDir,
    #[error("No suitable MP4 formats found!")]
    NoSuitableFormats,
    #[error("yt-dlp not found. Install it, set TUBE_TO_MP4_YTDLP, or place it in assets/")]
    ExtractorNotFound,
    #[error("yt-dlp failed: {0}")]
    Extractor(String),
    #[error("Could not read yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("A {0} is already running")]
    Busy(TaskKind),
}
