//! Querying yt-dlp for the resolutions a video offers.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::AppError;
use crate::extractor::summarize_stderr;
use crate::model::{FetchedVideo, FormatEntry};

/// Subset of yt-dlp's `-J` document we care about.
#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub filesize: Option<f64>,
}

pub async fn fetch_formats(ytdlp: &Path, url: &str) -> Result<FetchedVideo, AppError> {
    log::info!("Fetching formats for {url}");
    let output = Command::new(ytdlp)
        .args(["-J", "--no-playlist", "--no-warnings", "--"])
        .arg(url)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        let stderr: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(str::to_owned)
            .collect();
        return Err(AppError::Extractor(summarize_stderr(&stderr, output.status.code())));
    }

    let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
    let video = into_fetched(info)?;
    log::info!("Found {} resolutions for \"{}\"", video.formats.len(), video.title);
    Ok(video)
}

/// Converts the metadata document, failing when no MP4 video is offered.
pub fn into_fetched(info: VideoInfo) -> Result<FetchedVideo, AppError> {
    let formats = collect_formats(info.formats);
    if formats.is_empty() {
        return Err(AppError::NoSuitableFormats);
    }
    Ok(FetchedVideo {
        title: info.title.unwrap_or_else(|| "Untitled".to_string()),
        thumbnail: info.thumbnail.filter(|t| !t.is_empty()),
        formats,
    })
}

/// Keeps MP4 streams with a known height, one per resolution (the last one
/// listed wins), highest first.
pub fn collect_formats(raw: Vec<RawFormat>) -> Vec<FormatEntry> {
    let mut by_height: HashMap<u32, FormatEntry> = HashMap::new();
    for format in raw {
        let Some(height) = format.height else { continue };
        if format.ext.as_deref() != Some("mp4") {
            continue;
        }
        by_height.insert(
            height,
            FormatEntry {
                height,
                format_id: format.format_id,
                filesize: format.filesize.filter(|s| *s >= 0.0).map(|s| s as u64),
            },
        );
    }

    let mut formats: Vec<FormatEntry> = by_height.into_values().collect();
    formats.sort_by(|a, b| b.height.cmp(&a.height));
    formats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> VideoInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_duplicate_resolutions_collapse_last_wins() {
        let info = parse(json!({
            "title": "Clip",
            "formats": [
                {"format_id": "160", "ext": "mp4", "height": 144, "filesize": 1000},
                {"format_id": "136", "ext": "mp4", "height": 720, "filesize": 5000},
                {"format_id": "22", "ext": "mp4", "height": 720, "filesize": null},
                {"format_id": "137", "ext": "mp4", "height": 1080, "filesize": 9000.0}
            ]
        }));
        let video = into_fetched(info).unwrap();
        let resolutions: Vec<String> = video.formats.iter().map(|f| f.resolution()).collect();
        assert_eq!(resolutions, ["1080p", "720p", "144p"]);
        assert_eq!(video.formats[1].format_id, "22");
        assert_eq!(video.formats[1].filesize, None);
        assert_eq!(video.formats[0].filesize, Some(9000));
    }

    #[test]
    fn test_filters_non_mp4_and_audio() {
        let info = parse(json!({
            "title": "Clip",
            "formats": [
                {"format_id": "140", "ext": "m4a", "height": null},
                {"format_id": "251", "ext": "webm"},
                {"format_id": "248", "ext": "webm", "height": 1080},
                {"format_id": "sb0", "ext": "mhtml", "height": 90},
                {"format_id": "18", "ext": "mp4", "height": 360}
            ]
        }));
        let formats = collect_formats(info.formats);
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].format_id, "18");
    }

    #[test]
    fn test_one_entry_per_distinct_resolution() {
        let heights = [240u32, 480, 240, 1440, 720, 480, 2160, 720];
        let raw = heights
            .iter()
            .enumerate()
            .map(|(i, h)| RawFormat {
                format_id: i.to_string(),
                ext: Some("mp4".to_string()),
                height: Some(*h),
                filesize: None,
            })
            .collect();
        let formats = collect_formats(raw);
        let got: Vec<u32> = formats.iter().map(|f| f.height).collect();
        assert_eq!(got, [2160, 1440, 720, 480, 240]);
    }

    #[test]
    fn test_no_mp4_formats_is_an_error() {
        let info = parse(json!({
            "title": "Audio only",
            "formats": [{"format_id": "251", "ext": "webm", "height": null}]
        }));
        assert!(matches!(into_fetched(info), Err(AppError::NoSuitableFormats)));

        let empty = parse(json!({"title": "Nothing"}));
        assert!(matches!(into_fetched(empty), Err(AppError::NoSuitableFormats)));
    }

    #[test]
    fn test_title_and_thumbnail() {
        let info = parse(json!({
            "formats": [{"format_id": "18", "ext": "mp4", "height": 360}],
            "thumbnail": "",
            "duration": 12.5,
            "uploader": "someone"
        }));
        let video = into_fetched(info).unwrap();
        assert_eq!(video.title, "Untitled");
        assert!(video.thumbnail.is_none());
    }
}
