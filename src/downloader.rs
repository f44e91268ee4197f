use std::{path::{Path, PathBuf}, process::Stdio};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};

use crate::error::AppError;
use crate::extractor::summarize_stderr;
use crate::model::{DownloadProgress, DownloadRequest};
use crate::progress::{PROGRESS_TEMPLATE, parse_progress_from_line};

/// Lines of stderr kept for the error message.
const STDERR_TAIL: usize = 20;

/// Command line for downloading the chosen video stream plus the best audio,
/// merged into `<output_dir>/<title>.mp4`.
pub fn download_args(request: &DownloadRequest) -> Vec<String> {
    let id = &request.format_id;
    let template = request.output_dir.join("%(title)s.%(ext)s");

    vec![
        "-f".to_owned(),
        format!("{id}+bestaudio[ext=m4a]/{id}+bestaudio/{id}"),
        "--merge-output-format".to_owned(),
        "mp4".to_owned(),
        "--no-playlist".to_owned(),
        "--newline".to_owned(),
        "--progress".to_owned(),
        "--progress-template".to_owned(),
        PROGRESS_TEMPLATE.to_owned(),
        "--print".to_owned(),
        "after_move:filepath".to_owned(),
        "-o".to_owned(),
        template.to_string_lossy().into_owned(),
        "--".to_owned(),
        request.url.clone(),
    ]
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Runs yt-dlp to completion, calling `on_progress` for every progress line.
/// Returns the saved path when yt-dlp reported it. Dropping the future kills
/// the child.
pub async fn spawn_download(
    ytdlp: &Path,
    request: DownloadRequest,
    mut on_progress: impl FnMut(DownloadProgress) + Send,
) -> Result<Option<PathBuf>, AppError> {
    log::info!(
        "Downloading {} at {} into {}",
        request.url,
        request.resolution,
        request.output_dir.display()
    );

    let mut child = Command::new(ytdlp)
        .args(download_args(&request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().ok_or(AppError::Extractor("stdout unavailable".into()))?;
    let stderr = child.stderr.take().ok_or(AppError::Extractor("stderr unavailable".into()))?;
    // Split on raw bytes: yt-dlp writes in the console code page on Windows,
    // which is not always valid UTF-8.
    let mut out_lines = BufReader::new(stdout).split(b'\n');
    let mut err_lines = BufReader::new(stderr).split(b'\n');
    let (mut out_done, mut err_done) = (false, false);

    let mut saved_path = None;
    let mut stderr_tail: Vec<String> = Vec::new();

    loop {
        tokio::select! {
            segment = out_lines.next_segment(), if !out_done => match segment? {
                Some(raw) => {
                    let line = decode_line(&raw);
                    log::debug!("yt-dlp> {line}");
                    if let Some(p) = parse_progress_from_line(&line) {
                        on_progress(p);
                    } else if !line.is_empty() {
                        saved_path = Some(PathBuf::from(line));
                    }
                }
                None => out_done = true,
            },
            segment = err_lines.next_segment(), if !err_done => match segment? {
                Some(raw) => {
                    let line = decode_line(&raw);
                    log::debug!("yt-dlp! {line}");
                    if let Some(p) = parse_progress_from_line(&line) {
                        on_progress(p);
                    } else {
                        if stderr_tail.len() == STDERR_TAIL {
                            stderr_tail.remove(0);
                        }
                        stderr_tail.push(line);
                    }
                }
                None => err_done = true,
            },
            else => break,
        }
    }

    let status = child.wait().await?;
    if !status.success() {
        let reason = summarize_stderr(&stderr_tail, status.code());
        log::warn!("Download of {} failed: {reason}", request.url);
        return Err(AppError::Extractor(reason));
    }

    log::info!("Download of {} finished", request.url);
    Ok(saved_path)
}
