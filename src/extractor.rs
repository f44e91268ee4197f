//! Locating the yt-dlp executable.

use std::{fs::File, io::Write, path::{Path, PathBuf}};

use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;

use crate::error::AppError;

/// Optional yt-dlp binary bundled at build time.
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

static EXTRACTOR: OnceCell<PathBuf> = OnceCell::new();

fn binary_name() -> &'static str {
    if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }
}

/// Resolves yt-dlp once per process: override, embedded copy, then `PATH`.
pub fn locate(override_path: Option<&Path>) -> Result<PathBuf, AppError> {
    EXTRACTOR
        .get_or_try_init(|| {
            let path = find(override_path)?;
            log::info!("Using yt-dlp at {}", path.display());
            Ok(path)
        })
        .cloned()
}

fn find(override_path: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        log::warn!("Configured yt-dlp {} does not exist, searching elsewhere", path.display());
    }

    if let Some(path) = unpack_embedded()? {
        return Ok(path);
    }

    which::which(binary_name()).map_err(|_| AppError::ExtractorNotFound)
}

/// Writes the embedded binary to the user's cache dir, if one was bundled.
fn unpack_embedded() -> Result<Option<PathBuf>, AppError> {
    let bin = binary_name();
    let Some(data) = Asset::get(bin) else {
        return Ok(None);
    };
    let Some(cache) = dirs::cache_dir() else {
        log::warn!("No cache directory for the bundled yt-dlp, searching PATH");
        return Ok(None);
    };

    let dir = cache.join(env!("CARGO_PKG_NAME"));
    let file_name = format!("{}-{bin}", env!("CARGO_PKG_VERSION"));
    Ok(Some(unpack_to(&dir, &file_name, &data.data)?))
}

/// Installs `data` as `dir/file_name`, rewriting it when the size differs.
/// The write goes to a sibling file first and is renamed into place.
fn unpack_to(dir: &Path, file_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    let target = dir.join(file_name);
    if let Ok(meta) = std::fs::metadata(&target) {
        if meta.is_file() && meta.len() == data.len() as u64 {
            return Ok(target);
        }
    }

    std::fs::create_dir_all(dir)?;
    let partial = dir.join(format!("{file_name}.{}.part", std::process::id()));
    {
        let mut f = File::create(&partial)?;
        f.write_all(data)?;
        f.sync_all()?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))?;
    }
    std::fs::rename(&partial, &target)?;
    log::info!("Unpacked bundled yt-dlp to {}", target.display());
    Ok(target)
}

/// Picks the most useful message from yt-dlp's stderr.
pub fn summarize_stderr(lines: &[String], code: Option<i32>) -> String {
    if let Some(err) = lines.iter().rev().find_map(|l| l.trim().strip_prefix("ERROR:")) {
        return err.trim().to_string();
    }
    if let Some(last) = lines.iter().rev().map(|l| l.trim()).find(|l| !l.is_empty()) {
        return last.to_string();
    }
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summary_prefers_error_line() {
        let stderr = lines(&[
            "WARNING: something odd",
            "ERROR: [generic] Unsupported URL: https://example.com",
            "",
        ]);
        assert_eq!(
            summarize_stderr(&stderr, Some(1)),
            "[generic] Unsupported URL: https://example.com"
        );
    }

    #[test]
    fn test_summary_falls_back_to_last_line() {
        let stderr = lines(&["first", "second", "  "]);
        assert_eq!(summarize_stderr(&stderr, Some(2)), "second");
    }

    #[test]
    fn test_summary_without_output() {
        assert_eq!(summarize_stderr(&[], Some(2)), "exited with status 2");
        assert_eq!(summarize_stderr(&[], None), "terminated by signal");
    }

    #[test]
    fn test_missing_override_is_skipped() {
        let bogus = Path::new("/definitely/not/here/yt-dlp");
        if let Ok(path) = find(Some(bogus)) {
            assert_ne!(path, bogus);
        }
    }

    #[test]
    fn test_unpack_writes_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = unpack_to(dir.path(), "0.1.0-yt-dlp", b"#!/bin/sh\n").unwrap();
        assert_eq!(target, dir.path().join("0.1.0-yt-dlp"));
        assert_eq!(std::fs::read(&target).unwrap(), b"#!/bin/sh\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_unpack_replaces_truncated_copy() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("yt-dlp");
        std::fs::write(&target, b"half").unwrap();

        unpack_to(dir.path(), "yt-dlp", b"complete binary").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"complete binary");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_unpack_keeps_matching_copy() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = unpack_to(dir.path(), "yt-dlp", b"same").unwrap();
        let modified = std::fs::metadata(&first).unwrap().modified().unwrap();
        let second = unpack_to(dir.path(), "yt-dlp", b"same").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::metadata(&second).unwrap().modified().unwrap(), modified);
    }
}
