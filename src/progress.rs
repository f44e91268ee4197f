use crate::model::DownloadProgress;

/// Prefix of the lines produced by [`PROGRESS_TEMPLATE`].
pub const PROGRESS_PREFIX: &str = "progress:";

/// yt-dlp `--progress-template` value: downloaded/total/estimate in bytes.
pub const PROGRESS_TEMPLATE: &str = "download:progress:%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.total_bytes_estimate)s";

/// Parses one output line. yt-dlp writes `NA` for unknown fields and may
/// report the estimate as a float.
pub fn parse_progress_from_line(line: &str) -> Option<DownloadProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split('/');
    let downloaded = parse_bytes(fields.next()?)?;
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(DownloadProgress {
        downloaded,
        total: total.filter(|t| *t > 0).or(estimate),
    })
}

fn parse_bytes(field: &str) -> Option<u64> {
    let value = field.trim().parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_total() {
        let p = parse_progress_from_line("progress:512/2048/NA").unwrap();
        assert_eq!(p.downloaded, 512);
        assert_eq!(p.total, Some(2048));
        assert!((p.percent() - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_parse_falls_back_to_estimate() {
        let p = parse_progress_from_line("progress:100/NA/400.7").unwrap();
        assert_eq!(p.total, Some(400));
    }

    #[test]
    fn test_parse_unknown_total() {
        let p = parse_progress_from_line("  progress:100/NA/NA\n").unwrap();
        assert_eq!(p.total, None);
        assert_eq!(p.percent(), 0.0);
    }

    #[test]
    fn test_ignores_other_lines() {
        assert!(parse_progress_from_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_from_line("progress:NA/100/NA").is_none());
        assert!(parse_progress_from_line("").is_none());
    }
}
