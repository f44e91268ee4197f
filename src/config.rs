use std::path::PathBuf;

/// Environment variable naming an explicit yt-dlp executable.
pub const YTDLP_ENV: &str = "TUBE_TO_MP4_YTDLP";
/// Environment variable naming the folder the picker opens in.
pub const OUTPUT_DIR_ENV: &str = "TUBE_TO_MP4_OUTPUT_DIR";

/// Startup settings; never written back.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_title: String,
    pub window_size: [f32; 2],
    pub ytdlp_override: Option<PathBuf>,
    pub initial_output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_title: "Video to MP4 Converter".to_string(),
            window_size: [460.0, 440.0],
            ytdlp_override: None,
            initial_output_dir: PathBuf::from("./downloads"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(path) = var(YTDLP_ENV) {
            config.ytdlp_override = Some(PathBuf::from(path));
        }
        if let Some(dir) = var(OUTPUT_DIR_ENV) {
            config.initial_output_dir = PathBuf::from(dir);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_variables() {
        let config = AppConfig::from_lookup(|_| None);
        assert!(config.ytdlp_override.is_none());
        assert_eq!(config.initial_output_dir, PathBuf::from("./downloads"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            YTDLP_ENV => Some("/opt/yt-dlp".to_string()),
            OUTPUT_DIR_ENV => Some("/tmp/videos".to_string()),
            _ => None,
        });
        assert_eq!(config.ytdlp_override, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(config.initial_output_dir, PathBuf::from("/tmp/videos"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = AppConfig::from_lookup(|_| Some("  ".to_string()));
        assert!(config.ytdlp_override.is_none());
    }
}
