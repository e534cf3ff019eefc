use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for fetch-webpage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Downloader behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloaderConfig {
    /// Maximum number of downloads in flight at once; unbounded when absent
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Whole-request timeout in seconds; the client default when absent
    #[serde(default, rename = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,
}

impl DownloaderConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the document and its asset directory are written under
    #[serde(default = "default_root_dir", rename = "root-dir")]
    pub root_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

impl OutputConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root_dir)
    }
}

fn default_root_dir() -> String {
    ".".to_string()
}
