pub use cutlist_av::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Replace an existing destination instead of failing
    #[serde(default)]
    pub overwrite: bool,

    /// Bitrate for lossy destinations (ffmpeg `-b:a` syntax)
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Tool used to place fragments and mix tracks
    #[serde(default)]
    pub backend: BackendKind,

    /// Override of the backend's per-invocation input ceiling
    #[serde(default)]
    pub max_inputs: Option<usize>,
}

pub const DEFAULT_BITRATE: &str = "128k";

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            bitrate: default_bitrate(),
            backend: BackendKind::default(),
            max_inputs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub ecasound_path: Option<PathBuf>,

    /// Seconds before a hung tool invocation is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            ecasound_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}
