//! FFprobe-based duration probing.

use crate::{Error, Result, ToolCommand};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the duration of an audio file, in seconds, using ffprobe.
pub fn probe_duration(ffprobe: &Path, path: &Path, timeout: Duration) -> Result<f64> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = ToolCommand::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path.to_string_lossy())
        .timeout(timeout)
        .execute()?;

    parse_duration(&output.stdout)
}

fn parse_duration(json: &str) -> Result<f64> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let raw = output
        .format
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", "no duration in format section"))?;

    let seconds = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::parse_error("ffprobe", format!("bad duration {raw:?}: {e}")))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("duration must be positive, got {seconds}"),
        ));
    }

    Ok(seconds)
}
