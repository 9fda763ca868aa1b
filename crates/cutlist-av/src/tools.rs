//! Locating the external tools and reporting which backends they enable.

use crate::backend::BackendKind;
use crate::{Error, Result, ToolCommand};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// An external program cutlist drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    Ecasound,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Ffmpeg, Tool::Ffprobe, Tool::Ecasound];

    /// Executable name looked up on `PATH`.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::Ecasound => "ecasound",
        }
    }

    fn version_arg(self) -> &'static str {
        match self {
            Tool::Ffmpeg | Tool::Ffprobe => "-version",
            Tool::Ecasound => "--version",
        }
    }

    /// Backends that cannot render without this tool.
    pub fn required_by(self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|backend| backend.required_tools().contains(&self))
            .collect()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a tool was found and what it reports as its version.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub tool: Tool,
    pub path: Option<PathBuf>,
    /// First line of the tool's version output.
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn is_available(&self) -> bool {
        self.path.is_some()
    }
}

/// Look `tool` up on `PATH` and ask it for its version.
///
/// # Example
///
/// ```no_run
/// use cutlist_av::{check_tool, Tool};
///
/// let info = check_tool(Tool::Ecasound);
/// if info.is_available() {
///     println!("ecasound version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(tool: Tool) -> ToolInfo {
    let path = which::which(tool.name()).ok();
    let version = path.as_deref().and_then(|path| version_of(tool, path));
    ToolInfo {
        tool,
        path,
        version,
    }
}

fn version_of(tool: Tool, path: &Path) -> Option<String> {
    let mut cmd = ToolCommand::new(path);
    cmd.arg(tool.version_arg()).timeout(VERSION_TIMEOUT);
    match cmd.execute() {
        Ok(output) => output.stdout.lines().next().map(str::to_string),
        Err(e) => {
            tracing::debug!("{} did not report a version: {}", tool, e);
            None
        }
    }
}

/// Check every tool cutlist can drive.
pub fn check_tools() -> Vec<ToolInfo> {
    Tool::ALL.into_iter().map(check_tool).collect()
}

/// Backends whose required tools are all present in `tools`.
pub fn available_backends(tools: &[ToolInfo]) -> Vec<BackendKind> {
    BackendKind::ALL
        .into_iter()
        .filter(|backend| {
            backend
                .required_tools()
                .iter()
                .all(|needed| tools.iter().any(|t| t.tool == *needed && t.is_available()))
        })
        .collect()
}

/// Resolve the executable for `tool`.
///
/// A configured path must exist; it is never silently replaced by whatever is
/// on `PATH`.
///
/// # Errors
///
/// - [`Error::ToolPathMissing`] if `configured` is given but is not a file.
/// - [`Error::ToolNotFound`] if nothing is configured and `PATH` has no match.
pub fn locate(tool: Tool, configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::ToolPathMissing {
            tool: tool.name().to_string(),
            path: path.to_path_buf(),
        }),
        None => which::which(tool.name()).map_err(|_| Error::tool_not_found(tool.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn info(tool: Tool, available: bool) -> ToolInfo {
        ToolInfo {
            tool,
            path: available.then(|| PathBuf::from(format!("/usr/bin/{tool}"))),
            version: None,
        }
    }

    #[test]
    fn test_tool_names() {
        let names: Vec<&str> = Tool::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["ffmpeg", "ffprobe", "ecasound"]);
        assert_eq!(Tool::Ecasound.to_string(), "ecasound");
    }

    #[test]
    fn test_required_by() {
        assert_eq!(Tool::Ffmpeg.required_by(), BackendKind::ALL.to_vec());
        assert_eq!(Tool::Ffprobe.required_by(), BackendKind::ALL.to_vec());
        assert_eq!(Tool::Ecasound.required_by(), vec![BackendKind::Ecasound]);
    }

    #[test]
    fn test_available_backends() {
        let all = [
            info(Tool::Ffmpeg, true),
            info(Tool::Ffprobe, true),
            info(Tool::Ecasound, true),
        ];
        assert_eq!(available_backends(&all), BackendKind::ALL.to_vec());

        let no_ecasound = [
            info(Tool::Ffmpeg, true),
            info(Tool::Ffprobe, true),
            info(Tool::Ecasound, false),
        ];
        assert_eq!(available_backends(&no_ecasound), vec![BackendKind::Ffmpeg]);

        let no_ffprobe = [
            info(Tool::Ffmpeg, true),
            info(Tool::Ffprobe, false),
            info(Tool::Ecasound, true),
        ];
        assert!(available_backends(&no_ffprobe).is_empty());
    }

    #[test]
    fn test_configured_path_wins() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = locate(Tool::Ecasound, Some(tmp.path())).unwrap();
        assert_eq!(path, tmp.path());
    }

    #[test]
    fn test_missing_configured_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ffmpeg");
        assert_matches!(
            locate(Tool::Ffmpeg, Some(&missing)),
            Err(Error::ToolPathMissing { ref tool, ref path }) if tool == "ffmpeg" && *path == missing
        );
    }

    #[test]
    fn test_configured_directory_is_not_a_tool() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            locate(Tool::Ffprobe, Some(dir.path())),
            Err(Error::ToolPathMissing { .. })
        );
    }
}
