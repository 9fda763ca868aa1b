//! Ecasound mixing backend.

use super::{seconds, Mixer, Placement};
use crate::tools::{self, Tool};
use crate::{Error, Result, ToolCommand, DEFAULT_TIMEOUT};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Chains per ecasound invocation before its command line gets unwieldy.
pub const ECASOUND_MAX_INPUTS: usize = 80;

/// ecasound driver.
///
/// Every placement becomes one chain writing into the shared timeline file at
/// its own `-y` offset, so batches extend the same file in place.
#[derive(Debug, Clone)]
pub struct Ecasound {
    ecasound: PathBuf,
    timeout: Duration,
}

impl Ecasound {
    pub fn new(ecasound: impl Into<PathBuf>) -> Self {
        Self {
            ecasound: ecasound.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Locate ecasound: the configured path if given, otherwise `PATH`.
    pub fn locate(ecasound: Option<&Path>) -> Result<Self> {
        Ok(Self::new(tools::locate(Tool::Ecasound, ecasound)?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ecasound);
        cmd.arg("-q").timeout(self.timeout);
        cmd
    }

    fn place_command(&self, placements: &[Placement], timeline: &Path) -> ToolCommand {
        let mut cmd = self.command();
        for placement in placements {
            let reverse = if placement.reversed { "reverse," } else { "" };
            cmd.arg(format!("-a:{}", placement.index))
                .arg(format!(
                    "-i:{reverse}select,{},{},{}",
                    seconds(placement.start),
                    seconds(placement.duration),
                    placement.input.display()
                ))
                .arg(format!("-o:{}", timeline.display()))
                .arg(format!("-y:{}", seconds(placement.offset)));
        }
        cmd
    }

    fn mix_command(&self, inputs: &[PathBuf], output: &Path) -> ToolCommand {
        let mut cmd = self.command();
        for (i, input) in inputs.iter().enumerate() {
            cmd.arg(format!("-a:{}", i + 1))
                .arg(format!("-i:{}", input.display()));
        }
        cmd.arg("-a:all").arg(format!("-o:{}", output.display()));
        cmd
    }
}

impl Mixer for Ecasound {
    fn max_inputs(&self) -> usize {
        ECASOUND_MAX_INPUTS
    }

    fn place(&self, placements: &[Placement], timeline: &Path) -> Result<()> {
        if placements.is_empty() {
            return Ok(());
        }
        self.place_command(placements, timeline).execute()?;
        Ok(())
    }

    fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::InvalidInput("nothing to mix".to_string()));
        }
        self.mix_command(inputs, output).execute()?;
        Ok(())
    }
}
