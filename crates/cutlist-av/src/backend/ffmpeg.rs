//! FFmpeg backend.

use super::{seconds, Mixer, Placement, Transcoder};
use crate::workspace::is_intermediate;
use crate::tools::{self, Tool};
use crate::{probe, Error, Result, ToolCommand, DEFAULT_TIMEOUT};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fragment inputs per ffmpeg invocation.
///
/// ffmpeg has no fixed input limit, but every input holds an open file and a
/// decoder and lengthens the command line. 64 (plus the running timeline)
/// stays far below the usual 1024 descriptor limit and `ARG_MAX`.
pub const FFMPEG_MAX_INPUTS: usize = 64;

const SAMPLE_RATE: u32 = 44_100;

/// Placement inputs are brought to one layout so `concat` accepts them.
const NORMALIZE: &str = "aformat=sample_fmts=s16:sample_rates=44100:channel_layouts=stereo";

/// ffmpeg/ffprobe driver.
///
/// Placement selects each range with input-side `-ss`/`-t`, reverses it with
/// `areverse` when flagged, and concatenates the batch after the existing
/// timeline, so offsets are realised by order.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Locate ffmpeg and ffprobe: configured paths if given, otherwise `PATH`.
    pub fn locate(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        Ok(Self::new(
            tools::locate(Tool::Ffmpeg, ffmpeg)?,
            tools::locate(Tool::Ffprobe, ffprobe)?,
        ))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.ffmpeg);
        cmd.args(["-nostdin", "-hide_banner", "-loglevel", "error", "-y"])
            .timeout(self.timeout);
        cmd
    }

    fn convert_command(&self, input: &Path, output: &Path, bitrate: Option<&str>) -> ToolCommand {
        let mut cmd = self.command();
        cmd.arg("-i").arg(input.to_string_lossy());
        if let Some(bitrate) = bitrate.filter(|_| !is_intermediate(output)) {
            cmd.arg("-b:a").arg(bitrate);
        }
        cmd.arg(output.to_string_lossy());
        cmd
    }

    /// Build the batch invocation writing to `target`. When `previous` is set
    /// it becomes input 0 and the batch is appended after it.
    fn place_command(
        &self,
        placements: &[Placement],
        previous: Option<&Path>,
        target: &Path,
    ) -> ToolCommand {
        let mut cmd = self.command();
        let mut graph = String::new();
        let mut labels = String::new();

        if let Some(previous) = previous {
            cmd.arg("-i").arg(previous.to_string_lossy());
            graph.push_str(&format!("[0:a]{NORMALIZE}[prev];"));
            labels.push_str("[prev]");
        }

        let first_input = usize::from(previous.is_some());
        for (i, placement) in placements.iter().enumerate() {
            cmd.arg("-ss")
                .arg(seconds(placement.start))
                .arg("-t")
                .arg(seconds(placement.duration))
                .arg("-i")
                .arg(placement.input.to_string_lossy());

            let reverse = if placement.reversed { ",areverse" } else { "" };
            graph.push_str(&format!(
                "[{}:a]{NORMALIZE},asetpts=PTS-STARTPTS{reverse}[p{i}];",
                first_input + i
            ));
            labels.push_str(&format!("[p{i}]"));
        }

        let streams = placements.len() + first_input;
        graph.push_str(&format!("{labels}concat=n={streams}:v=0:a=1[out]"));

        cmd.arg("-filter_complex")
            .arg(graph)
            .args(["-map", "[out]"])
            .arg(target.to_string_lossy());
        cmd
    }

    fn mix_command(&self, inputs: &[PathBuf], output: &Path) -> ToolCommand {
        let mut cmd = self.command();
        let mut labels = String::new();
        for (i, input) in inputs.iter().enumerate() {
            cmd.arg("-i").arg(input.to_string_lossy());
            labels.push_str(&format!("[{i}:a]"));
        }
        cmd.arg("-filter_complex")
            .arg(format!(
                "{labels}amix=inputs={}:duration=longest:normalize=0[out]",
                inputs.len()
            ))
            .args(["-map", "[out]"])
            .arg(output.to_string_lossy());
        cmd
    }
}

impl Transcoder for Ffmpeg {
    fn convert(&self, input: &Path, output: &Path, bitrate: Option<&str>) -> Result<()> {
        self.convert_command(input, output, bitrate).execute()?;
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> Result<f64> {
        probe::probe_duration(&self.ffprobe, path, self.timeout)
    }

    fn generate_silence(&self, output: &Path, seconds_len: f64) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["-f", "lavfi", "-i"])
            .arg(format!("anullsrc=r={SAMPLE_RATE}:cl=stereo"))
            .arg("-t")
            .arg(seconds(seconds_len))
            .arg(output.to_string_lossy());
        cmd.execute()?;
        Ok(())
    }
}

impl Mixer for Ffmpeg {
    fn max_inputs(&self) -> usize {
        FFMPEG_MAX_INPUTS
    }

    fn place(&self, placements: &[Placement], timeline: &Path) -> Result<()> {
        if placements.is_empty() {
            return Ok(());
        }

        for pair in placements.windows(2) {
            if (pair[0].end_offset() - pair[1].offset).abs() > 1e-6 {
                return Err(Error::InvalidInput(format!(
                    "placement {} at {} does not follow placement {} ending at {}",
                    pair[1].index,
                    pair[1].offset,
                    pair[0].index,
                    pair[0].end_offset()
                )));
            }
        }

        if timeline.exists() {
            let next = timeline.with_extension("next.wav");
            self.place_command(placements, Some(timeline), &next)
                .execute()?;
            fs::rename(&next, timeline)?;
        } else {
            self.place_command(placements, None, timeline).execute()?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn ffmpeg() -> Ffmpeg {
        Ffmpeg::new("ffmpeg", "ffprobe")
    }

    fn placement(index: usize, input: &str, start: f64, duration: f64, offset: f64) -> Placement {
        Placement {
            index,
            input: PathBuf::from(input),
            start,
            duration,
            reversed: false,
            offset,
        }
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .map(|i| args[i + 1].as_str())
    }

    #[test]
    fn test_convert_skips_bitrate_for_wav() {
        let args = ffmpeg()
            .convert_command(Path::new("a.mp3"), Path::new("a.wav"), Some("128k"))
            .get_args()
            .to_vec();
        assert!(!args.contains(&"-b:a".to_string()));
        assert_eq!(args.last().unwrap(), "a.wav");

        let args = ffmpeg()
            .convert_command(Path::new("t.wav"), Path::new("out.mp3"), Some("192k"))
            .get_args()
            .to_vec();
        assert_eq!(arg_after(&args, "-b:a"), Some("192k"));
    }

    #[test]
    fn test_first_batch_graph() {
        let mut reversed = placement(1, "b.wav", 0.2, 0.1, 1.0);
        reversed.reversed = true;
        let placements = vec![placement(0, "a.wav", 0.33, 1.0, 0.0), reversed];

        let cmd = ffmpeg().place_command(&placements, None, Path::new("timeline.wav"));
        let args = cmd.get_args();
        let graph = arg_after(args, "-filter_complex").unwrap();

        assert!(graph.contains("[0:a]"));
        assert!(graph.contains("[1:a]"));
        assert!(graph.contains("asetpts=PTS-STARTPTS,areverse[p1]"));
        assert!(!graph.contains("areverse[p0]"));
        assert!(graph.ends_with("[p0][p1]concat=n=2:v=0:a=1[out]"));
        assert_eq!(arg_after(args, "-ss"), Some("0.33"));
        assert_eq!(args.last().unwrap(), "timeline.wav");
    }

    #[test]
    fn test_appending_batch_reads_previous_timeline_first() {
        let placements = vec![placement(80, "a.wav", 5.0, 2.0, 40.0)];
        let cmd = ffmpeg().place_command(
            &placements,
            Some(Path::new("timeline.wav")),
            Path::new("timeline.next.wav"),
        );
        let args = cmd.get_args();

        assert_eq!(arg_after(args, "-i"), Some("timeline.wav"));
        let graph = arg_after(args, "-filter_complex").unwrap();
        assert!(graph.contains("[1:a]"));
        assert!(graph.ends_with("[prev][p0]concat=n=2:v=0:a=1[out]"));
    }

    #[test]
    fn test_place_rejects_gaps() {
        let placements = vec![
            placement(0, "a.wav", 0.0, 1.0, 0.0),
            placement(1, "a.wav", 0.0, 1.0, 2.0),
        ];
        let dir = tempfile::tempdir().unwrap();
        let result = ffmpeg().place(&placements, &dir.path().join("timeline.wav"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_mix_graph() {
        let inputs = vec![PathBuf::from("track_0.wav"), PathBuf::from("track_1.wav")];
        let cmd = ffmpeg().mix_command(&inputs, Path::new("mix.wav"));
        let graph = arg_after(cmd.get_args(), "-filter_complex").unwrap();
        assert_eq!(
            graph,
            "[0:a][1:a]amix=inputs=2:duration=longest:normalize=0[out]"
        );
    }

    #[test]
    fn test_default_ceiling() {
        assert_eq!(ffmpeg().max_inputs(), FFMPEG_MAX_INPUTS);
    }
}
