//! Shared test harness for integration tests.
//!
//! Provides [`FakeBackend`], a [`Transcoder`] and [`Mixer`] that records every
//! call and writes plain-text "audio" files instead of running real tools.
//! A rendered timeline holds one line per placed fragment:
//!
//! ```text
//! index <TAB> start <TAB> duration <TAB> reversed <TAB> offset <TAB> input
//! ```
//!
//! Probing a file that was not registered with [`FakeBackend::register`]
//! sums the duration column, so rendered output can be reopened like real
//! audio.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cutlist::Renderer;
use cutlist_av::{Error, Mixer, Placement, Result, Transcoder};

/// A recorded backend invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Convert {
        input: PathBuf,
        output: PathBuf,
        bitrate: Option<String>,
    },
    Probe(PathBuf),
    Silence {
        output: PathBuf,
        seconds: f64,
    },
    Place {
        timeline: PathBuf,
        placements: Vec<Placement>,
    },
    Mix {
        inputs: Vec<PathBuf>,
        output: PathBuf,
    },
}

/// Kind of backend call a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Convert,
    Duration,
    Place,
    Mix,
}

impl Call {
    fn step(&self) -> Option<Step> {
        match self {
            Call::Convert { .. } => Some(Step::Convert),
            Call::Probe(_) => Some(Step::Duration),
            Call::Place { .. } => Some(Step::Place),
            Call::Mix { .. } => Some(Step::Mix),
            Call::Silence { .. } => None,
        }
    }

    /// File this call writes, if any.
    fn written(&self) -> Option<&Path> {
        match self {
            Call::Convert { output, .. }
            | Call::Silence { output, .. }
            | Call::Mix { output, .. } => Some(output),
            Call::Place { timeline, .. } => Some(timeline),
            Call::Probe(_) => None,
        }
    }
}

pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    durations: Mutex<HashMap<PathBuf, f64>>,
    max_inputs: usize,
    fail_on: Option<(Step, usize)>,
}

impl FakeBackend {
    pub fn new(max_inputs: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            durations: Mutex::new(HashMap::new()),
            max_inputs,
            fail_on: None,
        }
    }

    /// Make the `n`th call (1-based) of kind `step` exit non-zero.
    pub fn failing_on(mut self, step: Step, n: usize) -> Self {
        self.fail_on = Some((step, n));
        self
    }

    /// Give `path` a fixed probed duration.
    pub fn register(&self, path: impl Into<PathBuf>, duration: f64) {
        self.durations
            .lock()
            .unwrap()
            .insert(path.into(), duration);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn converts(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Convert { .. }))
            .collect()
    }

    pub fn placements(&self) -> Vec<Vec<Placement>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Place { placements, .. } => Some(placements),
                _ => None,
            })
            .collect()
    }

    pub fn timelines(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Place { timeline, .. } => Some(timeline),
                _ => None,
            })
            .collect()
    }

    pub fn mixes(&self) -> Vec<Vec<PathBuf>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Mix { inputs, .. } => Some(inputs),
                _ => None,
            })
            .collect()
    }

    /// Directories the backend wrote into, i.e. the render workspaces.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .calls()
            .iter()
            .filter_map(|c| c.written()?.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }

    /// Record `call`, failing it if it is the injected failure.
    fn record(&self, call: Call) -> Result<()> {
        let step = call.step();
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);

        let Some((fail_step, n)) = self.fail_on else {
            return Ok(());
        };
        if step != Some(fail_step) {
            return Ok(());
        }
        let seen = calls.iter().filter(|c| c.step() == step).count();
        if seen == n {
            return Err(Error::command_failed(
                format!("fake {fail_step:?}"),
                "exit status: 1",
                "injected failure",
            ));
        }
        Ok(())
    }
}

/// Sum the duration column of a fake timeline file.
pub fn timeline_duration(content: &str) -> Option<f64> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').nth(2)?.parse::<f64>().ok())
        .sum()
}

impl Transcoder for FakeBackend {
    fn convert(&self, input: &Path, output: &Path, bitrate: Option<&str>) -> Result<()> {
        self.record(Call::Convert {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            bitrate: bitrate.map(str::to_string),
        })?;
        if !input.exists() {
            return Err(Error::file_not_found(input));
        }
        fs::copy(input, output)?;
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> Result<f64> {
        self.record(Call::Probe(path.to_path_buf()))?;
        if let Some(duration) = self.durations.lock().unwrap().get(path) {
            return Ok(*duration);
        }
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        let content = fs::read_to_string(path)?;
        timeline_duration(&content)
            .ok_or_else(|| Error::parse_error("fake", format!("not a timeline: {}", path.display())))
    }

    fn generate_silence(&self, output: &Path, seconds: f64) -> Result<()> {
        self.record(Call::Silence {
            output: output.to_path_buf(),
            seconds,
        })?;
        fs::write(output, format!("0\t0\t{seconds}\tfalse\t0\tsilence\n"))?;
        Ok(())
    }
}

impl Mixer for FakeBackend {
    fn max_inputs(&self) -> usize {
        self.max_inputs
    }

    fn place(&self, placements: &[Placement], timeline: &Path) -> Result<()> {
        self.record(Call::Place {
            timeline: timeline.to_path_buf(),
            placements: placements.to_vec(),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(timeline)?;
        for p in placements {
            writeln!(
                file,
                "{}\t{}\t{}\t{}\t{}\t{}",
                p.index,
                p.start,
                p.duration,
                p.reversed,
                p.offset,
                p.input.display()
            )?;
        }
        Ok(())
    }

    fn mix(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        self.record(Call::Mix {
            inputs: inputs.to_vec(),
            output: output.to_path_buf(),
        })?;

        let mut longest: Option<(f64, String)> = None;
        for input in inputs {
            let content = fs::read_to_string(input)?;
            let duration = timeline_duration(&content).unwrap_or_default();
            if longest.as_ref().map_or(true, |(d, _)| duration > *d) {
                longest = Some((duration, content));
            }
        }
        let (_, content) =
            longest.ok_or_else(|| Error::InvalidInput("nothing to mix".to_string()))?;
        fs::write(output, content)?;
        Ok(())
    }
}

/// A renderer driving `backend` for both conversion and placement.
pub fn renderer(backend: &Arc<FakeBackend>) -> Renderer {
    Renderer::new(backend.clone(), backend.clone())
}

/// Create a source file with placeholder content.
pub fn source_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("source {name}\n")).unwrap();
    path
}
