//! Integration tests for the ffmpeg backend
//!
//! These run real ffmpeg/ffprobe invocations and skip themselves when the
//! tools are not installed.

use cutlist_av::{check_tool, Ffmpeg, Mixer, Placement, Tool, Transcoder, Workspace};
use std::path::Path;

fn ffmpeg() -> Option<Ffmpeg> {
    if !check_tool(Tool::Ffmpeg).is_available() || !check_tool(Tool::Ffprobe).is_available() {
        eprintln!("Skipping: ffmpeg/ffprobe not installed");
        return None;
    }
    Ffmpeg::locate(None, None).ok()
}

fn placement(index: usize, input: &Path, start: f64, duration: f64, offset: f64) -> Placement {
    Placement {
        index,
        input: input.to_path_buf(),
        start,
        duration,
        reversed: index % 2 == 1,
        offset,
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.05,
        "expected ~{expected}s, got {actual}s"
    );
}

#[test]
fn test_silence_probe_and_convert() {
    let Some(ffmpeg) = ffmpeg() else { return };
    let ws = Workspace::new().unwrap();

    let source = ws.temp_file("source.wav");
    ffmpeg.generate_silence(&source, 2.0).unwrap();
    assert_close(ffmpeg.probe_duration(&source).unwrap(), 2.0);

    let encoded = ws.temp_file("source.mp3");
    ffmpeg.convert(&source, &encoded, Some("64k")).unwrap();
    assert!(encoded.exists());
}

#[test]
fn test_place_appends_batches() {
    let Some(ffmpeg) = ffmpeg() else { return };
    let ws = Workspace::new().unwrap();

    let source = ws.temp_file("source.wav");
    ffmpeg.generate_silence(&source, 3.0).unwrap();
    let timeline = ws.temp_file("timeline.wav");

    let first = [
        placement(0, &source, 0.0, 1.0, 0.0),
        placement(1, &source, 1.5, 0.5, 1.0),
    ];
    ffmpeg.place(&first, &timeline).unwrap();
    assert_close(ffmpeg.probe_duration(&timeline).unwrap(), 1.5);

    let second = [placement(2, &source, 2.0, 1.0, 1.5)];
    ffmpeg.place(&second, &timeline).unwrap();
    assert_close(ffmpeg.probe_duration(&timeline).unwrap(), 2.5);
}

#[test]
fn test_mix_takes_longest_input() {
    let Some(ffmpeg) = ffmpeg() else { return };
    let ws = Workspace::new().unwrap();

    let short = ws.temp_file("short.wav");
    let long = ws.temp_file("long.wav");
    ffmpeg.generate_silence(&short, 1.0).unwrap();
    ffmpeg.generate_silence(&long, 2.0).unwrap();

    let mixed = ws.temp_file("mix.wav");
    ffmpeg.mix(&[short, long], &mixed).unwrap();
    assert_close(ffmpeg.probe_duration(&mixed).unwrap(), 2.0);
}

#[test]
fn test_missing_input_fails_with_command_error() {
    let Some(ffmpeg) = ffmpeg() else { return };
    let ws = Workspace::new().unwrap();

    let err = ffmpeg
        .convert(&ws.temp_file("missing.mp3"), &ws.temp_file("out.wav"), None)
        .unwrap_err();
    assert!(matches!(err, cutlist_av::Error::CommandFailed { .. }));
}
