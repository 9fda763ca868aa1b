mod cli;

use cutlist::config::{self, BackendKind};
use cutlist::{CutSheet, RenderOptions, Renderer, TrackMixer};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cutlist=debug,cutlist_av=debug".to_string()
        } else {
            "cutlist=info,cutlist_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            sheet,
            output,
            overwrite,
            bitrate,
            dry_run,
        } => render_sheet(
            &sheet,
            output,
            overwrite,
            bitrate,
            dry_run,
            cli.config.as_deref(),
        ),
        Commands::Cut {
            input,
            start,
            length,
            reverse,
            repeat,
            output,
            overwrite,
        } => {
            let cut = CutArgs {
                start,
                length,
                reverse,
                repeat,
            };
            cut_file(&input, &output, &cut, overwrite, cli.config.as_deref())
        }
        Commands::Probe { file, json } => probe_file(&file, json, cli.config.as_deref()),
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cutlist {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn render_sheet(
    sheet_path: &Path,
    output: Option<PathBuf>,
    overwrite: bool,
    bitrate: Option<String>,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let sheet = CutSheet::load(sheet_path)?;

    if sheet.tracks.is_empty() {
        anyhow::bail!("Cut sheet has no tracks: {:?}", sheet_path);
    }

    let destination = output
        .or_else(|| sheet.output.clone())
        .context("No output file: pass --output or set `output` in the cut sheet")?;

    let mut options = RenderOptions::from(&config.render);
    options.overwrite |= overwrite;
    if let Some(bitrate) = bitrate {
        options.bitrate = bitrate;
    }

    let renderer = Renderer::from_config(&config)?;
    let tracks = sheet.build(|path| renderer.probe_duration(path))?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
        return Ok(());
    }

    tracing::info!(
        "Rendering {} track(s) to {}",
        tracks.len(),
        destination.display()
    );

    let rendered = if tracks.len() == 1 {
        renderer.render(&tracks[0], &destination, &options)?
    } else {
        let mut mixer = TrackMixer::new(renderer);
        for track in tracks {
            mixer.add_track(track);
        }
        mixer.render_to_file(&destination, &options)?
    };

    println!(
        "Wrote {} ({:.3}s)",
        destination.display(),
        rendered.duration()
    );
    Ok(())
}

struct CutArgs {
    start: f64,
    length: Option<f64>,
    reverse: bool,
    repeat: usize,
}

fn cut_file(
    input: &Path,
    output: &Path,
    cut: &CutArgs,
    overwrite: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let config = config::load_config_or_default(config_path)?;
    let renderer = Renderer::from_config(&config)?;

    let source = renderer.open(input)?;
    let length = cut
        .length
        .unwrap_or_else(|| (source.duration() - cut.start).max(0.0));

    let mut edit = source
        .slice(cut.start, length)
        .with_context(|| format!("Cannot cut {}s at {}s from {:?}", length, cut.start, input))?;
    if cut.reverse {
        edit = edit.reverse();
    }
    let edit = edit.repeat(cut.repeat);

    let mut options = RenderOptions::from(&config.render);
    options.overwrite |= overwrite;

    let rendered = renderer.render(&edit, output, &options)?;
    println!("Wrote {} ({:.3}s)", output.display(), rendered.duration());
    Ok(())
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let renderer = Renderer::from_config(&config)?;
    let chunk = renderer.open(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chunk)?);
    } else {
        let duration = chunk.duration();
        let secs = duration as u64;
        println!("File: {}", file.display());
        println!(
            "Duration: {:02}:{:02}:{:06.3} ({:.3}s)",
            secs / 3600,
            (secs / 60) % 60,
            duration % 60.0,
            duration
        );
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = cutlist_av::check_tools();

    for info in &tools {
        let status = if info.is_available() { "✓" } else { "✗" };

        print!("{} {}", status, info.tool);

        if let Some(ref version) = info.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = info.path {
            print!(" - {}", path.display());
        }

        let backends: Vec<String> = info
            .tool
            .required_by()
            .iter()
            .map(|b| format!("{:?}", b).to_lowercase())
            .collect();
        print!(" [needed by: {}]", backends.join(", "));

        println!();
    }

    let available = cutlist_av::available_backends(&tools);

    println!();
    if available.is_empty() {
        println!("No backend is usable. Install ffmpeg and ffprobe to render audio.");
    } else {
        for backend in BackendKind::ALL {
            let status = if available.contains(&backend) { "✓" } else { "✗" };
            println!("{} {:?} backend", status, backend);
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Backend: {:?}", config.render.backend);
    println!("  Bitrate: {}", config.render.bitrate);
    println!("  Overwrite: {}", config.render.overwrite);
    match config.render.max_inputs {
        Some(max) => println!("  Max inputs: {}", max),
        None => println!("  Max inputs: backend default"),
    }
    println!("  Tool timeout: {}s", config.tools.timeout_secs);

    Ok(())
}
