use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use simulation_common::RenderConfig;
use simulation_visualizer::{render_animation, RenderStyle, Renderer};
use std::path::PathBuf;
use std::time::Instant;

mod export;

use export::{export_simulation, ExportFormat};

/// Renders `.sim` particle snapshots to one scatter plot per timestep.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one PNG per timestep (and optionally a GIF of all of them)
    Render(RenderArgs),
    /// Convert a `.sim` file to JSON, bincode, MessagePack or CSV
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Input snapshot file (.sim); overrides [input].path from the config
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for the frames; overrides [output].directory (default "vis")
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Optional TOML file with [input], [output], [style] and [execution] sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write an animated GIF of every timestep to this path
    #[arg(long)]
    animation: Option<PathBuf>,

    /// Render frames in parallel
    #[arg(long)]
    parallel: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Input snapshot file (.sim)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,
}

fn main() -> Result<()> {
    // Initialize logger; RUST_LOG overrides the default level
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Render(args) => run_render(args),
        Command::Export(args) => run_export(args),
    }
}

fn run_render(args: RenderArgs) -> Result<()> {
    info!("Starting snapshot renderer...");

    // --- Load Configuration ---
    let config = match &args.config {
        Some(path) => {
            let config = RenderConfig::load(path)?;
            info!("Loaded render configuration from {}", path.display());
            config
        }
        None => RenderConfig::default(),
    };

    let input = args
        .input
        .clone()
        .or_else(|| config.input.path.clone())
        .context("No input file given (use --input or set [input].path in the config)")?;
    let output_dir = args.output.clone().unwrap_or_else(|| config.output_directory());
    let animation = args.animation.clone().or_else(|| config.output.animation.clone());

    info!("Input file: {}", input.display());
    info!("Output directory: {}", output_dir.display());

    // --- Load Snapshot File ---
    let start_time = Instant::now();
    let sim = simulation_common::load(&input)
        .with_context(|| format!("Failed to load snapshot file {}", input.display()))?;
    if sim.is_empty() {
        warn!("{} contains no timesteps.", input.display());
    }

    // --- Render Frames ---
    let style = RenderStyle::from_config(&config);
    let renderer = Renderer::new(style.clone())
        .parallel(args.parallel || config.execution.parallel)
        .with_progress(!args.no_progress && config.execution.progress);
    let report = renderer
        .render_all(&sim, &output_dir)
        .with_context(|| format!("Failed to render frames into {}", output_dir.display()))?;

    if let Some(gif_path) = animation {
        render_animation(&sim, &style, &gif_path, config.output.frame_delay_ms)
            .with_context(|| format!("Failed to write animation {}", gif_path.display()))?;
    }

    info!(
        "Done: {} frames written to {} in {:.2?}",
        report.len(),
        output_dir.display(),
        start_time.elapsed()
    );
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let sim = simulation_common::load(&args.input)
        .with_context(|| format!("Failed to load snapshot file {}", args.input.display()))?;
    export_simulation(&sim, args.format, &args.output)
        .with_context(|| format!("Failed to export to {}", args.output.display()))?;
    Ok(())
}

// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = "2\n100\n100\n1\n10\n\n0\n10.0 20.0 5.0\n30.0 40.0 10.0\n\n1\n12 22 6\n31 41 9\n";

    fn render_args(input: Option<PathBuf>, output: Option<PathBuf>) -> RenderArgs {
        RenderArgs {
            input,
            output,
            config: None,
            animation: None,
            parallel: false,
            no_progress: true,
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn render_writes_one_frame_per_timestep() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("code_out.sim");
        fs::write(&input, SAMPLE).unwrap();
        let output = dir.path().join("vis");

        run_render(render_args(Some(input), Some(output.clone()))).unwrap();

        assert!(output.join("timestep_0.png").is_file());
        assert!(output.join("timestep_1.png").is_file());
    }

    #[test]
    fn config_supplies_paths_and_style() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("code_out.sim");
        fs::write(&input, SAMPLE).unwrap();
        let output = dir.path().join("frames");
        let gif = dir.path().join("run.gif");
        let config_path = dir.path().join("render.toml");
        fs::write(
            &config_path,
            format!(
                "[input]\npath = {:?}\n\n[output]\ndirectory = {:?}\nfile_prefix = \"frame_\"\nanimation = {:?}\n\n[execution]\nprogress = false\n",
                input.display().to_string(),
                output.display().to_string(),
                gif.display().to_string()
            ),
        )
        .unwrap();

        let mut args = render_args(None, None);
        args.config = Some(config_path);
        run_render(args).unwrap();

        assert!(output.join("frame_0.png").is_file());
        assert!(output.join("frame_1.png").is_file());
        assert!(gif.is_file());
    }

    #[test]
    fn missing_input_is_reported() {
        let err = run_render(render_args(None, None)).unwrap_err();
        assert!(err.to_string().contains("No input file"));
    }

    #[test]
    fn export_subcommand_writes_csv() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("code_out.sim");
        fs::write(&input, SAMPLE).unwrap();
        let output = dir.path().join("out.csv");

        run_export(ExportArgs {
            input,
            output: output.clone(),
            format: ExportFormat::Csv,
        })
        .unwrap();

        assert_eq!(fs::read_to_string(output).unwrap().lines().count(), 5);
    }
}
