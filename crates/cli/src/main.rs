#![deny(unsafe_code)]
//! Headless driver for the ferrofluid simulation.
//!
//! Subcommands:
//! - `run`: tick a preset for N frames, optionally export the surface as OBJ
//! - `presets`: print the built-in presets and their parameters

mod error;
mod obj;

use clap::{Parser, Subcommand};
use error::CliError;
use ferrofluid_core::{DVec3, Engine, FrameContext};
use ferrofluid_sim::config::FerrofluidConfig;
use ferrofluid_sim::{Ferrofluid, Preset};
use std::path::PathBuf;
use std::process;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Frame interval of the headless clock in milliseconds.
const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Parser)]
#[command(name = "ferrofluid", about = "Ferrofluid simulation CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a preset for N frames and report the final surface.
    Run {
        /// Preset name (core, orbit).
        #[arg(short, long, default_value = "core")]
        preset: String,

        /// Number of frames to simulate.
        #[arg(short, long, default_value_t = 120)]
        frames: u64,

        /// Seed for body placement; overrides the preset and --params.
        #[arg(long)]
        seed: Option<u64>,

        /// Parameter overrides as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Fixed pointer hit "x,y,z" fed to every frame.
        #[arg(long)]
        pointer: Option<String>,

        /// Write the last surface as Wavefront OBJ.
        #[arg(long)]
        obj: Option<PathBuf>,
    },
    /// List the built-in presets with their parameters.
    Presets,
}

fn parse_pointer(text: &str) -> Result<DVec3, CliError> {
    let parts = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CliError::Input(format!("invalid --pointer '{text}': {e}")))?;
    match parts[..] {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(DVec3::new(x, y, z)),
        _ => Err(CliError::Input(format!(
            "invalid --pointer '{text}': expected three finite numbers x,y,z"
        ))),
    }
}

fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Presets => {
            let presets = Preset::list_names()
                .iter()
                .map(|name| Preset::from_name(name).map(FerrofluidConfig::preset))
                .collect::<Result<Vec<_>, _>>()?;
            if cli.json {
                let info: serde_json::Map<_, _> = presets
                    .iter()
                    .map(|c| (c.preset.name().to_string(), c.to_json()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                for c in &presets {
                    println!(
                        "{:<6} resolution {:>3}, world scale {}, isolation {}, force law {}",
                        c.preset.name(),
                        c.resolution,
                        c.world_scale,
                        c.isolation,
                        c.force_law.name()
                    );
                }
            }
        }
        Command::Run {
            preset,
            frames,
            seed,
            params,
            pointer,
            obj: obj_path,
        } => {
            let mut params: serde_json::Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
            if let Some(seed) = seed {
                params
                    .as_object_mut()
                    .ok_or_else(|| CliError::Input("--params must be a JSON object".into()))?
                    .insert("seed".into(), seed.into());
            }
            let pointer = pointer.as_deref().map(parse_pointer).transpose()?;

            let mut sim = Ferrofluid::from_preset(&preset, &params)?;
            for frame in 0..frames {
                let ctx = FrameContext {
                    elapsed_ms: frame as f64 * FRAME_MS,
                    pointer,
                };
                sim.tick(&ctx)?;
            }
            info!(frames, "run finished");

            if let Some(path) = &obj_path {
                obj::write_obj(sim.surface(), path)?;
            }

            let stats = sim.stats();
            if cli.json {
                let info = serde_json::json!({
                    "preset": sim.config().preset.name(),
                    "seed": sim.config().seed,
                    "bodies": sim.body_transforms().len(),
                    "core_scale": sim.core_scale(),
                    "stats": stats,
                    "obj": obj_path.as_ref().map(|p| p.display().to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!(
                    "{} frames of {} ({} bodies, seed {}): core scale {:.3}, {} vertices, {} triangles, {} skipped",
                    stats.frames,
                    sim.config().preset.name(),
                    sim.body_transforms().len(),
                    sim.config().seed,
                    sim.core_scale(),
                    stats.vertices,
                    stats.triangles,
                    stats.skipped_frames
                );
                if let Some(path) = &obj_path {
                    eprintln!("surface -> {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logger setup failed: {e}");
    }

    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_parses_three_numbers() {
        let p = parse_pointer("1.5, -2,0").ok().unwrap();
        assert_eq!(p, DVec3::new(1.5, -2.0, 0.0));
    }

    #[test]
    fn pointer_rejects_bad_input() {
        for text in ["1,2", "1,2,3,4", "a,b,c", "1,NaN,2", ""] {
            let err = parse_pointer(text).err().unwrap();
            assert_eq!(err.exit_code(), 12, "accepted {text}");
        }
    }

    #[test]
    fn unknown_level_defaults_to_warn() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("chatty"), Level::WARN);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "ferrofluid", "--json", "run", "--preset", "orbit", "--frames", "3", "--pointer", "0,0,1",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Run { preset, frames, pointer, .. } => {
                assert_eq!(preset, "orbit");
                assert_eq!(frames, 3);
                assert_eq!(pointer.as_deref(), Some("0,0,1"));
            }
            Command::Presets => panic!("parsed the wrong subcommand"),
        }
    }
}
