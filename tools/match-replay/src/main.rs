//! match-replay: drive one battleground match from a JSON script.
//!
//! A script is a list of steps applied in order:
//!
//! ```json
//! [
//!   { "tick": 120000 },
//!   { "interact": { "type": "Use", "objective": 0, "team": "A" } },
//!   { "tick": 60000 },
//!   { "end_early": { "a": 10, "b": 8 } }
//! ]
//! ```
//!
//! Effects are printed as JSON lines on stdout, followed by the final
//! snapshot. Logs go to stderr; `WARFRONT_LOG` overrides `-v`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use warfront_core::effects::Effect;
use warfront_core::interactions::Interaction;
use warfront_core::topology::TopologyError;
use warfront_core::types::PerTeam;
use warfront_maps::{MapId, MapLoadError};
use warfront_sim::sink::TracingSink;
use warfront_sim::{MatchEngine, MatchOptions};

#[derive(Debug, Parser)]
#[command(name = "match-replay", version, about = "Replay a scripted battleground match")]
struct Args {
    /// Map to play: table name or short name (av, wsg, ab, eots, sota, ioc).
    #[arg(short, long)]
    map: MapId,

    /// JSON script of steps.
    script: PathBuf,

    /// Seed for seeded choices such as the first relay attackers.
    #[arg(long, env = "WARFRONT_SEED", default_value_t = MatchOptions::default().seed)]
    seed: u64,

    /// Print only the final snapshot.
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Tick(u64),
    Interact(Interaction),
    EndEarly(PerTeam<u32>),
    Reset,
}

#[derive(Debug, Serialize)]
struct EffectLine<'a> {
    step: usize,
    effect: &'a Effect,
}

#[derive(Debug, Error)]
enum ReplayError {
    #[error(transparent)]
    Map(#[from] MapLoadError),
    #[error("invalid map table: {0}")]
    Topology(#[from] TopologyError),
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad script or output: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("match-replay: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("WARFRONT_LOG").unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<(), ReplayError> {
    let topology = warfront_maps::load(args.map)?;
    let steps = read_script(&args.script)?;
    let mut engine = MatchEngine::new(topology, MatchOptions { seed: args.seed })?;
    engine.set_sink(Box::new(TracingSink));

    tracing::info!(
        target: "warfront::replay",
        map = %args.map,
        steps = steps.len(),
        seed = args.seed,
        "replay.started"
    );

    for (index, step) in steps.iter().enumerate() {
        let effects = match step {
            Step::Tick(delta_ms) => engine.tick(*delta_ms),
            Step::Interact(interaction) => engine.handle_interaction(interaction),
            Step::EndEarly(population) => engine.end_early(*population),
            Step::Reset => {
                engine.reset();
                Vec::new()
            }
        };
        if !args.quiet {
            for effect in &effects {
                let line = EffectLine {
                    step: index,
                    effect,
                };
                println!("{}", serde_json::to_string(&line)?);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    tracing::info!(
        target: "warfront::replay",
        result = ?engine.result(),
        "replay.finished"
    );
    Ok(())
}

fn read_script(path: &Path) -> Result<Vec<Step>, ReplayError> {
    let contents = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}
