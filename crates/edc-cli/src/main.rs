use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edc_core::{DecisionEngine, EngineConfig};
use edc_protocol::{DecisionBatch, EventBatch, WireFormat};

/// edc - offline development harness for the energy-budget-aware decision
/// core. Feeds a JSON event-batch file through the core, tick by tick, and
/// prints the decisions the same `EventBatch -> DecisionBatch` pair would
/// produce over the real ABI, without building a dynamic library or
/// running the simulator.
#[derive(Parser)]
#[command(name = "edc")]
#[command(about = "Offline harness for the EDC decision core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a sequence of event batches and print the decisions each
    /// tick produces.
    Run {
        /// Path to a JSON file holding the run configuration
        /// (policy, budget_fraction, period_length, p_idle, p_comp).
        #[arg(short, long)]
        config: PathBuf,
        /// Path to a JSON file holding an array of event batches, each
        /// shaped like `{"now": <f64>, "events": [...]}`, applied in order.
        #[arg(short, long)]
        ticks: PathBuf,
        /// Print decisions as pretty-printed JSON instead of compact.
        #[arg(long)]
        pretty: bool,
    },
    /// Validate a configuration file without running any ticks.
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).compact().init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, ticks, pretty } => run(&config, &ticks, pretty),
        Commands::Validate { config } => validate(&config),
    }
}

fn load_config(path: &PathBuf) -> Result<EngineConfig> {
    let bytes = fs::read(path).with_context(|| format!("reading config file {path:?}"))?;
    EngineConfig::from_slice(&bytes, WireFormat::Json)
        .with_context(|| format!("parsing config file {path:?}"))
}

fn validate(config: &PathBuf) -> Result<()> {
    let cfg = load_config(config)?;
    println!("{cfg:#?}");
    Ok(())
}

fn run(config: &PathBuf, ticks: &PathBuf, pretty: bool) -> Result<()> {
    let cfg = load_config(config)?;
    let mut engine = DecisionEngine::new(cfg);

    let ticks_bytes = fs::read(ticks).with_context(|| format!("reading ticks file {ticks:?}"))?;
    let batches: Vec<EventBatch> =
        serde_json::from_slice(&ticks_bytes).with_context(|| format!("parsing ticks file {ticks:?}"))?;

    for batch in batches {
        let now = batch.now;
        tracing::debug!(now, events = batch.events.len(), "applying tick");
        let decisions = engine
            .take_decisions(batch)
            .with_context(|| format!("engine rejected tick at t={now}"))?;
        let out = DecisionBatch { now, decisions };
        let text = if pretty {
            serde_json::to_string_pretty(&out)?
        } else {
            serde_json::to_string(&out)?
        };
        println!("{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn validate_accepts_a_well_formed_config() {
        let f = write_tmp(r#"{"policy":"PowerCap","p_idle":100.0,"p_comp":200.0}"#);
        let cfg = load_config(&f.path().to_path_buf()).unwrap();
        assert_eq!(cfg.p_comp, 200.0);
    }

    #[test]
    fn validate_rejects_a_malformed_config() {
        let f = write_tmp(r#"{"p_idle":100.0}"#);
        assert!(load_config(&f.path().to_path_buf()).is_err());
    }

    #[test]
    fn run_replays_ticks_and_emits_decisions() {
        let config = write_tmp(r#"{"policy":"PowerCap","p_idle":100.0,"p_comp":200.0}"#);
        let ticks = write_tmp(
            r#"[
                {"now": 0.0, "events": [{"t": "simulation_begins", "host_count": 4}]},
                {"now": 0.0, "events": [{"t": "job_submitted", "id": "j1", "width": 2, "walltime": 10.0}]}
            ]"#,
        );
        run(&config.path().to_path_buf(), &ticks.path().to_path_buf(), false).unwrap();
    }
}
