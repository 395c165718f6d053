//! Command-line front end for the decoding session

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use synapse_decoder::{
    ClassifierKind, ExampleStore, JsonStateStore, Session, SessionConfig, TrainOutcome,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synapse-decoder", version, about = "EEG acquisition and decoding session")]
struct Cli {
    /// Device endpoint serving the raw byte stream
    #[arg(long, default_value = "127.0.0.1:9000", global = true)]
    device: SocketAddr,

    /// Directory holding session state and recorded examples
    #[arg(long, default_value = "synapse-data", global = true)]
    data_dir: PathBuf,

    /// Window length in seconds
    #[arg(long, default_value_t = 2, global = true)]
    duration: u32,

    /// Calibration interval in seconds
    #[arg(long, default_value_t = 2, global = true)]
    calibration: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Measure the device's effective sampling rate and persist it
    Calibrate,
    /// Record labeled training windows
    Record {
        /// Class label to record under
        label: String,
        /// Number of windows to capture
        #[arg(long, default_value_t = 5)]
        repeats: usize,
    },
    /// Fit both classifier variants from the recorded examples
    Train,
    /// Capture one live window and classify it
    Predict {
        /// Which classifier variant to run
        #[arg(long, value_enum, default_value_t = KindArg::Feature)]
        kind: KindArg,
    },
    /// Reset the prediction history log
    ClearHistory,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Feature,
    Sequence,
}

impl From<KindArg> for ClassifierKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Feature => ClassifierKind::Feature,
            KindArg::Sequence => ClassifierKind::Sequence,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = SessionConfig::new(cli.device);
    config.duration_secs = cli.duration;
    config.calibration_secs = cli.calibration;
    config.connect_timeout = Duration::from_secs(2);

    let state = JsonStateStore::open(&cli.data_dir)
        .with_context(|| format!("opening state store at {}", cli.data_dir.display()))?;
    let examples = ExampleStore::open(cli.data_dir.join("recordings"))
        .with_context(|| format!("opening example store at {}", cli.data_dir.display()))?;
    let mut session = Session::new(config, state, examples);

    match cli.command {
        Command::Calibrate => {
            let estimate = session.calibrate()?;
            if estimate.degraded {
                println!(
                    "measured {} Hz, using default {} Hz",
                    estimate.measured_hz, estimate.rate_hz
                );
            } else {
                println!("sampling rate: {} Hz", estimate.rate_hz);
            }
        }
        Command::Record { label, repeats } => {
            let report = session
                .record(&label, repeats)
                .with_context(|| format!("recording '{label}'"))?;
            println!(
                "saved {} window(s), skipped {} incomplete",
                report.saved, report.skipped
            );
        }
        Command::Train => match session.train().context("training models")? {
            TrainOutcome::Trained {
                class_count,
                example_count,
            } => println!("trained on {example_count} example(s) across {class_count} class(es)"),
            TrainOutcome::NoExamples => println!("no usable examples recorded yet"),
        },
        Command::Predict { kind } => {
            let prediction = session
                .predict(kind.into())
                .context("running prediction")?;
            println!(
                "predicted: {} (confidence {:.2})",
                prediction.label, prediction.confidence
            );
        }
        Command::ClearHistory => {
            session.clear_history()?;
            println!("prediction history cleared");
        }
    }

    Ok(())
}
