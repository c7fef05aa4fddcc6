//! practicum-replay - run a recorded hand-tracking capture through the
//! gesture pipeline and print the resulting circuit actions.

use std::fs::File;
use std::io::BufReader;

use clap::Parser;
use tracing::info;

use circuit_practicum::replay::{replay, Recording};
use circuit_practicum::session::{PracticumSession, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "practicum-replay", about = "Replay recorded hand-tracking sessions")]
struct Cli {
    /// Path to a JSON recording of tracked frames
    #[arg(long)]
    input: String,

    /// Treat the capture as front-facing (mirrored), overriding the
    /// recording's own flag
    #[arg(long)]
    mirrored: bool,

    /// Print an action-count summary to stderr when done
    #[arg(long)]
    summary: bool,

    /// Print the final electrical analysis as a last JSON line
    #[arg(long)]
    analysis: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "circuit_practicum=info".into()),
        )
        .init();

    info!("practicum-replay v{} starting", env!("CARGO_PKG_VERSION"));

    let file = File::open(&cli.input)?;
    let recording: Recording = serde_json::from_reader(BufReader::new(file))?;
    info!(
        frames = recording.frames.len(),
        mirrored = recording.mirrored || cli.mirrored,
        "recording loaded"
    );

    let mut session = PracticumSession::with_config(SessionConfig {
        mirrored: recording.mirrored || cli.mirrored,
        ..SessionConfig::default()
    });

    let records = replay(&mut session, &recording);
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }

    if cli.analysis {
        println!("{}", serde_json::to_string(&session.analysis())?);
    }

    if cli.summary {
        let circuit = session.controller().circuit();
        eprintln!(
            "{} frames, {} actions, {} components, {} wires",
            recording.frames.len(),
            records.len(),
            circuit.components().len(),
            circuit.wires().len()
        );
    }

    Ok(())
}
