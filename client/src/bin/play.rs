//! Plays a complete riddle hunt against a running server
//!
//! Usage:
//!   cargo run --bin riddle-play -- --name <NAME> [--url <URL>]
//!
//! Registers the player, answers every stage in order and prints the
//! resulting leaderboard.

use anyhow::Context;
use clap::Parser;
use riddle_client::Client;
use riddle_types::Stage;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Play a full riddle hunt")]
struct Args {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long)]
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let client = Client::new(&args.url).context("invalid server URL")?;

    let clue = client
        .start(&args.name)
        .await
        .context("registration failed")?;
    info!(clue = %clue.clue, "Registered {}", args.name);

    for stage in Stage::ALL {
        let clue = client
            .advance(&args.name, stage)
            .await
            .with_context(|| format!("stage {stage} failed"))?;
        info!(%stage, clue = %clue.clue, "Stage cleared");
    }

    let completion = client
        .finish(&args.name)
        .await
        .context("final stage failed")?;
    info!(
        seconds = completion.completion_time_seconds,
        completed_at = %completion.completed_at,
        "{}",
        completion.message
    );

    let board = client.leaderboard().await.context("leaderboard failed")?;
    info!(
        completed = board.total_completed,
        players = board.total_players,
        "Leaderboard"
    );
    for entry in board.leaderboard {
        info!("#{} {} {}", entry.rank, entry.name, entry.time_formatted);
    }

    Ok(())
}
