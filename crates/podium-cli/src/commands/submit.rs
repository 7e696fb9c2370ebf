//! Submit command: post one score to a leaderboard.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use podium_core::{LeaderboardClient, SubmitOptions};
use serde_json::{Map, Value};

pub async fn run(
    client: &Arc<LeaderboardClient>,
    leaderboard: &str,
    score: f64,
    nickname: &str,
    meta: &[String],
) -> Result<()> {
    let metadata = parse_metadata(meta)?;
    let opts = SubmitOptions {
        nickname: nickname.to_string(),
        metadata,
        ..Default::default()
    };

    match client.submit_guest_score(leaderboard, score, opts).await {
        Ok(()) => {
            println!("Score submitted.");
            Ok(())
        }
        Err(e) if e.is_retryable() => {
            println!(
                "Submission failed; {} score(s) saved for retry on the next run.",
                client.pending_retries()
            );
            Err(e.into())
        }
        Err(e) => Err(e).context("Submission failed"),
    }
}

fn parse_metadata(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut metadata = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid metadata entry {:?}, expected KEY=VALUE", pair);
        };
        metadata.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(metadata)
}
