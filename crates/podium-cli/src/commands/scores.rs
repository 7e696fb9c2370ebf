//! Score listing commands.

use std::sync::Arc;

use anyhow::{Result, bail};
use podium_core::{LeaderboardClient, QueryOptions, ScorePage};

pub enum Listing<'a> {
    All,
    WithPlayer,
    Player,
    Nearby { count: i64, anchor: Option<&'a str> },
}

pub async fn run(
    client: &Arc<LeaderboardClient>,
    leaderboard: &str,
    listing: Listing<'_>,
    opts: QueryOptions,
) -> Result<()> {
    let page = match listing {
        Listing::All => client.get_scores(leaderboard, opts).await,
        Listing::WithPlayer => client.get_scores_with_player(leaderboard, opts).await,
        Listing::Player => client.get_player_scores(leaderboard, opts).await,
        Listing::Nearby { count, anchor } => {
            client
                .get_nearby_scores(leaderboard, count, anchor, opts)
                .await
        }
    };

    print_page(&page)
}

fn print_page(page: &ScorePage) -> Result<()> {
    if let Some(error) = &page.error {
        bail!("{}", error);
    }

    if page.scores.is_empty() {
        println!("No scores.");
        return Ok(());
    }

    for record in &page.scores {
        let marker = if record.is_current_player { " *" } else { "" };
        println!(
            "{:>4}. {:<15} {}{}",
            record.rank, record.name, record.score, marker
        );
    }

    if page.has_more_scores {
        println!("(more scores available)");
    }

    Ok(())
}
