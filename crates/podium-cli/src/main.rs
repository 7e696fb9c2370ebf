use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use podium_core::QueryOptions;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::scores::Listing;

#[derive(Parser)]
#[command(name = "podium")]
#[command(about = "Podium leaderboard client")]
struct Args {
    /// Service endpoint (overrides saved credentials)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Player token (overrides saved credentials)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save the endpoint and token for later runs
    Login,
    /// Post a score to a leaderboard
    Submit {
        leaderboard: String,
        score: f64,
        #[arg(long, default_value = "")]
        nickname: String,
        /// Extra metadata as KEY=VALUE pairs
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },
    /// List scores
    Scores {
        leaderboard: String,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 10)]
        limit: i64,
        /// Mark the current player's entries
        #[arg(long)]
        with_player: bool,
    },
    /// List the current player's scores
    Player {
        leaderboard: String,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// List scores around the current player
    Nearby {
        leaderboard: String,
        #[arg(long, default_value_t = 5)]
        count: i64,
        #[arg(long)]
        anchor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("podium=info".parse()?))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Login => {
            let endpoint = args.endpoint.context("--endpoint is required for login")?;
            let token = args.token.context("--token is required for login")?;
            commands::login::run(&endpoint, &token)
        }
        Command::Submit {
            leaderboard,
            score,
            nickname,
            meta,
        } => {
            let client = commands::build_client(args.endpoint.as_deref(), args.token.as_deref())?;
            commands::submit::run(&client, &leaderboard, score, &nickname, &meta).await
        }
        Command::Scores {
            leaderboard,
            offset,
            limit,
            with_player,
        } => {
            let client = commands::build_client(args.endpoint.as_deref(), args.token.as_deref())?;
            let listing = if with_player {
                Listing::WithPlayer
            } else {
                Listing::All
            };
            let opts = QueryOptions {
                offset,
                limit,
                ..Default::default()
            };
            commands::scores::run(&client, &leaderboard, listing, opts).await
        }
        Command::Player {
            leaderboard,
            offset,
            limit,
        } => {
            let client = commands::build_client(args.endpoint.as_deref(), args.token.as_deref())?;
            let opts = QueryOptions {
                offset,
                limit,
                ..Default::default()
            };
            commands::scores::run(&client, &leaderboard, Listing::Player, opts).await
        }
        Command::Nearby {
            leaderboard,
            count,
            anchor,
        } => {
            let client = commands::build_client(args.endpoint.as_deref(), args.token.as_deref())?;
            let listing = Listing::Nearby {
                count,
                anchor: anchor.as_deref(),
            };
            commands::scores::run(&client, &leaderboard, listing, QueryOptions::default()).await
        }
    }
}
