pub mod login;
pub mod scores;
pub mod submit;

use std::sync::Arc;

use anyhow::{Context, Result};
use podium_core::{ClientConfig, HttpTransport, LeaderboardClient, StaticAccount};
use tracing::{debug, info};

/// Resolve endpoint/token: args > credentials file.
pub fn resolve_credentials(
    endpoint: Option<&str>,
    token: Option<&str>,
) -> Result<(String, String)> {
    let creds = login::load_credentials();

    let resolved_endpoint = match endpoint {
        Some(e) => e.to_string(),
        None => creds
            .as_ref()
            .map(|(e, _)| e.clone())
            .context("No endpoint specified. Use --endpoint or run `podium login` first.")?,
    };

    let resolved_token = match token {
        Some(t) => t.to_string(),
        None => creds
            .as_ref()
            .map(|(_, t)| t.clone())
            .context("No token specified. Use --token or run `podium login` first.")?,
    };

    Ok((resolved_endpoint, resolved_token))
}

pub fn build_client(
    endpoint: Option<&str>,
    token: Option<&str>,
) -> Result<Arc<LeaderboardClient>> {
    let (endpoint, token) = resolve_credentials(endpoint, token)?;

    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory")?
        .join("podium");
    std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let config = ClientConfig::new(
        endpoint,
        token.clone(),
        data_dir.join("pending-scores.ndjson"),
    );
    debug!("Using endpoint {}", config.base_url);

    let transport = Arc::new(HttpTransport::new()?);
    let account = Arc::new(StaticAccount::new(token));

    let client = LeaderboardClient::new(config, transport, account);
    if client.pending_retries() > 0 {
        info!(
            "{} score(s) pending from a previous run",
            client.pending_retries()
        );
    }
    Ok(client)
}
