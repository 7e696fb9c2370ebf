//! Login command: saves service credentials for later runs.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

fn credentials_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join("podium").join("credentials"))
}

pub fn run(endpoint: &str, token: &str) -> Result<()> {
    let endpoint = endpoint.trim_end_matches('/');

    let cred_path = credentials_path()?;
    if let Some(parent) = cred_path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let mut table = toml::Table::new();
    table.insert(
        "endpoint".to_string(),
        toml::Value::String(endpoint.to_string()),
    );
    table.insert("token".to_string(), toml::Value::String(token.to_string()));
    let content = toml::to_string_pretty(&table).context("Failed to serialize credentials")?;

    fs::write(&cred_path, content).context("Failed to write credentials file")?;

    println!("Credentials saved to: {}", cred_path.display());
    Ok(())
}

/// Load credentials from the config file
pub fn load_credentials() -> Option<(String, String)> {
    let cred_path = credentials_path().ok()?;
    let content = fs::read_to_string(cred_path).ok()?;
    let table: toml::Table = content.parse().ok()?;
    let endpoint = table.get("endpoint")?.as_str()?.to_string();
    let token = table.get("token")?.as_str()?.to_string();
    Some((endpoint, token))
}
