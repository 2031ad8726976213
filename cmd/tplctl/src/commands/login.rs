use anyhow::Result;
use colored::Colorize;

use crate::config::{self, Config};

/// Store the user context used for later requests
pub fn login(
    address: Option<String>,
    username: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let existing = Config::load()?.unwrap_or_default();

    let username = match username.filter(|u| !u.is_empty()) {
        Some(username) => username,
        None => config::prompt_username()?,
    };

    let config = Config {
        address: address.or(existing.address),
        username: Some(username.clone()),
        token: token.or(existing.token),
    };
    let path = config.save()?;

    eprintln!("{} Logged in as: {}", "✓".green(), username.cyan());
    eprintln!("{} Config saved to: {}", "✓".green(), path.display());

    Ok(())
}

/// Remove the stored user context
pub fn logout() -> Result<()> {
    let path = Config::config_path()?;

    if Config::delete_at(&path)? {
        eprintln!("{} Logged out", "✓".green());
    } else {
        eprintln!("{}", "Not logged in".yellow());
    }

    Ok(())
}
