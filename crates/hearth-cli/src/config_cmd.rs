//! Config subcommands: get, set, reset.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use crate::config::{ConfigManager, ProfileConfig};

/// Config subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Print one profile value, or all of them.
    Get { key: Option<String> },
    /// Set a profile value (`accountId` or `techSpaceId`).
    Set { key: String, value: String },
    /// Clear the profile, including stored fallback credentials.
    Reset,
}

/// Execute a config subcommand.
pub fn run(action: ConfigAction, profile: &ConfigManager) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        ConfigAction::Get { key } => get(profile, key.as_deref(), &mut out),
        ConfigAction::Set { key, value } => set(profile, &key, &value, &mut out),
        ConfigAction::Reset => {
            profile.reset()?;
            writeln!(out, "Configuration reset")?;
            Ok(())
        }
    }
}

/// Accept the `...ID` spelling too.
fn canonical_key(key: &str) -> &str {
    match key {
        "accountID" => "accountId",
        "techSpaceID" => "techSpaceId",
        other => other,
    }
}

fn get(profile: &ConfigManager, key: Option<&str>, out: &mut impl Write) -> anyhow::Result<()> {
    let snapshot = profile.snapshot();
    match key {
        Some(key) => {
            let value = snapshot
                .get_key(canonical_key(key))
                .ok_or_else(|| anyhow::anyhow!("Unknown config key: {key}"))?;
            writeln!(out, "{}", value.unwrap_or(""))?;
        }
        None => {
            for key in ProfileConfig::KEYS {
                let value = snapshot.get_key(key).flatten().unwrap_or("<unset>");
                writeln!(out, "{key}: {value}")?;
            }
        }
    }
    Ok(())
}

fn set(
    profile: &ConfigManager,
    key: &str,
    value: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let key = canonical_key(key);
    if !ProfileConfig::KEYS.contains(&key) {
        anyhow::bail!("Unknown config key: {key}");
    }
    profile.update(|c| {
        c.set_key(key, value);
    })?;
    writeln!(out, "Set {key} = {value}")?;
    Ok(())
}
