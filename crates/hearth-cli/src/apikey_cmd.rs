//! `auth apikey` subcommands: create, list, revoke.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use anyhow::Context;

use crate::context::ClientContext;
use crate::gateway::ApiKey;

/// Characters of a key shown by `list`.
const KEY_PREVIEW_LEN: usize = 8;

#[derive(clap::Subcommand, Debug)]
pub enum ApiKeyAction {
    /// Create an API key for a local app.
    Create {
        /// App name the key is issued to.
        name: String,
    },
    /// List API keys, newest first.
    List,
    /// Revoke an API key by id.
    Revoke { id: String },
}

pub async fn run(action: ApiKeyAction, ctx: &ClientContext) -> anyhow::Result<()> {
    execute(action, ctx, &mut io::stdout()).await
}

async fn execute(
    action: ApiKeyAction,
    ctx: &ClientContext,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let token = ctx.token()?;
    let gateway = ctx.gateway();
    match action {
        ApiKeyAction::Create { name } => {
            let key = gateway
                .create_api_key(&token, &name)
                .await
                .context("Failed to create API key")?;
            writeln!(out, "API key created")?;
            writeln!(out, "  Name: {name}")?;
            writeln!(out, "  Key:  {key}")?;
        }
        ApiKeyAction::List => {
            let keys = gateway
                .list_api_keys(&token)
                .await
                .context("Failed to list API keys")?;
            render_keys(keys, out)?;
        }
        ApiKeyAction::Revoke { id } => {
            gateway
                .revoke_api_key(&token, &id)
                .await
                .context("Failed to revoke API key")?;
            writeln!(out, "API key '{id}' revoked")?;
        }
    }
    Ok(())
}

fn key_preview(key: &str) -> String {
    if key.chars().count() > KEY_PREVIEW_LEN {
        let head: String = key.chars().take(KEY_PREVIEW_LEN).collect();
        format!("{head}...")
    } else {
        key.to_string()
    }
}

fn format_created(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0).map_or_else(
        || secs.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Aligned table of keys, newest first.
pub fn render_keys(mut keys: Vec<ApiKey>, out: &mut impl Write) -> io::Result<()> {
    if keys.is_empty() {
        return writeln!(out, "No API keys found.");
    }
    keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let header = ["NAME", "ID", "KEY", "CREATED (UTC)"];
    let rows: Vec<[String; 4]> = keys
        .iter()
        .map(|k| {
            [
                k.name.clone(),
                k.id.clone(),
                key_preview(&k.key),
                format_created(k.created_at),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        let [name, id, key, created] = cells;
        format!(
            "{name:<w0$}  {id:<w1$}  {key:<w2$}  {created}",
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        )
    };
    writeln!(out, "{}", line(header))?;
    for row in &rows {
        writeln!(out, "{}", line([&row[0], &row[1], &row[2], &row[3]]))?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FakeServer, logged_in_context};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn preview_truncates_long_keys() {
        assert_eq!(key_preview("abcdefghijkl"), "abcdefgh...");
        assert_eq!(key_preview("short"), "short");
    }

    #[test]
    fn created_is_formatted_in_utc() {
        assert_eq!(format_created(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn empty_list_says_so() {
        let mut buf = Vec::new();
        render_keys(Vec::new(), &mut buf).unwrap();
        assert_eq!(output(buf), "No API keys found.\n");
    }

    #[tokio::test]
    async fn create_list_revoke() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new("acc-1"));
        let ctx = logged_in_context(server.clone(), dir.path());

        for name in ["cli", "editor"] {
            let mut buf = Vec::new();
            execute(
                ApiKeyAction::Create { name: name.into() },
                &ctx,
                &mut buf,
            )
            .await
            .unwrap();
            assert!(output(buf).contains(&format!("Key:  key-{name}-")));
        }

        let mut buf = Vec::new();
        execute(ApiKeyAction::List, &ctx, &mut buf).await.unwrap();
        let text = output(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "{text}");
        assert!(lines[0].starts_with("NAME"));
        // Newest first, keys shortened.
        assert!(lines[1].starts_with("editor"), "{text}");
        assert!(lines[1].contains("key-edit..."), "{text}");
        assert!(lines[2].starts_with("cli"), "{text}");

        let mut buf = Vec::new();
        execute(ApiKeyAction::Revoke { id: "app-1".into() }, &ctx, &mut buf)
            .await
            .unwrap();
        assert_eq!(output(buf), "API key 'app-1' revoked\n");
        assert_eq!(server.count("revoke_api_key"), 1);

        let err = execute(ApiKeyAction::Revoke { id: "app-1".into() }, &ctx, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to revoke"), "{err:#}");
    }

    #[tokio::test]
    async fn requires_a_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new("acc-1"));
        let ctx = logged_in_context(server.clone(), dir.path());
        ctx.orchestrator.logout().await.unwrap();

        let err = execute(ApiKeyAction::List, &ctx, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("hearth auth login"), "{err:#}");
        assert_eq!(server.count("list_api_keys"), 0);
    }
}
