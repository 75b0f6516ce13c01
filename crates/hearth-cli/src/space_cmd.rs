//! Space subcommands: list, join, leave, approve.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;

use hearth_proto::v1::{ParticipantPermissions, SpaceStatus};

use crate::context::ClientContext;
use crate::credentials::ProfileStore;
use crate::events::JOIN_REQUEST_WAIT;
use crate::gateway::{SpaceJoin, SpaceSummary};

/// Longest space name shown by `list` before it is shortened.
const NAME_DISPLAY_LEN: usize = 28;

/// Space subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum SpaceAction {
    /// List the spaces of the logged-in account.
    List,
    /// Join a space with an invite link (`https://<host>/<cid>#<key>`).
    Join {
        invite_link: String,
        /// Network id; the server's own network when omitted.
        #[arg(long, default_value = "")]
        network: String,
    },
    /// Leave a space.
    Leave { space_id: String },
    /// Wait for a join request to a space and approve it as a writer.
    Approve {
        space_id: String,
        /// How long to wait for the request.
        #[arg(long, default_value_t = JOIN_REQUEST_WAIT.as_secs())]
        timeout_secs: u64,
    },
}

/// Execute a space subcommand.
pub async fn run(action: SpaceAction, ctx: &ClientContext) -> anyhow::Result<()> {
    match action {
        SpaceAction::List => list(ctx, &mut io::stdout()).await,
        SpaceAction::Join {
            invite_link,
            network,
        } => join(ctx, &invite_link, &network).await,
        SpaceAction::Leave { space_id } => leave(ctx, &space_id).await,
        SpaceAction::Approve {
            space_id,
            timeout_secs,
        } => approve(ctx, &space_id, Duration::from_secs(timeout_secs)).await,
    }
}

/// The two parts of an invite link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLink {
    pub cid: String,
    pub file_key: String,
}

/// Parse `https://<host>/<cid>#<key>`.
pub fn parse_invite_link(link: &str) -> anyhow::Result<InviteLink> {
    let rest = link
        .trim()
        .strip_prefix("https://")
        .context("Invalid invite link, expected https://<host>/<cid>#<key>")?;
    let (host_and_path, file_key) = rest
        .split_once('#')
        .context("Invite link is missing the key (after #)")?;
    let (_host, path) = host_and_path
        .split_once('/')
        .context("Invite link is missing the cid")?;
    let cid = path.trim_matches('/');
    if cid.is_empty() {
        anyhow::bail!("Invite link is missing the cid");
    }
    if file_key.is_empty() {
        anyhow::bail!("Invite link is missing the key (after #)");
    }
    Ok(InviteLink {
        cid: cid.to_string(),
        file_key: file_key.to_string(),
    })
}

async fn list(ctx: &ClientContext, out: &mut impl Write) -> anyhow::Result<()> {
    let token = ctx.token()?;
    let tech_space_id = ctx
        .profile
        .tech_space_id()
        .context("Tech space id not found, run `hearth auth login` first")?;
    let spaces = ctx
        .gateway()
        .list_spaces(&token, &tech_space_id)
        .await
        .context("Failed to list spaces")?;
    render_spaces(&spaces, out)?;
    Ok(())
}

fn display_name(name: &str) -> String {
    if name.chars().count() > NAME_DISPLAY_LEN {
        let head: String = name.chars().take(NAME_DISPLAY_LEN - 3).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

const fn status_label(status: SpaceStatus) -> &'static str {
    match status {
        SpaceStatus::Unknown => "Unknown",
        _ => "Active",
    }
}

/// One line per space: id, name, status.
pub fn render_spaces(spaces: &[SpaceSummary], out: &mut impl Write) -> io::Result<()> {
    if spaces.is_empty() {
        return writeln!(out, "No spaces found");
    }
    let id_width = spaces
        .iter()
        .map(|s| s.space_id.len())
        .chain(["SPACE ID".len()])
        .max()
        .unwrap_or_default();
    let name_width = NAME_DISPLAY_LEN + 2;
    writeln!(out, "{:<id_width$}  {:<name_width$}STATUS", "SPACE ID", "NAME")?;
    for space in spaces {
        writeln!(
            out,
            "{:<id_width$}  {:<name_width$}{}",
            space.space_id,
            display_name(&space.name),
            status_label(space.status)
        )?;
    }
    Ok(())
}

async fn join(ctx: &ClientContext, invite_link: &str, network: &str) -> anyhow::Result<()> {
    let invite = parse_invite_link(invite_link)?;
    let token = ctx.token()?;
    let gateway = ctx.gateway();

    let view = gateway
        .view_invite(&token, &invite.cid, &invite.file_key)
        .await
        .context("Failed to view invite")?;
    let mut out = io::stdout();
    writeln!(
        out,
        "Joining space '{}' created by {}...",
        view.space_name, view.creator_name
    )?;

    gateway
        .join_space(
            &token,
            &SpaceJoin {
                network_id: network.to_string(),
                space_id: view.space_id.clone(),
                invite_cid: invite.cid,
                invite_file_key: invite.file_key,
            },
        )
        .await
        .context("Failed to join space")?;
    writeln!(out, "Sent join request to space '{}'", view.space_id)?;
    Ok(())
}

async fn leave(ctx: &ClientContext, space_id: &str) -> anyhow::Result<()> {
    let token = ctx.token()?;
    ctx.gateway()
        .leave_space(&token, space_id)
        .await
        .context("Failed to leave space")?;
    let mut out = io::stdout();
    writeln!(out, "Left space '{space_id}'")?;
    Ok(())
}

async fn approve(ctx: &ClientContext, space_id: &str, timeout: Duration) -> anyhow::Result<()> {
    let token = ctx.token()?;
    let stream = ctx
        .orchestrator
        .events()
        .open(&token)
        .await
        .context("Failed to subscribe to events")?;

    let mut out = io::stdout();
    writeln!(out, "Waiting for a join request to '{space_id}'...")?;
    let request = stream
        .wait_for_join_request(space_id, timeout)
        .await
        .context("No join request received")?;

    ctx.gateway()
        .approve_join_request(
            &token,
            space_id,
            &request.identity,
            ParticipantPermissions::Writer,
        )
        .await
        .context("Failed to approve join request")?;
    writeln!(
        out,
        "Approved {} ({}) as writer",
        request.identity_name, request.identity
    )?;
    Ok(())
}
