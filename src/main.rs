use core::fmt::Display;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::{Parser, Subcommand};
use serde::Serialize;
use serenity::http::Http;
use tracing::warn;

mod bots;
mod commands;
mod db;
mod error;
#[cfg(test)]
mod fakes;
mod guild;
mod immut_data;
mod model;
mod onboarding;
mod sync;
mod util;

use commands::Engine;
use guild::SerenityGuild;
use immut_data::dynamic::BotCfg;
use model::Title;
use sync::mapping::RoleMapping;

/// Keeps the Discord roles of community members in line with their titles.
#[derive(Parser)]
#[command(name = "bashsync", version, about)]
struct Cli {
    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Sync(SyncCommand),

    /// Stay connected to Discord and onboard accounts as they join
    Listen,
}

/// Commands that run once against the member directory and the Discord server.
#[derive(Subcommand)]
enum SyncCommand {
    /// Reconcile the roles of one member
    SyncRole { handle: String },

    /// Reconcile every linked member that is not quarantined
    BulkSync {
        /// Report the intended changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Set the title of a member, then reconcile them
    AssignRole { handle: String, title: Title },

    /// Quarantine a member, then reconcile them
    RemoveRole { handle: String },

    /// Print the member directory
    ListMembers {
        /// Only list members with this title
        #[arg(long = "role")]
        title: Option<Title>,
    },

    /// Print title distribution, link adoption and server presence
    ServerStats,
}

fn print<T: Serialize + Display>(report: &T, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Set once Ctrl-C is pressed, so that a bulk sync stops between two members.
fn interrupt_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&flag);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current member");
            handle.store(true, Ordering::Relaxed);
        }
    });
    flag
}

async fn run(
    command: SyncCommand,
    cfg: &BotCfg,
    mapping: &RoleMapping,
    json: bool,
) -> anyhow::Result<()> {
    let pool = db::connect(&cfg.database).await?;
    let http = Arc::new(Http::new(&cfg.discord_token));
    let guild_api = SerenityGuild::new(http, cfg.discord_server_id);
    let engine = Engine::new(&pool, &guild_api, mapping);

    match command {
        SyncCommand::SyncRole { handle } => print(&engine.sync_role(&handle).await?, json)?,
        SyncCommand::BulkSync { dry_run } => {
            let interrupted = interrupt_flag();
            let summary = engine.bulk_sync(dry_run, &interrupted).await?;
            print(&summary, json)?;
        }
        SyncCommand::AssignRole { handle, title } => {
            print(&engine.assign_role(&handle, title).await?, json)?;
        }
        SyncCommand::RemoveRole { handle } => print(&engine.remove_role(&handle).await?, json)?,
        SyncCommand::ListMembers { title } => print(&engine.list_members(title).await?, json)?,
        SyncCommand::ServerStats => print(&engine.server_stats().await?, json)?,
    }
    pool.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { json, command } = Cli::parse();
    util::init_tracing();

    let cfg = BotCfg::from_env()?;
    let mapping = RoleMapping::new(cfg.role_names.clone())?;

    match command {
        Command::Listen => bots::listen(&cfg, &mapping).await?,
        Command::Sync(command) => run(command, &cfg, &mapping, json).await?,
    }
    Ok(())
}
