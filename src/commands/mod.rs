//! The operations exposed on the command line.
//!
//! Single-member commands surface the first error they run into. Bulk commands never do
//! for per-member errors, those end up in the [`BatchSummary`].

use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::{
    db::MemberDirectory,
    error::{Error, Result},
    guild::GuildApi,
    model::{Member, MemberFilter, Title},
    sync::{
        batch::{self, BatchSummary},
        mapping::RoleMapping,
        reconcile::{Mode, Reconciler, SyncOutcome},
    },
};

mod listing;
mod stats;

pub(crate) use listing::MemberListing;
pub(crate) use stats::ServerStats;

/// The injected collaborators every command works with.
#[derive(Clone, Copy)]
pub(crate) struct Engine<'a> {
    directory: &'a dyn MemberDirectory,
    guild_api: &'a dyn GuildApi,
    mapping: &'a RoleMapping,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        directory: &'a dyn MemberDirectory,
        guild_api: &'a dyn GuildApi,
        mapping: &'a RoleMapping,
    ) -> Self {
        Self {
            directory,
            guild_api,
            mapping,
        }
    }

    async fn reconciler(&self) -> Result<Reconciler<'a>> {
        Reconciler::connect(self.guild_api, self.mapping).await
    }

    async fn lookup(&self, discord_handle: &str) -> Result<Member> {
        self.directory
            .get_member(discord_handle)
            .await?
            .ok_or_else(|| Error::MemberNotFound(discord_handle.to_owned()))
    }

    /// `sync-role <handle>`
    pub(crate) async fn sync_role(&self, discord_handle: &str) -> Result<SyncOutcome> {
        let member = self.lookup(discord_handle).await?;
        let mut reconciler = self.reconciler().await?;
        reconciler
            .reconcile(&member, Mode::Apply)
            .await
            .into_result()
    }

    /// `bulk-sync [--dry-run]`, over every linked member that is not quarantined.
    pub(crate) async fn bulk_sync(
        &self,
        dry_run: bool,
        interrupted: &AtomicBool,
    ) -> Result<BatchSummary> {
        let members: Vec<Member> = self
            .directory
            .list_members(MemberFilter::linked())
            .await?
            .into_iter()
            .filter(|m| !m.title.is_quarantined())
            .collect();
        info!(members = members.len(), dry_run, "Starting bulk sync");
        let mode = if dry_run { Mode::DryRun } else { Mode::Apply };
        let mut reconciler = self.reconciler().await?;
        Ok(batch::sync_all(&mut reconciler, &members, mode, interrupted).await)
    }

    /// `assign-role <handle> <title>`
    ///
    /// The title is stored before Discord is touched. A failing reconciliation leaves the
    /// directory ahead of Discord until the member is synced again.
    pub(crate) async fn assign_role(
        &self,
        discord_handle: &str,
        title: Title,
    ) -> Result<SyncOutcome> {
        let mut member = self.lookup(discord_handle).await?;
        if member.title != title {
            self.directory.update_member_title(member.id, title).await?;
            member.title = title;
        }
        let mut reconciler = self.reconciler().await?;
        reconciler
            .reconcile(&member, Mode::Apply)
            .await
            .into_result()
    }

    /// `remove-role <handle>`
    pub(crate) async fn remove_role(&self, discord_handle: &str) -> Result<SyncOutcome> {
        self.assign_role(discord_handle, Title::NullBasher).await
    }

    /// `list-members [--role <title>]`
    pub(crate) async fn list_members(&self, title: Option<Title>) -> Result<MemberListing> {
        let filter = title.map_or_else(MemberFilter::default, MemberFilter::with_title);
        let members = self.directory.list_members(filter).await?;
        Ok(MemberListing { title, members })
    }

    /// `server-stats`
    pub(crate) async fn server_stats(&self) -> Result<ServerStats> {
        let members = self.directory.list_members(MemberFilter::default()).await?;
        let reconciler = self.reconciler().await?;
        Ok(ServerStats::new(&members, reconciler.guild(), self.mapping))
    }
}
