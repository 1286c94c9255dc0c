//! The Discord side of the synchronization: accounts, roles and the client used to mutate them.

use std::collections::HashSet;

use serenity::{
    async_trait,
    model::prelude::{GuildId, RoleId, UserId},
};
use tracing::debug;

use crate::error::Result;

mod resolver;
mod serenity_api;

pub(crate) use resolver::resolve;
pub(crate) use serenity_api::SerenityGuild;

/// A role of the Discord server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExternalRole {
    pub(crate) id: RoleId,
    pub(crate) name: String,
    /// Rank in the role hierarchy; higher outranks lower.
    pub(crate) position: i64,
    /// Controlled by an integration, cannot be granted or revoked by bots.
    pub(crate) managed: bool,
}

/// A Discord account that is a member of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExternalAccount {
    pub(crate) id: UserId,
    pub(crate) username: String,
    /// Public display name, shared across servers.
    pub(crate) display_name: Option<String>,
    /// Server-specific nickname.
    pub(crate) nick: Option<String>,
    pub(crate) highest_role_position: i64,
    pub(crate) roles: HashSet<RoleId>,
}

impl ExternalAccount {
    pub(crate) fn new(
        id: UserId,
        username: String,
        display_name: Option<String>,
        nick: Option<String>,
        roles: HashSet<RoleId>,
        guild_roles: &[ExternalRole],
    ) -> Self {
        let highest_role_position = highest_position(guild_roles, &roles);
        Self {
            id,
            username,
            display_name,
            nick,
            highest_role_position,
            roles,
        }
    }

    pub(crate) fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// Position of the highest role in `held`; `0` (the `@everyone` position) when none is held.
pub(crate) fn highest_position(guild_roles: &[ExternalRole], held: &HashSet<RoleId>) -> i64 {
    guild_roles
        .iter()
        .filter(|r| held.contains(&r.id))
        .map(|r| r.position)
        .max()
        .unwrap_or(0)
        .max(0)
}

/// Snapshot of the Discord server taken once per invocation.
///
/// The snapshot is kept up to date by the [`RoleMutator`](crate::sync::mutator::RoleMutator),
/// so later reconciliations within the same invocation see earlier mutations.
#[derive(Debug, Clone)]
pub(crate) struct Guild {
    pub(crate) id: GuildId,
    pub(crate) roles: Vec<ExternalRole>,
    pub(crate) accounts: Vec<ExternalAccount>,
    /// Highest role position of the bot itself.
    pub(crate) acting_position: i64,
}

impl Guild {
    /// Case-insensitive lookup by role name.
    pub(crate) fn role_named(&self, name: &str) -> Option<&ExternalRole> {
        find_role(&self.roles, name)
    }

    pub(crate) fn resolve(&self, handle: &str) -> Option<&ExternalAccount> {
        resolve(&self.accounts, handle).map(|idx| &self.accounts[idx])
    }
}

pub(crate) fn find_role<'a>(roles: &'a [ExternalRole], name: &str) -> Option<&'a ExternalRole> {
    let name = name.trim();
    roles.iter().find(|r| r.name.eq_ignore_ascii_case(name))
}

/// Client for the Discord server the engine synchronizes with.
///
/// Constructed once per process and passed by reference.
#[async_trait]
pub(crate) trait GuildApi: Send + Sync {
    fn guild_id(&self) -> GuildId;

    async fn list_roles(&self) -> Result<Vec<ExternalRole>>;

    async fn list_members(&self, roles: &[ExternalRole]) -> Result<Vec<ExternalAccount>>;

    /// The server membership of the bot itself.
    async fn acting_account(&self, roles: &[ExternalRole]) -> Result<ExternalAccount>;

    async fn add_role(&self, account: UserId, role: RoleId) -> Result<()>;

    async fn remove_role(&self, account: UserId, role: RoleId) -> Result<()>;

    async fn send_direct_message(&self, account: UserId, content: &str) -> Result<()>;
}

pub(crate) async fn fetch_guild(api: &dyn GuildApi) -> Result<Guild> {
    let roles = api.list_roles().await?;
    let accounts = api.list_members(&roles).await?;
    let acting_position = api.acting_account(&roles).await?.highest_role_position;
    let guild = Guild {
        id: api.guild_id(),
        roles,
        accounts,
        acting_position,
    };
    debug!(
        guild_id = %guild.id,
        roles = guild.roles.len(),
        accounts = guild.accounts.len(),
        acting_position,
        "Fetched guild snapshot"
    );
    Ok(guild)
}
