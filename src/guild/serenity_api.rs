use std::{collections::HashSet, sync::Arc};

use serenity::{
    async_trait,
    http::Http,
    model::prelude::{GuildId, Member, Role, RoleId, UserId},
};
use tracing::debug;

use super::{ExternalAccount, ExternalRole, GuildApi};
use crate::{
    error::Result,
    immut_data::consts::{AUDIT_LOG_REASON, MEMBERS_PAGE_LIMIT},
};

/// [`GuildApi`] backed by the Discord REST API.
#[derive(Clone)]
pub(crate) struct SerenityGuild {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl SerenityGuild {
    pub(crate) fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }
}

impl From<Role> for ExternalRole {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            position: i64::from(role.position),
            managed: role.managed,
        }
    }
}

impl ExternalAccount {
    pub(crate) fn from_member(member: Member, guild_roles: &[ExternalRole]) -> Self {
        let Member {
            user, nick, roles, ..
        } = member;
        let roles: HashSet<RoleId> = roles.into_iter().collect();
        Self::new(
            user.id,
            user.name,
            user.global_name,
            nick,
            roles,
            guild_roles,
        )
    }
}

#[async_trait]
impl GuildApi for SerenityGuild {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    async fn list_roles(&self) -> Result<Vec<ExternalRole>> {
        let roles = self.http.get_guild_roles(self.guild_id).await?;
        Ok(roles.into_iter().map(ExternalRole::from).collect())
    }

    async fn list_members(&self, roles: &[ExternalRole]) -> Result<Vec<ExternalAccount>> {
        let mut accounts = Vec::<ExternalAccount>::new();
        let mut after: Option<u64> = None;
        loop {
            let page: Vec<Member> = self
                .http
                .get_guild_members(self.guild_id, Some(MEMBERS_PAGE_LIMIT), after)
                .await?;
            let page_len = page.len();
            after = page.last().map(|m| m.user.id.get());
            accounts.extend(page.into_iter().map(|m| ExternalAccount::from_member(m, roles)));
            debug!(page_len, total = accounts.len(), "Fetched a page of server members");
            if (page_len as u64) < MEMBERS_PAGE_LIMIT {
                break;
            }
        }
        Ok(accounts)
    }

    async fn acting_account(&self, roles: &[ExternalRole]) -> Result<ExternalAccount> {
        let me = self.http.get_current_user().await?;
        let member = self.http.get_member(self.guild_id, me.id).await?;
        Ok(ExternalAccount::from_member(member, roles))
    }

    async fn add_role(&self, account: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(self.guild_id, account, role, Some(AUDIT_LOG_REASON))
            .await?;
        Ok(())
    }

    async fn remove_role(&self, account: UserId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(self.guild_id, account, role, Some(AUDIT_LOG_REASON))
            .await?;
        Ok(())
    }

    async fn send_direct_message(&self, account: UserId, content: &str) -> Result<()> {
        let channel = account.create_dm_channel(&*self.http).await?;
        channel.say(&*self.http, content).await?;
        Ok(())
    }
}
