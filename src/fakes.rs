//! In-memory stand-ins for Discord and the member directory.

use std::{collections::HashSet, sync::Mutex};

use serde_json::json;
use serenity::{
    async_trait,
    model::prelude::{GuildId, Member as GuildMember, RoleId, UserId},
};

use crate::{
    db::MemberDirectory,
    error::{Error, Result},
    guild::{ExternalAccount, ExternalRole, GuildApi},
    model::{Member, MemberFilter, Title},
    sync::mapping::{RoleMapping, RoleNames},
    util::fold_handle,
};

pub(crate) const ACTING_ACCOUNT: UserId = UserId::new(999);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GuildCall {
    AddRole(UserId, RoleId),
    RemoveRole(UserId, RoleId),
    DirectMessage(UserId),
}

#[derive(Debug, Clone)]
struct FakeAccount {
    id: UserId,
    username: String,
    display_name: Option<String>,
    nick: Option<String>,
    roles: HashSet<RoleId>,
}

#[derive(Debug, Default)]
struct State {
    roles: Vec<ExternalRole>,
    accounts: Vec<FakeAccount>,
    calls: Vec<GuildCall>,
}

/// A Discord server that records every request made against it.
#[derive(Debug, Default)]
pub(crate) struct FakeGuild {
    state: Mutex<State>,
    failing: HashSet<UserId>,
    failing_removals: HashSet<UserId>,
    failing_dms: bool,
}

fn role(id: u64, name: &str, position: i64, managed: bool) -> ExternalRole {
    ExternalRole {
        id: RoleId::new(id),
        name: name.to_owned(),
        position,
        managed,
    }
}

fn account(id: u64, username: &str, roles: &[u64]) -> FakeAccount {
    FakeAccount {
        id: UserId::new(id),
        username: username.to_owned(),
        display_name: None,
        nick: None,
        roles: roles.iter().copied().map(RoleId::new).collect(),
    }
}

fn transport_error() -> Error {
    Error::Serenity(serenity::Error::Other("connection reset"))
}

impl FakeGuild {
    /// Roles, from the bottom of the hierarchy: `@everyone`, `visitor`, `newcomer`,
    /// `basher`, the managed `booster`, `mentor`, the bot's own role and `admin`.
    ///
    /// Accounts: alice (no role), bob (basher), carol (visitor), dave (basher and visitor),
    /// erin (newcomer), root (admin) and the bot itself.
    pub(crate) fn standard() -> Self {
        let roles = vec![
            role(1, "@everyone", 0, false),
            role(2, "visitor", 1, false),
            role(3, "basher", 2, false),
            role(4, "newcomer", 1, false),
            role(5, "mentor", 3, false),
            role(6, "bashsync", 5, true),
            role(7, "booster", 2, true),
            role(8, "admin", 10, false),
        ];
        let mut alice = account(100, "alice", &[]);
        alice.display_name = Some("Alice A".to_owned());
        let mut erin = account(104, "erin", &[4]);
        erin.nick = Some("Ez".to_owned());
        let accounts = vec![
            alice,
            account(101, "bob", &[3]),
            account(102, "carol", &[2]),
            account(103, "dave", &[3, 2]),
            erin,
            account(900, "root", &[8]),
            account(ACTING_ACCOUNT.get(), "bashsync", &[6]),
        ];
        Self {
            state: Mutex::new(State {
                roles,
                accounts,
                calls: Vec::new(),
            }),
            ..Self::default()
        }
    }

    /// Every role change on `id` fails in transport.
    pub(crate) fn failing_for(mut self, id: UserId) -> Self {
        self.failing.insert(id);
        self
    }

    /// Role removals on `id` fail in transport.
    pub(crate) fn failing_removal_for(mut self, id: UserId) -> Self {
        self.failing_removals.insert(id);
        self
    }

    pub(crate) fn with_failing_dms(mut self) -> Self {
        self.failing_dms = true;
        self
    }

    pub(crate) fn without_role(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state
                .roles
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.id)
                .unwrap();
            state.roles.retain(|r| r.id != id);
            for account in &mut state.accounts {
                account.roles.remove(&id);
            }
        }
        self
    }

    /// Adds an account that has no role yet, as a fresh join would.
    pub(crate) fn join(&self, id: UserId, username: &str) {
        let mut state = self.state.lock().unwrap();
        state.accounts.push(account(id.get(), username, &[]));
    }

    pub(crate) fn account(&self, id: UserId) -> ExternalAccount {
        let state = self.state.lock().unwrap();
        let fake = state.accounts.iter().find(|a| a.id == id).unwrap();
        to_external(fake, &state.roles)
    }

    pub(crate) fn role_named(&self, name: &str) -> ExternalRole {
        let state = self.state.lock().unwrap();
        state.roles.iter().find(|r| r.name == name).cloned().unwrap()
    }

    pub(crate) fn acting_position(&self) -> i64 {
        self.account(ACTING_ACCOUNT).highest_role_position
    }

    pub(crate) fn role_names_of(&self, id: UserId) -> HashSet<String> {
        let state = self.state.lock().unwrap();
        let fake = state.accounts.iter().find(|a| a.id == id).unwrap();
        state
            .roles
            .iter()
            .filter(|r| fake.roles.contains(&r.id))
            .map(|r| r.name.clone())
            .collect()
    }

    pub(crate) fn calls(&self) -> Vec<GuildCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of role changes that reached the server.
    pub(crate) fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, GuildCall::DirectMessage(_)))
            .count()
    }

    fn mutate(&self, call: GuildCall) -> Result<()> {
        let (id, role, add) = match call {
            GuildCall::AddRole(id, role) => (id, role, true),
            GuildCall::RemoveRole(id, role) => (id, role, false),
            GuildCall::DirectMessage(_) => unreachable!(),
        };
        if self.failing.contains(&id) || (!add && self.failing_removals.contains(&id)) {
            return Err(transport_error());
        }
        let mut state = self.state.lock().unwrap();
        let Some(account) = state.accounts.iter_mut().find(|a| a.id == id) else {
            return Err(Error::Serenity(serenity::Error::Other("Unknown Member")));
        };
        if add {
            account.roles.insert(role);
        } else {
            account.roles.remove(&role);
        }
        state.calls.push(call);
        Ok(())
    }
}

fn to_external(fake: &FakeAccount, roles: &[ExternalRole]) -> ExternalAccount {
    ExternalAccount::new(
        fake.id,
        fake.username.clone(),
        fake.display_name.clone(),
        fake.nick.clone(),
        fake.roles.clone(),
        roles,
    )
}

#[async_trait]
impl GuildApi for FakeGuild {
    fn guild_id(&self) -> GuildId {
        GuildId::new(42)
    }

    async fn list_roles(&self) -> Result<Vec<ExternalRole>> {
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn list_members(&self, roles: &[ExternalRole]) -> Result<Vec<ExternalAccount>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .map(|a| to_external(a, roles))
            .collect())
    }

    async fn acting_account(&self, roles: &[ExternalRole]) -> Result<ExternalAccount> {
        let state = self.state.lock().unwrap();
        let fake = state
            .accounts
            .iter()
            .find(|a| a.id == ACTING_ACCOUNT)
            .unwrap();
        Ok(to_external(fake, roles))
    }

    async fn add_role(&self, account: UserId, role: RoleId) -> Result<()> {
        self.mutate(GuildCall::AddRole(account, role))
    }

    async fn remove_role(&self, account: UserId, role: RoleId) -> Result<()> {
        self.mutate(GuildCall::RemoveRole(account, role))
    }

    async fn send_direct_message(&self, account: UserId, _content: &str) -> Result<()> {
        if self.failing_dms {
            return Err(Error::Serenity(serenity::Error::Other(
                "Cannot send messages to this user",
            )));
        }
        self.state
            .lock()
            .unwrap()
            .calls
            .push(GuildCall::DirectMessage(account));
        Ok(())
    }
}

/// A member directory kept in memory.
#[derive(Debug, Default)]
pub(crate) struct FakeDirectory {
    members: Mutex<Vec<Member>>,
}

impl FakeDirectory {
    pub(crate) fn new(members: Vec<Member>) -> Self {
        Self {
            members: Mutex::new(members),
        }
    }

    pub(crate) fn title_of(&self, id: i64) -> Title {
        let members = self.members.lock().unwrap();
        members.iter().find(|m| m.id == id).unwrap().title
    }
}

#[async_trait]
impl MemberDirectory for FakeDirectory {
    async fn list_members(&self, filter: MemberFilter) -> Result<Vec<Member>> {
        let members = self.members.lock().unwrap();
        Ok(members.iter().filter(|m| filter.matches(m)).cloned().collect())
    }

    async fn get_member(&self, discord_handle: &str) -> Result<Option<Member>> {
        let handle = fold_handle(discord_handle);
        let members = self.members.lock().unwrap();
        Ok(members
            .iter()
            .find(|m| {
                m.discord_handle
                    .as_deref()
                    .is_some_and(|stored| fold_handle(stored) == handle)
            })
            .cloned())
    }

    async fn update_member_title(&self, id: i64, title: Title) -> Result<()> {
        let mut members = self.members.lock().unwrap();
        let member = members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::UnknownMemberId(id))?;
        member.title = title;
        Ok(())
    }
}

pub(crate) fn names() -> RoleNames {
    RoleNames {
        community: "basher".to_owned(),
        quarantine: "visitor".to_owned(),
        onboarding: "visitor".to_owned(),
    }
}

pub(crate) fn mapping() -> RoleMapping {
    RoleMapping::new(names()).unwrap()
}

pub(crate) fn mapping_with_onboarding(onboarding: &str) -> RoleMapping {
    RoleMapping::new(RoleNames {
        onboarding: onboarding.to_owned(),
        ..names()
    })
    .unwrap()
}

pub(crate) fn member(id: i64, discord_handle: &str, title: Title) -> Member {
    Member {
        id,
        discord_handle: Some(discord_handle.to_owned()),
        title,
    }
}

/// A server member as the gateway delivers it on join.
pub(crate) fn gateway_member(id: u64, username: &str, global_name: Option<&str>) -> GuildMember {
    serde_json::from_value(json!({
        "guild_id": "42",
        "user": {
            "id": id.to_string(),
            "username": username,
            "discriminator": "0",
            "global_name": global_name,
            "avatar": null,
        },
        "nick": null,
        "avatar": null,
        "roles": ["3"],
        "joined_at": "2024-03-01T12:00:00.000000+00:00",
        "premium_since": null,
        "deaf": false,
        "mute": false,
        "flags": 0,
        "pending": false,
        "communication_disabled_until": null,
    }))
    .unwrap()
}
