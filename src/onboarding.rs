//! Greets accounts joining the Discord server.
//!
//! The gateway listener in [`crate::bots`] only forwards [`MemberJoined`] events over a
//! channel; the handling itself works against any [`GuildApi`].

use std::collections::HashSet;

use serenity::model::prelude::{RoleId, UserId};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::{
    error::{Error, Result},
    guild::{find_role, ExternalAccount, GuildApi},
    immut_data::consts::ONBOARDING_MESSAGE,
    sync::{
        mapping::RoleMapping,
        mutator::{Mutation, RoleMutator},
    },
};

/// An account joined the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberJoined {
    pub(crate) account_id: UserId,
    pub(crate) username: String,
    pub(crate) display_name: Option<String>,
    pub(crate) nick: Option<String>,
    /// Roles the account already holds, e.g. granted by another integration.
    pub(crate) roles: HashSet<RoleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Onboarded {
    pub(crate) role: Mutation,
    /// Whether the instructional direct message was delivered.
    pub(crate) welcomed: bool,
}

/// Grants the onboarding role, then sends the instructional direct message.
///
/// The grant goes through the same hierarchy checks as every other mutation. A failing
/// direct message is logged and otherwise ignored.
#[instrument(skip_all, fields(account_id = %event.account_id, username = %event.username))]
pub(crate) async fn handle_member_joined(
    event: &MemberJoined,
    api: &dyn GuildApi,
    mapping: &RoleMapping,
) -> Result<Onboarded> {
    let roles = api.list_roles().await?;
    let role_name = &mapping.names().onboarding;
    let role = find_role(&roles, role_name)
        .cloned()
        .ok_or_else(|| Error::RoleNotConfigured(role_name.clone()))?;
    let acting_position = api.acting_account(&roles).await?.highest_role_position;

    let mut account = ExternalAccount::new(
        event.account_id,
        event.username.clone(),
        event.display_name.clone(),
        event.nick.clone(),
        event.roles.clone(),
        &roles,
    );
    let mutation = RoleMutator::new(api, acting_position)
        .add_role(&mut account, &role)
        .await?;

    let welcomed = match api
        .send_direct_message(event.account_id, ONBOARDING_MESSAGE)
        .await
    {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "Could not deliver the onboarding message");
            false
        }
    };
    info!(role = %role.name, ?mutation, welcomed, "Onboarded new member");
    Ok(Onboarded {
        role: mutation,
        welcomed,
    })
}

/// Handles join events one at a time until every sender is gone.
pub(crate) async fn run(
    mut events: mpsc::Receiver<MemberJoined>,
    api: &dyn GuildApi,
    mapping: &RoleMapping,
) {
    while let Some(event) = events.recv().await {
        if let Err(err) = handle_member_joined(&event, api, mapping).await {
            error!(account_id = %event.account_id, %err, "Failed to onboard new member");
        }
    }
    info!("Join event channel closed");
}
