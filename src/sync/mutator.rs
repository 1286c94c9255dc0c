use tracing::{info, warn};

use super::guard;
use crate::{
    error::{Error, Result},
    guild::{ExternalAccount, ExternalRole, GuildApi},
};

/// What a mutation did to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mutation {
    Applied,
    /// The account already was in the requested state.
    Unchanged,
}

/// Grants and revokes roles, guarded by the role hierarchy.
///
/// Both operations are idempotent: asking for the state the account is already in
/// issues no request. The account is updated in place after a successful request.
pub(crate) struct RoleMutator<'a> {
    api: &'a dyn GuildApi,
    acting_position: i64,
}

impl<'a> RoleMutator<'a> {
    pub(crate) fn new(api: &'a dyn GuildApi, acting_position: i64) -> Self {
        Self {
            api,
            acting_position,
        }
    }

    pub(crate) async fn add_role(
        &self,
        account: &mut ExternalAccount,
        role: &ExternalRole,
    ) -> Result<Mutation> {
        if account.has_role(role.id) {
            return Ok(Mutation::Unchanged);
        }
        self.guard(account, role)?;
        self.api.add_role(account.id, role.id).await?;
        account.roles.insert(role.id);
        account.highest_role_position = account.highest_role_position.max(role.position);
        info!(account_id = %account.id, role = %role.name, "Granted role");
        Ok(Mutation::Applied)
    }

    pub(crate) async fn remove_role(
        &self,
        account: &mut ExternalAccount,
        role: &ExternalRole,
    ) -> Result<Mutation> {
        if !account.has_role(role.id) {
            return Ok(Mutation::Unchanged);
        }
        self.guard(account, role)?;
        self.api.remove_role(account.id, role.id).await?;
        account.roles.remove(&role.id);
        info!(account_id = %account.id, role = %role.name, "Revoked role");
        Ok(Mutation::Applied)
    }

    fn guard(&self, account: &ExternalAccount, role: &ExternalRole) -> Result<()> {
        guard::check(self.acting_position, role, account).map_err(|rule| {
            warn!(account_id = %account.id, role = %role.name, %rule, "Role change refused");
            Error::InsufficientPrivilege {
                role: role.name.clone(),
                rule,
            }
        })
    }
}
