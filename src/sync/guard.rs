//! The single enforcement point for Discord's role hierarchy.
//!
//! Discord rejects (or silently ignores) role changes that violate the hierarchy. Checking
//! locally before every mutation turns that into a precondition failure naming the rule.

use core::fmt;

use serde::Serialize;

use crate::guild::{ExternalAccount, ExternalRole};

/// The hierarchy rule a mutation would violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PrivilegeRule {
    /// The role is not below the bot's highest role.
    RoleOutranksAgent,
    /// The member's highest role is not below the bot's highest role.
    TargetOutranksAgent,
    /// The role belongs to an integration.
    ManagedRole,
}

impl fmt::Display for PrivilegeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::RoleOutranksAgent => "the role is not ranked below the bot's highest role",
            Self::TargetOutranksAgent => "the member is not ranked below the bot's highest role",
            Self::ManagedRole => "the role is managed by an integration",
        };
        f.write_str(msg)
    }
}

/// Checks that the acting agent, whose highest role sits at `acting_position`,
/// may grant or revoke `role` on `target`. On refusal, names the first rule violated.
pub(crate) fn check(
    acting_position: i64,
    role: &ExternalRole,
    target: &ExternalAccount,
) -> Result<(), PrivilegeRule> {
    if acting_position <= role.position {
        return Err(PrivilegeRule::RoleOutranksAgent);
    }
    if acting_position <= target.highest_role_position {
        return Err(PrivilegeRule::TargetOutranksAgent);
    }
    if role.managed {
        return Err(PrivilegeRule::ManagedRole);
    }
    Ok(())
}
