use crate::{
    immut_data::dynamic::ConfigError,
    model::{Title, UnknownTitle},
    sync::guard::PrivilegeRule,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("No member with handle `{0}` in the directory")]
    MemberNotFound(String),
    #[error("No member with id {0} in the directory")]
    UnknownMemberId(i64),
    #[error("Member {0} has no linked Discord account")]
    NotLinked(i64),
    #[error("`{0}` has not joined the Discord server")]
    AccountNotInGuild(String),
    #[error("Not allowed to change role `{role}`: {rule}")]
    InsufficientPrivilege { role: String, rule: PrivilegeRule },
    #[error("Role `{0}` does not exist on the Discord server")]
    RoleNotConfigured(String),
    #[error("The role mapping has no entry for {0}")]
    IncompleteMapping(Title),
    #[error("The role mapping has more than one entry for {0}")]
    AmbiguousMapping(Title),
    #[error(transparent)]
    UnknownTitle(#[from] UnknownTitle),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

impl Error {
    /// Stable reason code reported in sync outcomes.
    pub(crate) fn code(&self) -> &'static str {
        match self {
            Self::MemberNotFound(_) | Self::UnknownMemberId(_) => "member-not-found",
            Self::NotLinked(_) => "not-linked",
            Self::AccountNotInGuild(_) => "account-not-in-guild",
            Self::InsufficientPrivilege { .. } => "insufficient-privilege",
            Self::RoleNotConfigured(_) => "role-not-configured",
            Self::IncompleteMapping(_) | Self::AmbiguousMapping(_) | Self::Config(_) => {
                "configuration-error"
            }
            Self::UnknownTitle(_) | Self::Sqlx(_) => "datastore-error",
            Self::Serenity(_) => "external-transport-error",
        }
    }
}

pub(crate) type Result<T> = core::result::Result<T, Error>;
