use std::{env, path::PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::model::prelude::GuildId;
use tracing::{debug, warn};

use super::consts::{DEFAULT_COMMUNITY_ROLE, DEFAULT_MAX_CONNECTIONS, DEFAULT_QUARANTINE_ROLE};
use crate::sync::mapping::RoleNames;

/// Trailing legacy discriminator, e.g. the `#1234` in `bob#1234`.
pub(crate) static DISCRIMINATOR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[0-9]{4}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for environment variable {0}")]
    InvalidVar(&'static str),
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseCfg {
    pub(crate) url: String,
    pub(crate) password: Option<String>,
    pub(crate) max_connections: u32,
}

/// Runtime configuration of the bot, read from the environment.
#[derive(Debug, Clone)]
pub(crate) struct BotCfg {
    pub(crate) database: DatabaseCfg,
    pub(crate) discord_token: String,
    pub(crate) discord_server_id: GuildId,
    pub(crate) role_names: RoleNames,
}

impl BotCfg {
    /// Loads the configuration from the process environment. A `.env` file is honoured.
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        if let Some(err) = unusable_dotenv(dotenvy::dotenv()) {
            warn!(%err, "Ignoring unreadable .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };
        let optional = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_connections = match optional("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidVar("DATABASE_MAX_CONNECTIONS"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let database = DatabaseCfg {
            url: required("DATABASE_URL")?,
            password: optional("DATABASE_PASSWORD"),
            max_connections,
        };

        let discord_token = required("DISCORD_TOKEN")?;
        let discord_server_id = required("DISCORD_SERVER_ID")?
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(GuildId::new)
            .ok_or(ConfigError::InvalidVar("DISCORD_SERVER_ID"))?;

        let community =
            optional("COMMUNITY_ROLE").unwrap_or_else(|| DEFAULT_COMMUNITY_ROLE.to_owned());
        let quarantine =
            optional("QUARANTINE_ROLE").unwrap_or_else(|| DEFAULT_QUARANTINE_ROLE.to_owned());
        let onboarding = optional("ONBOARDING_ROLE").unwrap_or_else(|| quarantine.clone());
        if community.eq_ignore_ascii_case(&quarantine) {
            return Err(ConfigError::InvalidVar("QUARANTINE_ROLE"));
        }
        if community.eq_ignore_ascii_case(&onboarding) {
            return Err(ConfigError::InvalidVar("ONBOARDING_ROLE"));
        }

        Ok(Self {
            database,
            discord_token,
            discord_server_id,
            role_names: RoleNames {
                community,
                quarantine,
                onboarding,
            },
        })
    }
}

/// The error of a `.env` file that exists but could not be loaded. A missing file is fine.
fn unusable_dotenv(loaded: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    match loaded {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded .env file");
            None
        }
        Err(err) if err.not_found() => None,
        Err(err) => Some(err),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/bashers"),
        ("DISCORD_TOKEN", "token"),
        ("DISCORD_SERVER_ID", "1234567890"),
    ];

    #[test]
    fn test_defaults() {
        let cfg = BotCfg::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(cfg.discord_server_id, GuildId::new(1_234_567_890));
        assert_eq!(cfg.database.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.database.password, None);
        assert_eq!(cfg.role_names.community, "basher");
        assert_eq!(cfg.role_names.quarantine, "visitor");
        assert_eq!(cfg.role_names.onboarding, "visitor");
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("DATABASE_PASSWORD", "hunter2"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("COMMUNITY_ROLE", "member"),
            ("QUARANTINE_ROLE", "suspended"),
            ("ONBOARDING_ROLE", "newcomer"),
        ]);
        let cfg = BotCfg::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(cfg.database.password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.database.max_connections, 12);
        assert_eq!(cfg.role_names.community, "member");
        assert_eq!(cfg.role_names.quarantine, "suspended");
        assert_eq!(cfg.role_names.onboarding, "newcomer");
    }

    #[test]
    fn test_missing_token() {
        let vars: Vec<_> = REQUIRED
            .into_iter()
            .filter(|(k, _)| *k != "DISCORD_TOKEN")
            .collect();
        assert!(matches!(
            BotCfg::from_lookup(lookup(&vars)),
            Err(ConfigError::MissingVar("DISCORD_TOKEN"))
        ));
    }

    #[test]
    fn test_invalid_server_id() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("DISCORD_SERVER_ID", "not-a-snowflake");
        assert!(matches!(
            BotCfg::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidVar("DISCORD_SERVER_ID"))
        ));
    }

    #[test]
    fn test_zero_server_id() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("DISCORD_SERVER_ID", "0");
        assert!(matches!(
            BotCfg::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidVar("DISCORD_SERVER_ID"))
        ));
    }

    #[test]
    fn test_missing_dotenv_is_fine() {
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(unusable_dotenv(Err(dotenvy::Error::Io(missing))).is_none());
        assert!(unusable_dotenv(Ok(PathBuf::from(".env"))).is_none());
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let malformed = dotenvy::Error::LineParse("DISCORD_TOKEN abc".to_owned(), 13);
        assert!(matches!(
            unusable_dotenv(Err(malformed)),
            Some(dotenvy::Error::LineParse(_, 13))
        ));

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(unusable_dotenv(Err(dotenvy::Error::Io(denied))).is_some());
    }

    #[test]
    fn test_community_and_quarantine_must_differ() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("QUARANTINE_ROLE", "Basher"));
        assert!(matches!(
            BotCfg::from_lookup(lookup(&vars)),
            Err(ConfigError::InvalidVar("QUARANTINE_ROLE"))
        ));
    }
}
