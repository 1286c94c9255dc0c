use serenity::prelude::GatewayIntents;

pub(crate) const SCHEMA: &str = include_str!("../../schema.pgsql");

/// `GUILD_MEMBERS` is privileged and has to be enabled for the bot in the developer portal.
pub(crate) const DISCORD_INTENTS: GatewayIntents = {
    let fst = GatewayIntents::GUILDS.bits();
    let snd = GatewayIntents::GUILD_MEMBERS.bits();
    match GatewayIntents::from_bits(fst | snd) {
        Some(intents) => intents,
        None => panic!("Invalid intents"),
    }
};

pub(crate) const DEFAULT_COMMUNITY_ROLE: &str = "basher";
pub(crate) const DEFAULT_QUARANTINE_ROLE: &str = "visitor";

pub(crate) const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Maximum page size of the "list guild members" endpoint.
pub(crate) const MEMBERS_PAGE_LIMIT: u64 = 1000;

pub(crate) const AUDIT_LOG_REASON: &str = "bashsync: role reconciliation";

pub(crate) const ONBOARDING_MESSAGE: &str = "Welcome to the server! :wave:\n\n\
You have been given a guest role for now. \
To unlock the member channels, link your Discord username on your community profile \
and ask an organiser to sync your role.";

/// Join events waiting for the onboarding handler before the gateway listener blocks.
pub(crate) const JOIN_EVENT_BUFFER: usize = 64;
