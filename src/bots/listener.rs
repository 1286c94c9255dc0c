use std::sync::Arc;

use serenity::{
    async_trait,
    model::prelude::{GuildId, Member, Ready},
    prelude::{Context, EventHandler},
    Client,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    error::Result,
    guild::SerenityGuild,
    immut_data::{
        consts::{DISCORD_INTENTS, JOIN_EVENT_BUFFER},
        dynamic::BotCfg,
    },
    onboarding::{self, MemberJoined},
    sync::mapping::RoleMapping,
};

/// Gateway event handler that forwards joins to the configured server over a channel.
///
/// It does no work itself, so a slow Discord API never stalls the gateway connection
/// beyond [`JOIN_EVENT_BUFFER`] pending joins.
pub(crate) struct Listener {
    discord_server_id: GuildId,
    events: mpsc::Sender<MemberJoined>,
}

impl Listener {
    pub(crate) fn new(discord_server_id: GuildId, events: mpsc::Sender<MemberJoined>) -> Self {
        Self {
            discord_server_id,
            events,
        }
    }

    async fn forward(&self, member: Member) {
        if member.guild_id != self.discord_server_id {
            debug!(guild_id = %member.guild_id, "Ignoring join to another server");
            return;
        }
        let event = MemberJoined::from(member);
        let account_id = event.account_id;
        if self.events.send(event).await.is_err() {
            error!(%account_id, "The onboarding handler is gone, dropping join event");
        }
    }
}

impl From<Member> for MemberJoined {
    fn from(member: Member) -> Self {
        let Member {
            user, nick, roles, ..
        } = member;
        Self {
            account_id: user.id,
            username: user.name,
            display_name: user.global_name,
            nick,
            roles: roles.into_iter().collect(),
        }
    }
}

#[async_trait]
impl EventHandler for Listener {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(bot = %ready.user.name, "Connected to the gateway");
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        self.forward(new_member).await;
    }
}

/// Runs the gateway connection and the onboarding handler until Ctrl-C is pressed.
pub(crate) async fn listen(cfg: &BotCfg, mapping: &RoleMapping) -> Result<()> {
    let (tx, rx) = mpsc::channel(JOIN_EVENT_BUFFER);
    let mut client = Client::builder(&cfg.discord_token, DISCORD_INTENTS)
        .event_handler(Listener::new(cfg.discord_server_id, tx))
        .await?;
    let api = SerenityGuild::new(Arc::clone(&client.http), cfg.discord_server_id);

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "Could not listen for Ctrl-C");
            return;
        }
        info!("Shutting down");
        shard_manager.shutdown_all().await;
    });

    tokio::select! {
        res = client.start() => res?,
        () = onboarding::run(rx, &api, mapping) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serenity::model::prelude::{RoleId, UserId};

    use super::*;
    use crate::fakes::gateway_member;

    #[test]
    fn test_join_event_carries_display_name() {
        let event = MemberJoined::from(gateway_member(300, "hank", Some("Hank H")));

        assert_eq!(event.account_id, UserId::new(300));
        assert_eq!(event.username, "hank");
        assert_eq!(event.display_name.as_deref(), Some("Hank H"));
        assert_eq!(event.nick, None);
        assert!(event.roles.contains(&RoleId::new(3)));
    }

    #[tokio::test]
    async fn test_joins_to_other_servers_are_dropped() {
        let (tx, mut rx) = mpsc::channel(2);
        let listener = Listener::new(GuildId::new(7), tx);

        listener.forward(gateway_member(300, "hank", None)).await;
        drop(listener);

        assert!(rx.recv().await.is_none());
    }
}
