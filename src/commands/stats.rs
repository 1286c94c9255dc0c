use core::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    guild::Guild,
    model::{Member, Title},
    sync::mapping::RoleMapping,
    util::percentage,
};

#[derive(Debug, Serialize)]
pub(crate) struct TitleShare {
    pub(crate) title: Title,
    pub(crate) count: usize,
    /// Share of all members, in percent.
    pub(crate) percentage: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleHolders {
    pub(crate) role: String,
    pub(crate) count: usize,
}

/// Output of `server-stats`.
#[derive(Debug, Serialize)]
pub(crate) struct ServerStats {
    pub(crate) total_members: usize,
    pub(crate) linked_members: usize,
    /// Linked members in percent of all members.
    pub(crate) link_adoption: f64,
    /// Linked members whose handle resolves to an account of the server.
    pub(crate) in_guild: usize,
    /// `in_guild` in percent of the linked members.
    pub(crate) guild_presence: f64,
    /// Every title, in declaration order, including those nobody holds.
    pub(crate) titles: Vec<TitleShare>,
    /// Holders of the community and quarantine roles on the server.
    pub(crate) role_holders: Vec<RoleHolders>,
}

impl ServerStats {
    pub(crate) fn new(members: &[Member], guild: &Guild, mapping: &RoleMapping) -> Self {
        let total_members = members.len();
        let linked: Vec<&str> = members
            .iter()
            .filter_map(|m| m.discord_handle.as_deref())
            .collect();
        let in_guild = linked
            .iter()
            .filter(|handle| guild.resolve(handle).is_some())
            .count();

        let counts = members.iter().map(|m| m.title).counts();
        let titles = Title::ALL
            .into_iter()
            .map(|title| {
                let count = counts.get(&title).copied().unwrap_or(0);
                TitleShare {
                    title,
                    count,
                    percentage: percentage(count, total_members),
                }
            })
            .collect();

        let names = mapping.names();
        let role_holders = [&names.community, &names.quarantine]
            .into_iter()
            .map(|name| RoleHolders {
                role: name.clone(),
                count: guild.role_named(name).map_or(0, |role| {
                    guild.accounts.iter().filter(|a| a.has_role(role.id)).count()
                }),
            })
            .collect();

        Self {
            total_members,
            linked_members: linked.len(),
            link_adoption: percentage(linked.len(), total_members),
            in_guild,
            guild_presence: percentage(in_guild, linked.len()),
            titles,
            role_holders,
        }
    }
}

impl fmt::Display for ServerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Members: {} ({} linked, {:.1}% link adoption)",
            self.total_members, self.linked_members, self.link_adoption
        )?;
        writeln!(
            f,
            "On the Discord server: {} of {} linked ({:.1}%)",
            self.in_guild, self.linked_members, self.guild_presence
        )?;
        writeln!(f, "Titles:")?;
        for TitleShare {
            title,
            count,
            percentage,
        } in &self.titles
        {
            writeln!(f, "  {:<14} {count:>6} {percentage:>6.1}%", title.to_string())?;
        }
        let holders = self
            .role_holders
            .iter()
            .map(|h| format!("`{}` {}", h.role, h.count))
            .join(", ");
        write!(f, "Role holders: {holders}")
    }
}
