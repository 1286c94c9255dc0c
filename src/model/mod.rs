use serde::Serialize;

use crate::db::dao;

mod title;

pub(crate) use title::{Title, UnknownTitle};

/// A member record of the directory.
///
/// For database operations, [`Member`] is converted from [`crate::db::dao::Member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Member {
    pub(crate) id: i64,
    /// Discord username as linked by the member, possibly with a legacy `#1234` suffix.
    pub(crate) discord_handle: Option<String>,
    pub(crate) title: Title,
}

/// Optional restrictions for listing the directory.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MemberFilter {
    pub(crate) has_discord_handle: Option<bool>,
    pub(crate) title: Option<Title>,
}

impl MemberFilter {
    pub(crate) fn linked() -> Self {
        Self {
            has_discord_handle: Some(true),
            title: None,
        }
    }

    pub(crate) fn with_title(title: Title) -> Self {
        Self {
            has_discord_handle: None,
            title: Some(title),
        }
    }

    /// In-memory counterpart of the SQL filter.
    #[cfg(test)]
    pub(crate) fn matches(&self, member: &Member) -> bool {
        if let Some(linked) = self.has_discord_handle {
            if member.discord_handle.is_some() != linked {
                return false;
            }
        }
        self.title.map_or(true, |title| member.title == title)
    }
}

impl TryFrom<dao::Member> for Member {
    type Error = UnknownTitle;

    fn try_from(
        dao::Member {
            id,
            discord_handle,
            title,
        }: dao::Member,
    ) -> Result<Self, Self::Error> {
        let title: Title = title.parse()?;
        let discord_handle = discord_handle
            .map(|handle| handle.trim().to_owned())
            .filter(|handle| !handle.is_empty());
        Ok(Self {
            id,
            discord_handle,
            title,
        })
    }
}
