use core::fmt;

use serde::Serialize;

use crate::model::{Member, Title};

/// Output of `list-members`.
#[derive(Debug, Serialize)]
pub(crate) struct MemberListing {
    /// The title the listing was restricted to.
    pub(crate) title: Option<Title>,
    pub(crate) members: Vec<Member>,
}

impl fmt::Display for MemberListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.title {
            Some(title) => writeln!(f, "{} members titled {title}:", self.members.len())?,
            None => writeln!(f, "{} members:", self.members.len())?,
        }
        for Member {
            id,
            discord_handle,
            title,
        } in &self.members
        {
            let handle = discord_handle.as_deref().unwrap_or("-");
            writeln!(f, "{id:>8}  {handle:<32}  {title}")?;
        }
        Ok(())
    }
}
