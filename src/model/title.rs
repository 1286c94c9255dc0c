use core::{fmt, str::FromStr};

use serde::Serialize;

/// Internal role classification of a community member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub(crate) enum Title {
    Basher,
    CaptainBash,
    Organiser,
    Mentor,
    LegacyBasher,
    Rookie,
    NullBasher,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown title `{0}`")]
pub(crate) struct UnknownTitle(pub(crate) String);

impl Title {
    pub(crate) const ALL: [Title; 7] = [
        Title::Basher,
        Title::CaptainBash,
        Title::Organiser,
        Title::Mentor,
        Title::LegacyBasher,
        Title::Rookie,
        Title::NullBasher,
    ];

    /// Spelling stored in the `members.title` column.
    pub(crate) fn as_db_str(self) -> &'static str {
        match self {
            Title::Basher => "Basher",
            Title::CaptainBash => "CaptainBash",
            Title::Organiser => "Organiser",
            Title::Mentor => "Mentor",
            Title::LegacyBasher => "LegacyBasher",
            Title::Rookie => "Rookie",
            Title::NullBasher => "NullBasher",
        }
    }

    pub(crate) fn is_quarantined(self) -> bool {
        self == Title::NullBasher
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Title::Basher => "Basher",
            Title::CaptainBash => "Captain Bash",
            Title::Organiser => "Organiser",
            Title::Mentor => "Mentor",
            Title::LegacyBasher => "Legacy Basher",
            Title::Rookie => "Rookie",
            Title::NullBasher => "Null Basher",
        };
        f.write_str(name)
    }
}

/// Accepts the database spelling as well as the display spelling,
/// ignoring case, whitespace, `_` and `-`.
impl FromStr for Title {
    type Err = UnknownTitle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Title::ALL
            .into_iter()
            .find(|title| title.as_db_str().eq_ignore_ascii_case(&folded))
            .ok_or_else(|| UnknownTitle(s.to_owned()))
    }
}
