use std::collections::BTreeMap;

use crate::{
    error::{Error, Result},
    model::Title,
};

/// Which of the two mutually exclusive roles a title calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoleTarget {
    /// The shared community role held by every active member.
    Community,
    /// Held by suspended members instead of the community role.
    Quarantine,
}

/// Captain, organiser and mentor roles are granted by hand on top of the community role,
/// this table never assigns them.
const TITLE_TARGETS: [(Title, RoleTarget); 7] = [
    (Title::Basher, RoleTarget::Community),
    (Title::CaptainBash, RoleTarget::Community),
    (Title::Organiser, RoleTarget::Community),
    (Title::Mentor, RoleTarget::Community),
    (Title::LegacyBasher, RoleTarget::Community),
    (Title::Rookie, RoleTarget::Community),
    (Title::NullBasher, RoleTarget::Quarantine),
];

/// Names of the Discord roles the engine manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoleNames {
    pub(crate) community: String,
    pub(crate) quarantine: String,
    /// Granted on join. Usually the quarantine role itself.
    pub(crate) onboarding: String,
}

impl RoleNames {
    pub(crate) fn onboarding_is_distinct(&self) -> bool {
        !self.onboarding.eq_ignore_ascii_case(&self.quarantine)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RoleMapping {
    targets: BTreeMap<Title, RoleTarget>,
    names: RoleNames,
}

impl RoleMapping {
    pub(crate) fn new(names: RoleNames) -> Result<Self> {
        Self::from_table(&TITLE_TARGETS, names)
    }

    /// Builds the mapping, rejecting tables that are not total over [`Title`]
    /// or that list a title twice.
    fn from_table(table: &[(Title, RoleTarget)], names: RoleNames) -> Result<Self> {
        let mut targets = BTreeMap::new();
        for &(title, target) in table {
            if targets.insert(title, target).is_some() {
                return Err(Error::AmbiguousMapping(title));
            }
        }
        if let Some(missing) = Title::ALL.into_iter().find(|t| !targets.contains_key(t)) {
            return Err(Error::IncompleteMapping(missing));
        }
        Ok(Self { targets, names })
    }

    pub(crate) fn target(&self, title: Title) -> RoleTarget {
        match self.targets.get(&title) {
            Some(target) => *target,
            None => unreachable!("The role mapping is validated to be total"),
        }
    }

    /// Name of the Discord role a member with `title` should hold.
    pub(crate) fn map_title_to_role(&self, title: Title) -> &str {
        match self.target(title) {
            RoleTarget::Community => &self.names.community,
            RoleTarget::Quarantine => &self.names.quarantine,
        }
    }

    pub(crate) fn names(&self) -> &RoleNames {
        &self.names
    }
}
