use core::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{
    guard,
    mapping::{RoleMapping, RoleTarget},
    mutator::{Mutation, RoleMutator},
};
use crate::{
    error::{Error, Result},
    guild::{self, find_role, ExternalAccount, ExternalRole, Guild, GuildApi},
    model::{Member, Title},
};

/// Whether the reconciler mutates Discord or only reports what it would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Apply,
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SyncStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum StepAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "result", content = "detail")]
pub(crate) enum StepResult {
    Applied,
    Unchanged,
    /// Would be applied outside of a dry run.
    Planned,
    Failed(String),
}

/// One role change attempted for a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Step {
    pub(crate) action: StepAction,
    pub(crate) role: String,
    pub(crate) result: StepResult,
}

/// Result of reconciling one member. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SyncOutcome {
    pub(crate) member_id: i64,
    pub(crate) discord_handle: Option<String>,
    pub(crate) title: Title,
    pub(crate) status: SyncStatus,
    /// Reason code, present when the status is not `success`.
    pub(crate) reason: Option<String>,
    pub(crate) steps: Vec<Step>,
}

impl SyncOutcome {
    pub(crate) fn changed(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.result, StepResult::Applied | StepResult::Planned))
    }
}

/// A [`SyncOutcome`] together with the errors behind it.
#[derive(Debug)]
pub(crate) struct Reconciliation {
    pub(crate) outcome: SyncOutcome,
    pub(crate) errors: Vec<Error>,
}

impl Reconciliation {
    fn new(member: &Member) -> Self {
        Self {
            outcome: SyncOutcome {
                member_id: member.id,
                discord_handle: member.discord_handle.clone(),
                title: member.title,
                status: SyncStatus::Success,
                reason: None,
                steps: Vec::new(),
            },
            errors: Vec::new(),
        }
    }

    fn skipped(mut self, err: Error) -> Self {
        self.outcome.status = SyncStatus::Skipped;
        self.outcome.reason = Some(err.code().to_owned());
        self.errors.push(err);
        self
    }

    fn fail(&mut self, err: Error) {
        if self.outcome.status != SyncStatus::Failed {
            self.outcome.status = SyncStatus::Failed;
            self.outcome.reason = Some(err.code().to_owned());
        }
        self.errors.push(err);
    }

    /// The first error, if any, otherwise the outcome.
    pub(crate) fn into_result(self) -> Result<SyncOutcome> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.outcome),
        }
    }
}

struct PlannedStep {
    action: StepAction,
    role: ExternalRole,
}

/// Brings members' Discord roles in line with their titles.
///
/// States of a member: unlinked, pending resolution, active (community role) and
/// quarantined (quarantine role). Any state can be reconciled towards any other, and
/// reconciling twice is the same as reconciling once.
pub(crate) struct Reconciler<'a> {
    api: &'a dyn GuildApi,
    mapping: &'a RoleMapping,
    guild: Guild,
}

impl<'a> Reconciler<'a> {
    pub(crate) fn new(api: &'a dyn GuildApi, mapping: &'a RoleMapping, guild: Guild) -> Self {
        Self {
            api,
            mapping,
            guild,
        }
    }

    /// Takes a fresh snapshot of the server.
    pub(crate) async fn connect(api: &'a dyn GuildApi, mapping: &'a RoleMapping) -> Result<Self> {
        let guild = guild::fetch_guild(api).await?;
        Ok(Self::new(api, mapping, guild))
    }

    pub(crate) fn guild(&self) -> &Guild {
        &self.guild
    }

    #[instrument(skip_all, fields(member_id = member.id, title = %member.title))]
    pub(crate) async fn reconcile(&mut self, member: &Member, mode: Mode) -> Reconciliation {
        let mut rec = Reconciliation::new(member);

        let Some(handle) = member.discord_handle.as_deref() else {
            info!("Member has no linked account");
            return rec.skipped(Error::NotLinked(member.id));
        };
        let Some(idx) = guild::resolve(&self.guild.accounts, handle) else {
            info!(handle, "Account has not joined the server");
            return rec.skipped(Error::AccountNotInGuild(handle.to_owned()));
        };

        let plan = match self.plan(member.title) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(%err, "Cannot reconcile member");
                rec.fail(err);
                return rec;
            }
        };

        let account = &mut self.guild.accounts[idx];
        match mode {
            Mode::Apply => {
                let mutator = RoleMutator::new(self.api, self.guild.acting_position);
                apply(rec, &mutator, account, plan).await
            }
            Mode::DryRun => preview(rec, self.guild.acting_position, account, plan),
        }
    }

    /// Steps towards the target state of `title`, in execution order.
    ///
    /// Fails without any step when the role the member should end up with is missing,
    /// so that a member is never left holding neither role.
    fn plan(&self, title: Title) -> Result<Vec<PlannedStep>> {
        let names = self.mapping.names();
        let target_name = self.mapping.map_title_to_role(title);
        let target = find_role(&self.guild.roles, target_name)
            .cloned()
            .ok_or_else(|| Error::RoleNotConfigured(target_name.to_owned()))?;

        let removals: Vec<&str> = match self.mapping.target(title) {
            RoleTarget::Community if names.onboarding_is_distinct() => {
                vec![names.quarantine.as_str(), names.onboarding.as_str()]
            }
            RoleTarget::Community => vec![names.quarantine.as_str()],
            RoleTarget::Quarantine => vec![names.community.as_str()],
        };

        let mut plan: Vec<PlannedStep> = removals
            .into_iter()
            .filter_map(|name| find_role(&self.guild.roles, name))
            .map(|role| PlannedStep {
                action: StepAction::Remove,
                role: role.clone(),
            })
            .collect();
        plan.push(PlannedStep {
            action: StepAction::Add,
            role: target,
        });
        Ok(plan)
    }
}

/// Every step is attempted, even after an earlier one failed.
async fn apply(
    mut rec: Reconciliation,
    mutator: &RoleMutator<'_>,
    account: &mut ExternalAccount,
    plan: Vec<PlannedStep>,
) -> Reconciliation {
    for PlannedStep { action, role } in plan {
        let res = match action {
            StepAction::Add => mutator.add_role(account, &role).await,
            StepAction::Remove => mutator.remove_role(account, &role).await,
        };
        let result = match res {
            Ok(Mutation::Applied) => StepResult::Applied,
            Ok(Mutation::Unchanged) => StepResult::Unchanged,
            Err(err) => {
                warn!(role = %role.name, %err, "Reconciliation step failed");
                let result = StepResult::Failed(err.to_string());
                rec.fail(err);
                result
            }
        };
        rec.outcome.steps.push(Step {
            action,
            role: role.name,
            result,
        });
    }
    rec
}

/// Reports the steps an [`apply`] would take, including the ones it would be refused.
fn preview(
    mut rec: Reconciliation,
    acting_position: i64,
    account: &ExternalAccount,
    plan: Vec<PlannedStep>,
) -> Reconciliation {
    for PlannedStep { action, role } in plan {
        let needed = match action {
            StepAction::Add => !account.has_role(role.id),
            StepAction::Remove => account.has_role(role.id),
        };
        let result = if !needed {
            StepResult::Unchanged
        } else if let Err(rule) = guard::check(acting_position, &role, account) {
            let err = Error::InsufficientPrivilege {
                role: role.name.clone(),
                rule,
            };
            let result = StepResult::Failed(err.to_string());
            rec.fail(err);
            result
        } else {
            StepResult::Planned
        };
        rec.outcome.steps.push(Step {
            action,
            role: role.name,
            result,
        });
    }
    rec
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Step {
            action,
            role,
            result,
        } = self;
        match result {
            StepResult::Applied => write!(f, "{action} `{role}`: done"),
            StepResult::Unchanged => write!(f, "{action} `{role}`: nothing to do"),
            StepResult::Planned => write!(f, "{action} `{role}`: would be applied"),
            StepResult::Failed(reason) => write!(f, "{action} `{role}`: failed ({reason})"),
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle = self.discord_handle.as_deref().unwrap_or("<unlinked>");
        let status = match self.status {
            SyncStatus::Success => "success",
            SyncStatus::Skipped => "skipped",
            SyncStatus::Failed => "failed",
        };
        write!(f, "#{} {handle} ({}): {status}", self.member_id, self.title)?;
        if let Some(reason) = &self.reason {
            write!(f, " [{reason}]")?;
        }
        for step in &self.steps {
            write!(f, "\n    {step}")?;
        }
        Ok(())
    }
}
