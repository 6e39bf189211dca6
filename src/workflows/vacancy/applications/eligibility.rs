use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::repository::ApplicationRepository;
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::outcome::{Failure, Outcome};
use crate::store::EntityStore;
use crate::workflows::users::{UserAccount, UserId};
use crate::workflows::vacancy::domain::{Vacancy, VacancyId, VacancyStatus};
use crate::workflows::vacancy::repository::VacancyRepository;

/// Admission rules applied before an application is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// An applicant may submit at most one application per window, across all vacancies.
    pub rate_limit_window: Duration,
    pub enforce_capacity: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for EligibilityPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            rate_limit_window: config.rate_limit_window(),
            enforce_capacity: config.enforce_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Admission {
    Eligible,
    Denied(DenialReason),
}

impl Admission {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Admission::Eligible)
    }

    pub fn summary(&self) -> String {
        match self {
            Admission::Eligible => "eligible to apply".to_string(),
            Admission::Denied(reason) => reason.summary(),
        }
    }
}

/// Why an otherwise valid applicant may not apply right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    VacancyArchived,
    VacancyInactive,
    CapacityReached {
        max_applications: u32,
    },
    RecentApplication {
        last_applied_at: DateTime<Utc>,
        retry_after: DateTime<Utc>,
    },
}

impl DenialReason {
    pub const fn code(&self) -> &'static str {
        match self {
            DenialReason::VacancyArchived => "vacancy_archived",
            DenialReason::VacancyInactive => "vacancy_inactive",
            DenialReason::CapacityReached { .. } => "capacity_reached",
            DenialReason::RecentApplication { .. } => "recent_application",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            DenialReason::VacancyArchived => "vacancy is archived".to_string(),
            DenialReason::VacancyInactive => "vacancy is not accepting applications".to_string(),
            DenialReason::CapacityReached { max_applications } => {
                format!("vacancy reached its limit of {max_applications} applications")
            }
            DenialReason::RecentApplication { retry_after, .. } => format!(
                "applicant already applied recently; next application allowed after {}",
                retry_after.to_rfc3339()
            ),
        }
    }
}

/// Records loaded while assessing, so the admission path does not read them twice.
#[derive(Debug, Clone)]
pub(crate) struct Assessment {
    pub vacancy: Vacancy,
    pub applicant: UserAccount,
    pub admission: Admission,
}

/// Decides whether an applicant may apply to a vacancy at the current instant.
pub struct EligibilityEngine<V, A, U> {
    vacancies: Arc<V>,
    applications: Arc<A>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    policy: EligibilityPolicy,
}

impl<V, A, U> EligibilityEngine<V, A, U>
where
    V: VacancyRepository + 'static,
    A: ApplicationRepository + 'static,
    U: EntityStore<UserAccount> + 'static,
{
    pub fn new(
        vacancies: Arc<V>,
        applications: Arc<A>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        policy: EligibilityPolicy,
    ) -> Self {
        Self {
            vacancies,
            applications,
            users,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// Full decision including the denial reason.
    ///
    /// A missing vacancy or applicant is a `NotFound` failure; every rule violation is
    /// a successful `Denied` admission.
    pub fn assess(&self, vacancy_id: &VacancyId, applicant_id: &UserId) -> Outcome<Admission> {
        self.check(vacancy_id, applicant_id)
            .map(|assessment| assessment.admission)
            .into()
    }

    pub fn can_apply(&self, vacancy_id: &VacancyId, applicant_id: &UserId) -> Outcome<bool> {
        self.assess(vacancy_id, applicant_id)
            .map(|admission| admission.is_eligible())
    }

    pub(crate) fn check(
        &self,
        vacancy_id: &VacancyId,
        applicant_id: &UserId,
    ) -> Result<Assessment, Failure> {
        let vacancy = self.vacancies.get_by_id(vacancy_id).into_result()?;
        let applicant = self.users.get_by_id(applicant_id).into_result()?;
        let admission = self.rules(&vacancy, applicant_id)?;

        match &admission {
            Admission::Eligible => debug!(%vacancy_id, %applicant_id, "applicant eligible"),
            Admission::Denied(reason) => {
                warn!(%vacancy_id, %applicant_id, reason = reason.code(), "application denied")
            }
        }

        Ok(Assessment {
            vacancy,
            applicant,
            admission,
        })
    }

    fn rules(&self, vacancy: &Vacancy, applicant_id: &UserId) -> Result<Admission, Failure> {
        if vacancy.is_archived {
            return Ok(Admission::Denied(DenialReason::VacancyArchived));
        }
        // Drafts admit applications; only an explicit deactivation closes intake.
        if vacancy.status == VacancyStatus::Inactive {
            return Ok(Admission::Denied(DenialReason::VacancyInactive));
        }

        let window = self.policy.rate_limit_window;
        let since = self.clock.now() - window;
        if let Some(last) = self
            .applications
            .latest_since(applicant_id, since)
            .into_result()?
        {
            return Ok(Admission::Denied(DenialReason::RecentApplication {
                last_applied_at: last.application_date,
                retry_after: last.application_date + window,
            }));
        }

        if self.policy.enforce_capacity && !vacancy.has_capacity() {
            return Ok(Admission::Denied(DenialReason::CapacityReached {
                max_applications: vacancy.max_applications,
            }));
        }

        Ok(Admission::Eligible)
    }
}
