use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outcome::{Failure, ValidationError};
use crate::store::Entity;
use crate::workflows::users::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(pub Uuid);

impl VacancyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VacancyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VacancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Publication state. Archival is tracked separately by `Vacancy::is_archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacancyStatus {
    #[default]
    Draft,
    Active,
    Inactive,
}

impl VacancyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Status reached by applying `action`.
    ///
    /// Post always lands on Active and Deactivate on Inactive, from any status.
    /// Deactivating a draft closes intake before it was ever published.
    pub const fn apply(self, action: LifecycleAction) -> Self {
        match action {
            LifecycleAction::Post => Self::Active,
            LifecycleAction::Deactivate => Self::Inactive,
        }
    }
}

impl fmt::Display for VacancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Post,
    Deactivate,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Post => f.write_str("post"),
            LifecycleAction::Deactivate => f.write_str("deactivate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("vacancy {0} is archived and cannot change state")]
    Archived(VacancyId),
}

impl TransitionError {
    pub const fn code(&self) -> &'static str {
        match self {
            TransitionError::Archived(_) => "vacancy_archived",
        }
    }
}

impl From<TransitionError> for Failure {
    fn from(error: TransitionError) -> Self {
        Failure::validation(vec![ValidationError::new(error.to_string())
            .with_identifier("status")
            .with_code(error.code())])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub title: String,
    pub description: String,
    pub employer_id: UserId,
    pub max_applications: u32,
    pub current_applications: u32,
    pub expiry_date: DateTime<Utc>,
    pub is_archived: bool,
    pub status: VacancyStatus,
}

impl Vacancy {
    /// Applies a lifecycle action in place. Archived vacancies are terminal.
    pub fn transition(&mut self, action: LifecycleAction) -> Result<(), TransitionError> {
        if self.is_archived {
            return Err(TransitionError::Archived(self.id));
        }
        self.status = self.status.apply(action);
        Ok(())
    }

    pub fn has_capacity(&self) -> bool {
        self.current_applications < self.max_applications
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.max_applications.saturating_sub(self.current_applications)
    }

    /// Expired once the expiry instant falls before the start of `now`'s UTC day.
    pub fn is_expired_as_of(&self, now: DateTime<Utc>) -> bool {
        !self.is_archived && self.expiry_date < start_of_utc_day(now)
    }

    pub fn matches_term(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

impl Entity for Vacancy {
    type Id = VacancyId;
    const KIND: &'static str = "vacancy";

    fn id(&self) -> &VacancyId {
        &self.id
    }
}

pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Employer supplied fields for a new vacancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVacancy {
    pub title: String,
    pub description: String,
    pub employer_id: UserId,
    pub max_applications: u32,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<VacancyStatus>,
}

impl NewVacancy {
    pub fn into_vacancy(self, id: VacancyId) -> Vacancy {
        Vacancy {
            id,
            title: self.title,
            description: self.description,
            employer_id: self.employer_id,
            max_applications: self.max_applications,
            current_applications: 0,
            expiry_date: self.expiry_date,
            is_archived: false,
            status: self.status.unwrap_or_default(),
        }
    }
}

/// Editable fields of an existing vacancy. Status, counters and the archive flag
/// are owned by the lifecycle and admission paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacancyUpdate {
    pub title: String,
    pub description: String,
    pub max_applications: u32,
    pub expiry_date: DateTime<Utc>,
}
