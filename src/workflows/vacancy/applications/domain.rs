use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Entity;
use crate::workflows::users::UserId;
use crate::workflows::vacancy::domain::VacancyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Review state. The core only ever creates `Pending`; later states are set by reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub vacancy_id: VacancyId,
    pub applicant_id: UserId,
    pub applicant_name: String,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
}

impl Application {
    pub fn pending(
        vacancy_id: VacancyId,
        applicant_id: UserId,
        applicant_name: impl Into<String>,
        application_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            vacancy_id,
            applicant_id,
            applicant_name: applicant_name.into(),
            application_date,
            status: ApplicationStatus::Pending,
        }
    }
}

impl Entity for Application {
    type Id = ApplicationId;
    const KIND: &'static str = "application";

    fn id(&self) -> &ApplicationId {
        &self.id
    }
}

/// Inbound apply request; the applicant name and date are filled in by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub vacancy_id: VacancyId,
    pub applicant_id: UserId,
}
