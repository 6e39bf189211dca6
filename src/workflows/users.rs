use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Entity, InMemoryStore};

/// Identifier shared by employers and applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Employer,
    Applicant,
}

/// Account record owned by the identity collaborator; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl UserAccount {
    pub fn applicant(first_name: &str, last_name: &str) -> Self {
        Self::with_role(first_name, last_name, UserRole::Applicant)
    }

    pub fn employer(first_name: &str, last_name: &str) -> Self {
        Self::with_role(first_name, last_name, UserRole::Employer)
    }

    fn with_role(first_name: &str, last_name: &str, role: UserRole) -> Self {
        Self {
            id: UserId::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Entity for UserAccount {
    type Id = UserId;
    const KIND: &'static str = "user";

    fn id(&self) -> &UserId {
        &self.id
    }
}

pub type InMemoryUserStore = InMemoryStore<UserAccount>;
