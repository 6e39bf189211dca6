//! Result carrier returned by every core operation.
//!
//! An [`Outcome`] holds either a value or a single classified [`Failure`]. Services
//! work with `Result<T, Failure>` internally so `?` composes dependency failures,
//! then hand an `Outcome` back across the public boundary.

use serde::{Deserialize, Serialize};

/// Coarse classification of a failure, used by callers to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Validation,
    Unauthorized,
    Error,
}

impl FailureKind {
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Validation => "validation",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    #[default]
    Error,
    Warning,
    Info,
}

/// A single precondition violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub severity: ValidationSeverity,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            identifier: None,
            message: message.into(),
            code: None,
            severity: ValidationSeverity::Error,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_severity(mut self, severity: ValidationSeverity) -> Self {
        self.severity = severity;
        self
    }
}

const DEFAULT_NOT_FOUND: &str = "resource not found";

/// Classified failure. `Validation` always carries at least one entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    #[error("{message}")]
    NotFound { message: String },
    #[error("validation failed: {}", join_validation(.errors))]
    Validation { errors: Vec<ValidationError> },
    #[error("unauthorized")]
    Unauthorized,
    #[error("{message}")]
    Error { message: String },
}

fn join_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Failure {
    pub fn not_found(message: impl Into<String>) -> Self {
        Failure::NotFound {
            message: message.into(),
        }
    }

    /// Builds a validation failure; an empty list collapses to one generic entry.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        let errors = if errors.is_empty() {
            vec![ValidationError::new("validation failed")]
        } else {
            errors
        };
        Failure::Validation { errors }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Failure::Error {
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FailureKind {
        match self {
            Failure::NotFound { .. } => FailureKind::NotFound,
            Failure::Validation { .. } => FailureKind::Validation,
            Failure::Unauthorized => FailureKind::Unauthorized,
            Failure::Error { .. } => FailureKind::Error,
        }
    }

    /// Human readable messages; never empty.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Failure::Validation { errors } => {
                errors.iter().map(|error| error.message.clone()).collect()
            }
            other => vec![other.to_string()],
        }
    }

    /// Prefixes the failure message with caller context while keeping its kind.
    pub fn with_context(self, context: &str) -> Self {
        match self {
            Failure::NotFound { message } => Failure::NotFound {
                message: format!("{context}: {message}"),
            },
            Failure::Error { message } => Failure::Error {
                message: format!("{context}: {message}"),
            },
            Failure::Validation { mut errors } => {
                for error in &mut errors {
                    error.message = format!("{context}: {}", error.message);
                }
                Failure::Validation { errors }
            }
            Failure::Unauthorized => Failure::Unauthorized,
        }
    }
}

/// Success value or classified failure. Constructed once and never mutated.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Outcome::Failure(Failure::not_found(message))
    }

    pub fn not_found_default() -> Self {
        Outcome::Failure(Failure::not_found(DEFAULT_NOT_FOUND))
    }

    pub fn validation_errors(errors: Vec<ValidationError>) -> Self {
        Outcome::Failure(Failure::validation(errors))
    }

    pub fn unauthorized() -> Self {
        Outcome::Failure(Failure::Unauthorized)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Failure(Failure::error(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(failure) => Some(failure),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure().map(Failure::kind)
    }

    /// Consumes the outcome and returns the success value.
    ///
    /// # Panics
    ///
    /// Reading the value of a failed outcome is a contract violation: callers must
    /// branch on [`Outcome::is_success`] (or use [`Outcome::into_result`]) first.
    pub fn into_value(self) -> T {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failure(failure) => {
                panic!("read the value of a failed outcome: {failure}")
            }
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        self.into()
    }

    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    pub fn and_then<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> Outcome<U>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(failure) => Outcome::Failure(failure),
        }
    }

    pub fn with_context(self, context: &str) -> Self {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(failure) => Outcome::Failure(failure.with_context(context)),
        }
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(failure) => Outcome::Failure(failure),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Failure> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}
