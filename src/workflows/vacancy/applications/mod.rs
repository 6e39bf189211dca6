//! Application intake: eligibility rules, cached listings and the admission path.

pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{Application, ApplicationId, ApplicationRequest, ApplicationStatus};
pub use eligibility::{Admission, DenialReason, EligibilityEngine, EligibilityPolicy};
pub use repository::{
    applicant_listing_key, vacancy_listing_key, ApplicationListingCache, ApplicationRepository,
    CachePolicy, CachedApplicationRepository, InMemoryApplicationRepository,
};
pub use service::ApplicationService;
