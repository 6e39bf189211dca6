pub mod applications;

pub mod domain;
pub mod lifecycle;
pub mod locks;
pub mod repository;
pub mod service;

pub use domain::{
    LifecycleAction, NewVacancy, TransitionError, Vacancy, VacancyId, VacancyStatus, VacancyUpdate,
};
pub use lifecycle::{SweepFailure, SweepReport, VacancyLifecycle};
pub use locks::AdmissionLocks;
pub use repository::{InMemoryVacancyRepository, VacancyRepository};
pub use service::VacancyService;
