use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{NewVacancy, Vacancy, VacancyId, VacancyUpdate};
use super::locks::AdmissionLocks;
use super::repository::VacancyRepository;
use crate::outcome::{Failure, FailureKind, Outcome, ValidationError};

/// Employer-facing vacancy CRUD and search.
pub struct VacancyService<R> {
    repository: Arc<R>,
    locks: Arc<AdmissionLocks>,
}

impl<R> VacancyService<R>
where
    R: VacancyRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            locks: Arc::new(AdmissionLocks::new()),
        }
    }

    /// Edits and deletes hold the vacancy lock shared with admissions, so a
    /// concurrent counter bump is never overwritten by a stale row.
    pub fn with_locks(mut self, locks: Arc<AdmissionLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Fetches a vacancy; a missing row collapses to the generic not-found message.
    pub fn get_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vacancy> {
        match self.repository.get_by_id(vacancy_id) {
            Outcome::Failure(failure) if failure.kind() == FailureKind::NotFound => {
                Outcome::not_found_default()
            }
            other => other,
        }
    }

    pub fn list_vacancies(&self) -> Outcome<Vec<Vacancy>> {
        self.repository.get_all()
    }

    pub fn create_vacancy(&self, request: NewVacancy) -> Outcome<Vacancy> {
        if let Err(failure) = validate_fields(&request.title, request.max_applications) {
            return Outcome::Failure(failure);
        }
        let vacancy = request.into_vacancy(VacancyId::new());
        let created = self.repository.add(vacancy);
        if let Some(vacancy) = created.value() {
            info!(
                vacancy_id = %vacancy.id,
                employer_id = %vacancy.employer_id,
                status = %vacancy.status,
                "vacancy created"
            );
        }
        created
    }

    /// Replaces the editable fields, keeping status, counter and archive flag.
    pub fn update_vacancy(
        &self,
        vacancy_id: &VacancyId,
        update: VacancyUpdate,
    ) -> Outcome<Vacancy> {
        self.apply_update(vacancy_id, update).into()
    }

    fn apply_update(
        &self,
        vacancy_id: &VacancyId,
        update: VacancyUpdate,
    ) -> Result<Vacancy, Failure> {
        validate_fields(&update.title, update.max_applications)?;
        let slot = self.locks.vacancy(vacancy_id);
        let _guard = slot.acquire();
        let mut vacancy = self.get_vacancy(vacancy_id).into_result()?;

        if vacancy.is_archived {
            warn!(%vacancy_id, "refusing to edit an archived vacancy");
            return Err(Failure::validation(vec![ValidationError::new(format!(
                "vacancy {vacancy_id} is archived"
            ))
            .with_identifier("is_archived")
            .with_code("vacancy_archived")]));
        }
        if update.max_applications < vacancy.current_applications {
            return Err(Failure::validation(vec![ValidationError::new(format!(
                "max_applications cannot drop below the {} applications already received",
                vacancy.current_applications
            ))
            .with_identifier("max_applications")
            .with_code("below_current_applications")]));
        }

        vacancy.title = update.title;
        vacancy.description = update.description;
        vacancy.max_applications = update.max_applications;
        vacancy.expiry_date = update.expiry_date;

        let stored = self.repository.update(vacancy).into_result()?;
        info!(%vacancy_id, "vacancy updated");
        Ok(stored)
    }

    pub fn delete_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<bool> {
        let slot = self.locks.vacancy(vacancy_id);
        let _guard = slot.acquire();
        match self.repository.delete(vacancy_id) {
            Outcome::Failure(failure) if failure.kind() == FailureKind::NotFound => {
                Outcome::not_found_default()
            }
            other => other,
        }
    }

    pub fn search_vacancies(&self, term: &str) -> Outcome<Vec<Vacancy>> {
        if term.trim().is_empty() {
            return Outcome::validation_errors(vec![ValidationError::new(
                "search term must not be blank",
            )
            .with_identifier("term")
            .with_code("required")]);
        }
        self.repository.search(term)
    }
}

fn validate_fields(title: &str, max_applications: u32) -> Result<(), Failure> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(
            ValidationError::new("title must not be blank")
                .with_identifier("title")
                .with_code("required"),
        );
    }
    if max_applications == 0 {
        errors.push(
            ValidationError::new("max_applications must be at least 1")
                .with_identifier("max_applications")
                .with_code("out_of_range"),
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Failure::validation(errors))
    }
}
