use std::sync::Arc;

use tracing::{error, info, warn};

use super::domain::{Application, ApplicationId, ApplicationRequest};
use super::eligibility::{Admission, EligibilityEngine, EligibilityPolicy};
use super::repository::ApplicationRepository;
use crate::clock::Clock;
use crate::outcome::{Failure, Outcome};
use crate::store::EntityStore;
use crate::workflows::users::{UserAccount, UserId};
use crate::workflows::vacancy::domain::VacancyId;
use crate::workflows::vacancy::locks::AdmissionLocks;
use crate::workflows::vacancy::repository::VacancyRepository;

/// Service composing the eligibility engine, the repositories and the admission locks.
pub struct ApplicationService<V, A, U> {
    vacancies: Arc<V>,
    applications: Arc<A>,
    engine: EligibilityEngine<V, A, U>,
    locks: Arc<AdmissionLocks>,
    clock: Arc<dyn Clock>,
}

impl<V, A, U> ApplicationService<V, A, U>
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
        let engine = EligibilityEngine::new(
            vacancies.clone(),
            applications.clone(),
            users,
            clock.clone(),
            policy,
        );
        Self {
            vacancies,
            applications,
            engine,
            locks: Arc::new(AdmissionLocks::new()),
            clock,
        }
    }

    /// Shares admission locks with the lifecycle so both paths serialize per vacancy.
    pub fn with_locks(mut self, locks: Arc<AdmissionLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn engine(&self) -> &EligibilityEngine<V, A, U> {
        &self.engine
    }

    /// Submits a pending application and bumps the vacancy's counter.
    ///
    /// The eligibility check, the insert and the counter update run while holding the
    /// applicant and vacancy locks, so concurrent submissions cannot both pass the
    /// rate limit or overrun capacity. A denial is reported as `NotFound`.
    pub fn apply_to_vacancy(&self, request: ApplicationRequest) -> Outcome<Application> {
        let slots = self.locks.admission(&request.applicant_id, &request.vacancy_id);
        let _guard = slots.acquire();
        self.admit(request).into()
    }

    fn admit(&self, request: ApplicationRequest) -> Result<Application, Failure> {
        let assessment = self
            .engine
            .check(&request.vacancy_id, &request.applicant_id)?;
        if let Admission::Denied(reason) = &assessment.admission {
            return Err(Failure::not_found(format!(
                "cannot apply to vacancy: {}",
                reason.summary()
            )));
        }

        let application = Application::pending(
            assessment.vacancy.id,
            assessment.applicant.id,
            assessment.applicant.display_name(),
            self.clock.now(),
        );
        let stored = self.applications.add(application).into_result()?;

        let mut vacancy = assessment.vacancy;
        vacancy.current_applications = vacancy.current_applications.saturating_add(1);
        if let Err(failure) = self.vacancies.update(vacancy).into_result() {
            self.compensate(&stored);
            return Err(failure.with_context("recording application against vacancy"));
        }

        info!(
            application_id = %stored.id,
            vacancy_id = %stored.vacancy_id,
            applicant_id = %stored.applicant_id,
            "application submitted"
        );
        Ok(stored)
    }

    fn compensate(&self, application: &Application) {
        match self.applications.delete(&application.id) {
            Outcome::Success(_) => warn!(
                application_id = %application.id,
                "rolled back application after counter update failed"
            ),
            Outcome::Failure(failure) => error!(
                application_id = %application.id,
                error = %failure,
                "unable to roll back application; counter and listings disagree"
            ),
        }
    }

    pub fn assess(&self, vacancy_id: &VacancyId, applicant_id: &UserId) -> Outcome<Admission> {
        self.engine.assess(vacancy_id, applicant_id)
    }

    pub fn can_apply(&self, vacancy_id: &VacancyId, applicant_id: &UserId) -> Outcome<bool> {
        self.engine.can_apply(vacancy_id, applicant_id)
    }

    pub fn get_application(&self, application_id: &ApplicationId) -> Outcome<Application> {
        self.applications.get_by_id(application_id)
    }

    /// Every application the applicant submitted; empty when there are none.
    pub fn applications_by_applicant(&self, applicant_id: &UserId) -> Outcome<Vec<Application>> {
        self.applications.by_applicant(applicant_id)
    }

    /// Applications received by a vacancy; `NotFound` when the vacancy does not exist.
    pub fn applicants_for_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vec<Application>> {
        self.vacancies
            .get_by_id(vacancy_id)
            .and_then(|vacancy| self.applications.by_vacancy(&vacancy.id))
    }

    /// Applications the applicant submitted on the current UTC day.
    pub fn count_applications_today(&self, applicant_id: &UserId) -> Outcome<usize> {
        let today = self.clock.now().date_naive();
        self.applications.count_on_day(applicant_id, today)
    }
}
