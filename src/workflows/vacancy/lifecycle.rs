use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::applications::repository::{vacancy_listing_key, ApplicationListingCache};
use super::domain::{LifecycleAction, Vacancy, VacancyId};
use super::locks::AdmissionLocks;
use super::repository::VacancyRepository;
use crate::clock::Clock;
use crate::outcome::{Failure, Outcome};

/// Owns vacancy state transitions and the expiry sweep.
pub struct VacancyLifecycle<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    locks: Arc<AdmissionLocks>,
    listings: Option<Arc<ApplicationListingCache>>,
}

/// Per-run summary of an expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub archived: Vec<VacancyId>,
    pub skipped: Vec<VacancyId>,
    pub failed: Vec<SweepFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub vacancy_id: VacancyId,
    pub reason: String,
}

impl SweepReport {
    pub fn summary(&self) -> String {
        format!(
            "scanned {}, archived {}, skipped {}, failed {}",
            self.scanned,
            self.archived.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

enum ArchiveResult {
    Archived,
    AlreadyArchived,
}

impl<R> VacancyLifecycle<R>
where
    R: VacancyRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            locks: Arc::new(AdmissionLocks::new()),
            listings: None,
        }
    }

    /// Shares the admission locks so lifecycle writes never interleave with an
    /// in-flight application against the same vacancy.
    pub fn with_locks(mut self, locks: Arc<AdmissionLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Drops the cached applicant listing of every vacancy the sweep archives.
    pub fn with_listing_cache(mut self, listings: Arc<ApplicationListingCache>) -> Self {
        self.listings = Some(listings);
        self
    }

    /// Publishes a vacancy (Draft or Inactive to Active).
    pub fn post(&self, vacancy_id: &VacancyId) -> Outcome<Vacancy> {
        self.transition(vacancy_id, LifecycleAction::Post).into()
    }

    /// Closes a vacancy to applications (any status to Inactive).
    pub fn deactivate(&self, vacancy_id: &VacancyId) -> Outcome<Vacancy> {
        self.transition(vacancy_id, LifecycleAction::Deactivate).into()
    }

    fn transition(
        &self,
        vacancy_id: &VacancyId,
        action: LifecycleAction,
    ) -> Result<Vacancy, Failure> {
        let slot = self.locks.vacancy(vacancy_id);
        let _guard = slot.acquire();

        let mut vacancy = self.repository.get_by_id(vacancy_id).into_result().map_err(|failure| {
            warn!(%vacancy_id, %action, error = %failure, "lifecycle target unavailable");
            failure
        })?;
        let from = vacancy.status;
        vacancy.transition(action).map_err(|err| {
            warn!(%vacancy_id, %action, error = %err, "rejected vacancy transition");
            Failure::from(err)
        })?;
        let stored = self.repository.update(vacancy).into_result()?;
        info!(%vacancy_id, %action, from = %from, to = %stored.status, "vacancy transitioned");
        Ok(stored)
    }

    /// Non-archived vacancies whose expiry lies before the start of today (UTC).
    pub fn expired_vacancies(&self) -> Outcome<Vec<Vacancy>> {
        self.repository.expired_as_of(self.clock.now())
    }

    /// Archives every expired vacancy, isolating failures per vacancy.
    ///
    /// Re-running is a no-op because the scan excludes archived rows. The aggregate
    /// is a failure only when at least one vacancy could not be archived.
    pub fn sweep_expired(&self) -> Outcome<SweepReport> {
        let now = self.clock.now();
        let expired = match self.repository.expired_as_of(now) {
            Outcome::Success(expired) => expired,
            Outcome::Failure(failure) => {
                error!(error = %failure, "unable to scan for expired vacancies");
                return Outcome::Failure(failure.with_context("scanning expired vacancies"));
            }
        };

        info!(count = expired.len(), "archiving expired vacancies");
        let mut report = SweepReport {
            scanned: expired.len(),
            ..SweepReport::default()
        };

        for vacancy in expired {
            let vacancy_id = vacancy.id;
            match self.archive(&vacancy_id) {
                Ok(ArchiveResult::Archived) => {
                    if let Some(listings) = &self.listings {
                        listings.invalidate(&vacancy_listing_key(&vacancy_id));
                    }
                    report.archived.push(vacancy_id);
                }
                Ok(ArchiveResult::AlreadyArchived) => report.skipped.push(vacancy_id),
                Err(failure) => {
                    error!(%vacancy_id, error = %failure, "error archiving vacancy");
                    report.failed.push(SweepFailure {
                        vacancy_id,
                        reason: failure.to_string(),
                    });
                }
            }
        }

        info!(summary = %report.summary(), "expiry sweep finished");
        if report.failed.is_empty() {
            return Outcome::success(report);
        }

        let failed_ids = join_ids(report.failed.iter().map(|failure| &failure.vacancy_id));
        let archived_ids = join_ids(report.archived.iter());
        error!(
            summary = %report.summary(),
            failed = %failed_ids,
            archived = %archived_ids,
            "expiry sweep incomplete"
        );
        Outcome::error(format!(
            "failed to archive {} of {} expired vacancies: {}; archived: [{}]",
            report.failed.len(),
            report.scanned,
            failed_ids,
            archived_ids
        ))
    }

    // Re-reads under the vacancy lock so a concurrent admission's counter update is kept.
    fn archive(&self, vacancy_id: &VacancyId) -> Result<ArchiveResult, Failure> {
        let slot = self.locks.vacancy(vacancy_id);
        let _guard = slot.acquire();

        let mut vacancy = self.repository.get_by_id(vacancy_id).into_result()?;
        if vacancy.is_archived {
            return Ok(ArchiveResult::AlreadyArchived);
        }
        vacancy.is_archived = true;
        self.repository.update(vacancy).into_result()?;
        info!(%vacancy_id, "archived expired vacancy");
        Ok(ArchiveResult::Archived)
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a VacancyId>) -> String {
    ids.map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
