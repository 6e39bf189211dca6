use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use super::domain::{Application, ApplicationId};
use crate::cache::{CacheKey, ReadThroughCache};
use crate::config::PolicyConfig;
use crate::outcome::Outcome;
use crate::store::{EntityStore, InMemoryStore};
use crate::workflows::users::UserId;
use crate::workflows::vacancy::domain::VacancyId;

const BY_VACANCY: &str = "applications_by_vacancy";
const BY_APPLICANT: &str = "applications_by_applicant";

pub type ApplicationListingCache = ReadThroughCache<Application>;

pub fn vacancy_listing_key(vacancy_id: &VacancyId) -> CacheKey {
    CacheKey::new(BY_VACANCY, vacancy_id)
}

pub fn applicant_listing_key(applicant_id: &UserId) -> CacheKey {
    CacheKey::new(BY_APPLICANT, applicant_id)
}

/// Application persistence plus the listing and rate-limit queries.
pub trait ApplicationRepository: EntityStore<Application> {
    fn by_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vec<Application>>;
    fn by_applicant(&self, applicant_id: &UserId) -> Outcome<Vec<Application>>;

    /// Applications submitted by `applicant_id` on the given UTC calendar day.
    fn count_on_day(&self, applicant_id: &UserId, day: NaiveDate) -> Outcome<usize>;

    /// Most recent application by `applicant_id` dated at or after `since`.
    fn latest_since(
        &self,
        applicant_id: &UserId,
        since: DateTime<Utc>,
    ) -> Outcome<Option<Application>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryApplicationRepository {
    store: InMemoryStore<Application>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_applications(applications: impl IntoIterator<Item = Application>) -> Self {
        Self {
            store: InMemoryStore::with_rows(applications),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl EntityStore<Application> for InMemoryApplicationRepository {
    fn get_by_id(&self, id: &ApplicationId) -> Outcome<Application> {
        self.store.get_by_id(id)
    }

    fn get_all(&self) -> Outcome<Vec<Application>> {
        self.store.get_all()
    }

    fn add(&self, entity: Application) -> Outcome<Application> {
        self.store.add(entity)
    }

    fn update(&self, entity: Application) -> Outcome<Application> {
        self.store.update(entity)
    }

    fn delete(&self, id: &ApplicationId) -> Outcome<bool> {
        self.store.delete(id)
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn by_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vec<Application>> {
        self.store
            .filter(|application| application.vacancy_id == *vacancy_id)
    }

    fn by_applicant(&self, applicant_id: &UserId) -> Outcome<Vec<Application>> {
        self.store
            .filter(|application| application.applicant_id == *applicant_id)
    }

    fn count_on_day(&self, applicant_id: &UserId, day: NaiveDate) -> Outcome<usize> {
        self.store
            .filter(|application| {
                application.applicant_id == *applicant_id
                    && application.application_date.date_naive() == day
            })
            .map(|rows| rows.len())
    }

    fn latest_since(
        &self,
        applicant_id: &UserId,
        since: DateTime<Utc>,
    ) -> Outcome<Option<Application>> {
        self.store
            .filter(|application| {
                application.applicant_id == *applicant_id && application.application_date >= since
            })
            .map(|rows| {
                rows.into_iter()
                    .max_by_key(|application| application.application_date)
            })
    }
}

/// Listing cache behavior for [`CachedApplicationRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Drop the affected listing keys on every write. When off, listings may lag
    /// writes by up to `ttl`.
    pub invalidate_on_write: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for CachePolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            ttl: config.cache_ttl(),
            invalidate_on_write: config.invalidate_on_write,
        }
    }
}

/// Reads the two listing shapes through a shared cache; everything else goes
/// straight to the wrapped repository. The rate-limit query is never cached.
pub struct CachedApplicationRepository<R> {
    inner: Arc<R>,
    cache: Arc<ApplicationListingCache>,
    policy: CachePolicy,
}

impl<R> CachedApplicationRepository<R>
where
    R: ApplicationRepository,
{
    pub fn new(inner: Arc<R>, cache: Arc<ApplicationListingCache>, policy: CachePolicy) -> Self {
        Self {
            inner,
            cache,
            policy,
        }
    }

    pub fn cache(&self) -> &Arc<ApplicationListingCache> {
        &self.cache
    }

    fn invalidate_for(&self, application: &Application) {
        if !self.policy.invalidate_on_write {
            return;
        }
        let vacancy = self.cache.invalidate(&vacancy_listing_key(&application.vacancy_id));
        let applicant = self
            .cache
            .invalidate(&applicant_listing_key(&application.applicant_id));
        if vacancy || applicant {
            debug!(application_id = %application.id, "dropped listings touched by write");
        }
    }
}

impl<R> EntityStore<Application> for CachedApplicationRepository<R>
where
    R: ApplicationRepository,
{
    fn get_by_id(&self, id: &ApplicationId) -> Outcome<Application> {
        self.inner.get_by_id(id)
    }

    fn get_all(&self) -> Outcome<Vec<Application>> {
        self.inner.get_all()
    }

    fn add(&self, entity: Application) -> Outcome<Application> {
        let added = self.inner.add(entity);
        if let Some(application) = added.value() {
            self.invalidate_for(application);
        }
        added
    }

    fn update(&self, entity: Application) -> Outcome<Application> {
        // The previous row may sit under different listing keys.
        let previous = self.inner.get_by_id(&entity.id);
        let updated = self.inner.update(entity);
        if let Some(application) = updated.value() {
            if let Some(previous) = previous.value() {
                self.invalidate_for(previous);
            }
            self.invalidate_for(application);
        }
        updated
    }

    fn delete(&self, id: &ApplicationId) -> Outcome<bool> {
        let previous = self.inner.get_by_id(id);
        let deleted = self.inner.delete(id);
        if deleted.is_success() {
            if let Some(previous) = previous.value() {
                self.invalidate_for(previous);
            }
        }
        deleted
    }
}

impl<R> ApplicationRepository for CachedApplicationRepository<R>
where
    R: ApplicationRepository,
{
    fn by_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vec<Application>> {
        self.cache
            .get_or_load(&vacancy_listing_key(vacancy_id), self.policy.ttl, || {
                self.inner.by_vacancy(vacancy_id)
            })
    }

    fn by_applicant(&self, applicant_id: &UserId) -> Outcome<Vec<Application>> {
        self.cache
            .get_or_load(&applicant_listing_key(applicant_id), self.policy.ttl, || {
                self.inner.by_applicant(applicant_id)
            })
    }

    fn count_on_day(&self, applicant_id: &UserId, day: NaiveDate) -> Outcome<usize> {
        self.inner.count_on_day(applicant_id, day)
    }

    fn latest_since(
        &self,
        applicant_id: &UserId,
        since: DateTime<Utc>,
    ) -> Outcome<Option<Application>> {
        self.inner.latest_since(applicant_id, since)
    }
}
