use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use job_board::cache::ReadThroughCache;
use job_board::clock::Clock;
use job_board::config::PolicyConfig;
use job_board::workflows::users::InMemoryUserStore;
use job_board::workflows::vacancy::applications::{
    ApplicationListingCache, ApplicationService, CachePolicy, CachedApplicationRepository,
    EligibilityPolicy, InMemoryApplicationRepository,
};
use job_board::workflows::vacancy::{
    AdmissionLocks, InMemoryVacancyRepository, VacancyLifecycle, VacancyService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Vacancies = InMemoryVacancyRepository;
pub(crate) type Applications = CachedApplicationRepository<InMemoryApplicationRepository>;
pub(crate) type Users = InMemoryUserStore;

/// Every core service wired over one set of in-memory stores.
pub(crate) struct Services {
    pub(crate) vacancies: VacancyService<Vacancies>,
    pub(crate) lifecycle: VacancyLifecycle<Vacancies>,
    pub(crate) applications: ApplicationService<Vacancies, Applications, Users>,
    pub(crate) users: Arc<Users>,
    pub(crate) listings: Arc<ApplicationListingCache>,
}

impl Services {
    pub(crate) fn in_memory(policy: &PolicyConfig, clock: Arc<dyn Clock>) -> Self {
        let vacancy_store = Arc::new(InMemoryVacancyRepository::new());
        let users = Arc::new(InMemoryUserStore::new());
        let listings = Arc::new(ReadThroughCache::new(clock.clone()));
        let application_store = Arc::new(CachedApplicationRepository::new(
            Arc::new(InMemoryApplicationRepository::new()),
            listings.clone(),
            CachePolicy::from(policy),
        ));
        let locks = Arc::new(AdmissionLocks::new());

        let vacancies = VacancyService::new(vacancy_store.clone()).with_locks(locks.clone());
        let lifecycle = VacancyLifecycle::new(vacancy_store.clone(), clock.clone())
            .with_locks(locks.clone())
            .with_listing_cache(listings.clone());
        let applications = ApplicationService::new(
            vacancy_store,
            application_store,
            users.clone(),
            clock,
            EligibilityPolicy::from(policy),
        )
        .with_locks(locks);

        Self {
            vacancies,
            lifecycle,
            applications,
            users,
            listings,
        }
    }
}
