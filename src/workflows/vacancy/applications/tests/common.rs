use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::clock::{Clock, ManualClock};
use crate::outcome::Outcome;
use crate::store::EntityStore;
use crate::workflows::users::{InMemoryUserStore, UserAccount, UserId};
use crate::workflows::vacancy::applications::domain::{Application, ApplicationId};
use crate::workflows::vacancy::applications::repository::{
    ApplicationRepository, InMemoryApplicationRepository,
};
use crate::workflows::vacancy::applications::{ApplicationService, EligibilityPolicy};
use crate::workflows::vacancy::domain::{NewVacancy, Vacancy, VacancyId, VacancyStatus};
use crate::workflows::vacancy::repository::{InMemoryVacancyRepository, VacancyRepository};

pub(super) fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub(super) fn vacancy(status: VacancyStatus, max_applications: u32) -> Vacancy {
    NewVacancy {
        title: "Payments Platform Engineer".to_string(),
        description: "Card settlement and reconciliation".to_string(),
        employer_id: UserId::new(),
        max_applications,
        expiry_date: opening_time() + Duration::days(30),
        status: Some(status),
    }
    .into_vacancy(VacancyId::new())
}

pub(super) fn applicant() -> UserAccount {
    UserAccount::applicant("Amina", "Haddad")
}

/// In-memory wiring around a manual clock, seeded with one applicant.
pub(super) struct Fixture<V = InMemoryVacancyRepository> {
    pub clock: ManualClock,
    pub vacancies: Arc<V>,
    pub applications: Arc<InMemoryApplicationRepository>,
    pub users: Arc<InMemoryUserStore>,
    pub applicant: UserAccount,
    pub service: ApplicationService<V, InMemoryApplicationRepository, InMemoryUserStore>,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(
        Arc::new(InMemoryVacancyRepository::new()),
        EligibilityPolicy::default(),
    )
}

pub(super) fn fixture_with<V>(vacancies: Arc<V>, policy: EligibilityPolicy) -> Fixture<V>
where
    V: VacancyRepository + 'static,
{
    let clock = ManualClock::new(opening_time());
    let applications = Arc::new(InMemoryApplicationRepository::new());
    let applicant = applicant();
    let users = Arc::new(InMemoryUserStore::with_rows([applicant.clone()]));
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let service = ApplicationService::new(
        vacancies.clone(),
        applications.clone(),
        users.clone(),
        shared_clock,
        policy,
    );

    Fixture {
        clock,
        vacancies,
        applications,
        users,
        applicant,
        service,
    }
}

impl<V: VacancyRepository + 'static> Fixture<V> {
    pub fn seed(&self, vacancy: Vacancy) -> Vacancy {
        self.vacancies.add(vacancy).into_value()
    }

    pub fn second_applicant(&self) -> UserAccount {
        self.users
            .add(UserAccount::applicant("Tomas", "Lindqvist"))
            .into_value()
    }
}

/// Vacancy store whose updates fail on demand, as a store losing its connection would.
#[derive(Default)]
pub(super) struct FlakyVacancies {
    inner: InMemoryVacancyRepository,
    fail_updates: AtomicBool,
}

impl FlakyVacancies {
    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

impl EntityStore<Vacancy> for FlakyVacancies {
    fn get_by_id(&self, id: &VacancyId) -> Outcome<Vacancy> {
        self.inner.get_by_id(id)
    }

    fn get_all(&self) -> Outcome<Vec<Vacancy>> {
        self.inner.get_all()
    }

    fn add(&self, entity: Vacancy) -> Outcome<Vacancy> {
        self.inner.add(entity)
    }

    fn update(&self, entity: Vacancy) -> Outcome<Vacancy> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Outcome::error("vacancy store unavailable");
        }
        self.inner.update(entity)
    }

    fn delete(&self, id: &VacancyId) -> Outcome<bool> {
        self.inner.delete(id)
    }
}

impl VacancyRepository for FlakyVacancies {
    fn search(&self, term: &str) -> Outcome<Vec<Vacancy>> {
        self.inner.search(term)
    }

    fn expired_as_of(&self, now: DateTime<Utc>) -> Outcome<Vec<Vacancy>> {
        self.inner.expired_as_of(now)
    }
}

/// Vacancy store that parks the next read until the test releases it.
pub(super) struct GatedVacancies {
    inner: InMemoryVacancyRepository,
    armed: AtomicBool,
    gate: Barrier,
}

impl GatedVacancies {
    pub fn new() -> Self {
        Self {
            inner: InMemoryVacancyRepository::new(),
            armed: AtomicBool::new(false),
            gate: Barrier::new(2),
        }
    }

    pub fn pause_next_read(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Blocks until the armed read has been reached.
    pub fn wait_until_paused(&self) {
        self.gate.wait();
    }

    pub fn resume(&self) {
        self.gate.wait();
    }
}

impl EntityStore<Vacancy> for GatedVacancies {
    fn get_by_id(&self, id: &VacancyId) -> Outcome<Vacancy> {
        let row = self.inner.get_by_id(id);
        if self.armed.swap(false, Ordering::SeqCst) {
            self.gate.wait();
            self.gate.wait();
        }
        row
    }

    fn get_all(&self) -> Outcome<Vec<Vacancy>> {
        self.inner.get_all()
    }

    fn add(&self, entity: Vacancy) -> Outcome<Vacancy> {
        self.inner.add(entity)
    }

    fn update(&self, entity: Vacancy) -> Outcome<Vacancy> {
        self.inner.update(entity)
    }

    fn delete(&self, id: &VacancyId) -> Outcome<bool> {
        self.inner.delete(id)
    }
}

impl VacancyRepository for GatedVacancies {
    fn search(&self, term: &str) -> Outcome<Vec<Vacancy>> {
        self.inner.search(term)
    }

    fn expired_as_of(&self, now: DateTime<Utc>) -> Outcome<Vec<Vacancy>> {
        self.inner.expired_as_of(now)
    }
}

/// Counts listing loads that reach the backing repository.
#[derive(Default)]
pub(super) struct CountingApplications {
    pub inner: InMemoryApplicationRepository,
    loads: AtomicUsize,
}

impl CountingApplications {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EntityStore<Application> for CountingApplications {
    fn get_by_id(&self, id: &ApplicationId) -> Outcome<Application> {
        self.inner.get_by_id(id)
    }

    fn get_all(&self) -> Outcome<Vec<Application>> {
        self.inner.get_all()
    }

    fn add(&self, entity: Application) -> Outcome<Application> {
        self.inner.add(entity)
    }

    fn update(&self, entity: Application) -> Outcome<Application> {
        self.inner.update(entity)
    }

    fn delete(&self, id: &ApplicationId) -> Outcome<bool> {
        self.inner.delete(id)
    }
}

impl ApplicationRepository for CountingApplications {
    fn by_vacancy(&self, vacancy_id: &VacancyId) -> Outcome<Vec<Application>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.by_vacancy(vacancy_id)
    }

    fn by_applicant(&self, applicant_id: &UserId) -> Outcome<Vec<Application>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.by_applicant(applicant_id)
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
