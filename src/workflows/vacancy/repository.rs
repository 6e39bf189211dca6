use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{Vacancy, VacancyId};
use crate::outcome::Outcome;
use crate::store::{EntityStore, InMemoryStore};

/// Vacancy persistence with the queries the lifecycle and search paths need.
pub trait VacancyRepository: EntityStore<Vacancy> {
    /// Case-insensitive substring match over title or description.
    fn search(&self, term: &str) -> Outcome<Vec<Vacancy>>;

    /// Non-archived vacancies whose expiry falls before the start of `now`'s UTC day.
    fn expired_as_of(&self, now: DateTime<Utc>) -> Outcome<Vec<Vacancy>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryVacancyRepository {
    store: InMemoryStore<Vacancy>,
}

impl InMemoryVacancyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vacancies(vacancies: impl IntoIterator<Item = Vacancy>) -> Self {
        Self {
            store: InMemoryStore::with_rows(vacancies),
        }
    }
}

impl EntityStore<Vacancy> for InMemoryVacancyRepository {
    fn get_by_id(&self, id: &VacancyId) -> Outcome<Vacancy> {
        self.store.get_by_id(id)
    }

    fn get_all(&self) -> Outcome<Vec<Vacancy>> {
        self.store.get_all()
    }

    fn add(&self, entity: Vacancy) -> Outcome<Vacancy> {
        self.store.add(entity)
    }

    fn update(&self, entity: Vacancy) -> Outcome<Vacancy> {
        self.store.update(entity)
    }

    fn delete(&self, id: &VacancyId) -> Outcome<bool> {
        self.store.delete(id)
    }
}

impl VacancyRepository for InMemoryVacancyRepository {
    fn search(&self, term: &str) -> Outcome<Vec<Vacancy>> {
        let found = self.store.filter(|vacancy| vacancy.matches_term(term));
        if let Some(rows) = found.value() {
            info!(term, count = rows.len(), "searched vacancies");
        }
        found
    }

    fn expired_as_of(&self, now: DateTime<Utc>) -> Outcome<Vec<Vacancy>> {
        self.store.filter(|vacancy| vacancy.is_expired_as_of(now))
    }
}
