use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::{Entity, EntityStore};
use crate::outcome::{Failure, Outcome};

/// Process-local backing store keyed by entity identity.
///
/// Clones share the same rows, so one handle can be wired into several services.
#[derive(Debug, Clone)]
pub struct InMemoryStore<E: Entity> {
    rows: Arc<Mutex<HashMap<E::Id, E>>>,
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| (row.id().clone(), row))
            .collect::<HashMap<_, _>>();
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<E::Id, E>>, Failure> {
        self.rows
            .lock()
            .map_err(|_| Failure::error(format!("{} store lock poisoned", E::KIND)))
    }

    /// Returns every row matching `predicate`; the query hook for typed repositories.
    pub fn filter<P>(&self, predicate: P) -> Outcome<Vec<E>>
    where
        P: Fn(&E) -> bool,
    {
        match self.lock() {
            Ok(rows) => Outcome::success(
                rows.values()
                    .filter(|row| predicate(row))
                    .cloned()
                    .collect(),
            ),
            Err(failure) => Outcome::Failure(failure),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    fn get_by_id(&self, id: &E::Id) -> Outcome<E> {
        let rows = match self.lock() {
            Ok(rows) => rows,
            Err(failure) => return Outcome::Failure(failure),
        };
        match rows.get(id) {
            Some(row) => {
                debug!(kind = E::KIND, %id, "retrieved item by id");
                Outcome::success(row.clone())
            }
            None => {
                warn!(kind = E::KIND, %id, "item not found");
                Outcome::not_found(format!("{} {id} not found", E::KIND))
            }
        }
    }

    fn get_all(&self) -> Outcome<Vec<E>> {
        self.filter(|_| true)
    }

    fn add(&self, entity: E) -> Outcome<E> {
        let mut rows = match self.lock() {
            Ok(rows) => rows,
            Err(failure) => return Outcome::Failure(failure),
        };
        let id = entity.id().clone();
        if rows.contains_key(&id) {
            warn!(kind = E::KIND, %id, "refusing to add duplicate identity");
            return Outcome::error(format!("{} {id} already exists", E::KIND));
        }
        rows.insert(id.clone(), entity.clone());
        info!(kind = E::KIND, %id, "added new item");
        Outcome::success(entity)
    }

    fn update(&self, entity: E) -> Outcome<E> {
        let mut rows = match self.lock() {
            Ok(rows) => rows,
            Err(failure) => return Outcome::Failure(failure),
        };
        let id = entity.id().clone();
        match rows.get_mut(&id) {
            Some(row) => {
                *row = entity.clone();
                info!(kind = E::KIND, %id, "updated item");
                Outcome::success(entity)
            }
            None => {
                warn!(kind = E::KIND, %id, "update targeted a missing item");
                Outcome::not_found(format!("{} {id} not found", E::KIND))
            }
        }
    }

    fn delete(&self, id: &E::Id) -> Outcome<bool> {
        let mut rows = match self.lock() {
            Ok(rows) => rows,
            Err(failure) => return Outcome::Failure(failure),
        };
        match rows.remove(id) {
            Some(_) => {
                info!(kind = E::KIND, %id, "deleted item");
                Outcome::success(true)
            }
            None => {
                warn!(kind = E::KIND, %id, "item not found");
                Outcome::not_found(format!("{} {id} not found", E::KIND))
            }
        }
    }
}
