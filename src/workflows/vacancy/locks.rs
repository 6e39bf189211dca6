//! Keyed advisory locks that serialize admission and lifecycle writes.
//!
//! An application holds its applicant's lock and then the vacancy's lock across the
//! eligibility check, the insert and the counter update. Lifecycle writes and vacancy
//! edits take only the vacancy lock. Every path acquires applicant before vacancy, so lock waits
//! cannot form a cycle.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use super::domain::VacancyId;
use crate::workflows::users::UserId;

type Slot = Arc<Mutex<()>>;

#[derive(Debug)]
struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &K) -> Slot {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Slots only referenced by the map have no waiters or holders.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

fn acquire(slot: &Slot) -> MutexGuard<'_, ()> {
    slot.lock().unwrap_or_else(|poisoned| {
        warn!("admission lock was poisoned by a panicking holder; continuing");
        poisoned.into_inner()
    })
}

#[derive(Debug)]
pub struct AdmissionLocks {
    applicants: KeyedLocks<UserId>,
    vacancies: KeyedLocks<VacancyId>,
}

impl Default for AdmissionLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionLocks {
    pub fn new() -> Self {
        Self {
            applicants: KeyedLocks::new(),
            vacancies: KeyedLocks::new(),
        }
    }

    /// Slots for one application attempt; call [`AdmissionSlots::acquire`] to lock them.
    pub fn admission(&self, applicant: &UserId, vacancy: &VacancyId) -> AdmissionSlots {
        AdmissionSlots {
            applicant: self.applicants.slot(applicant),
            vacancy: self.vacancies.slot(vacancy),
        }
    }

    pub fn vacancy(&self, vacancy: &VacancyId) -> VacancySlot {
        VacancySlot {
            vacancy: self.vacancies.slot(vacancy),
        }
    }

    /// Number of live lock slots; idle slots are pruned on the next lookup.
    pub fn tracked(&self) -> usize {
        self.applicants.len() + self.vacancies.len()
    }
}

pub struct AdmissionSlots {
    applicant: Slot,
    vacancy: Slot,
}

impl AdmissionSlots {
    pub fn acquire(&self) -> AdmissionGuard<'_> {
        let applicant = acquire(&self.applicant);
        let vacancy = acquire(&self.vacancy);
        AdmissionGuard {
            _applicant: applicant,
            _vacancy: vacancy,
        }
    }
}

pub struct AdmissionGuard<'a> {
    _applicant: MutexGuard<'a, ()>,
    _vacancy: MutexGuard<'a, ()>,
}

pub struct VacancySlot {
    vacancy: Slot,
}

impl VacancySlot {
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        acquire(&self.vacancy)
    }
}
