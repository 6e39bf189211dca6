//! Generic persistence contract over a single entity kind.

pub mod memory;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::outcome::Outcome;

pub use memory::InMemoryStore;

/// A persisted record with a stable identity assigned by its creator.
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Clone + Debug + Display + Eq + Hash + Send + Sync + 'static;

    /// Name used in log lines and failure messages.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

/// Storage abstraction so services can be exercised against any backing store.
///
/// `get_all` returns an empty sequence when nothing is stored; `NotFound` is
/// reserved for single-entity lookups and deletes.
pub trait EntityStore<E: Entity>: Send + Sync {
    fn get_by_id(&self, id: &E::Id) -> Outcome<E>;
    fn get_all(&self) -> Outcome<Vec<E>>;
    fn add(&self, entity: E) -> Outcome<E>;
    fn update(&self, entity: E) -> Outcome<E>;
    fn delete(&self, id: &E::Id) -> Outcome<bool>;
}
