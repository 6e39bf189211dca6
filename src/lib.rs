//! Persistence and invariant core of the job board.
//!
//! Vacancies and applications live behind the [`store::EntityStore`] contract, hot
//! application listings read through [`cache::ReadThroughCache`], and the
//! [`workflows`] modules own vacancy lifecycle and application admission rules.
//! Every core operation reports through [`outcome::Outcome`].

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod outcome;
pub mod store;
pub mod telemetry;
pub mod workflows;
