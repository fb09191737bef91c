#![doc = "transit-backup: incremental mirroring of transit feeds into an object store."]

//! This crate mirrors remote transit feeds into a bucket-per-dataset object
//! store. A backup run streams the catalog, filters resources down to the
//! backed-up scope, skips everything a prior backup already satisfies, and
//! uploads the rest with attached metadata. A separate reconciliation pass
//! reduces each bucket to one copy per logical resource.
//!
//! External collaborators (the catalog endpoint, the resource fetcher and
//! the object store) live behind the traits in [`contract`]; the engines in
//! [`backup`], [`dedup`] and [`admin`] only ever talk to those traits, so
//! everything above the adapters runs against mocks in tests.

pub mod admin;
pub mod backup;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod contract;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod key;
pub mod load_config;
pub mod policy;
pub mod staging;
pub mod store;
