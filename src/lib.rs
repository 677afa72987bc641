//! Core library for the `ledgerbench` CLI.
//!
//! A pluggable load generator for ledger networks. Workload kinds and
//! contract kinds are looked up in [`registry::Registries`]; a workload
//! generator provisions its identities and contract once in `init`, then the
//! [`driver`] calls `generate` concurrently from a fixed pool of workers.
pub mod args;
pub mod config;
pub mod driver;
pub mod entry;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod logger;
pub mod program;
pub mod registry;
pub mod shutdown;
pub mod workload;
