//! # turnstile-database
//!
//! PostgreSQL access for Turnstile: connection pool management, embedded
//! migrations, the Queue Configuration Store, and the Turn Ledger.
//!
//! The ledger is a write-after-the-fact mirror of coordinator decisions —
//! it is never consulted on the admission hot path.

pub mod connection;
pub mod migration;
pub mod repositories;
