//! # turnstile-service
//!
//! Service layer composing the admission coordinator with the durable turn
//! ledger. The coordinator is the sole source of truth for admission
//! decisions; the services here mirror every decision into the ledger
//! (single-writer mirroring: whoever changed the coordinator writes the
//! matching row).

pub mod admission;
pub mod reconciliation;

pub use admission::{AdmissionService, JoinResult};
pub use reconciliation::{EventPassReport, ReconciliationService};
