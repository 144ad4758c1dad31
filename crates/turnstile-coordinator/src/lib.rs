//! # turnstile-coordinator
//!
//! The Ephemeral Admission Coordinator: the live truth of who may check out
//! right now and who is waiting, in what order. Every capacity-changing
//! operation (join-admission, reclamation, promotion) executes as a single
//! atomic operation against the backing store, so any number of gateway and
//! worker processes can run concurrently without overshooting capacity.
//!
//! Two implementations are provided behind [`coordinator::CoordinatorDispatch`]:
//! Redis (Lua-scripted, multi-node) and in-memory (single node, tests).

pub mod coordinator;
pub mod keys;
pub mod memory;
pub mod redis;

pub use coordinator::{
    AdmissionCoordinator, CoordinatorDispatch, JoinOutcome, LeaveOutcome, QueueCounts,
    QueuePosition,
};
