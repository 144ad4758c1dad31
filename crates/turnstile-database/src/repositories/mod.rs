//! Repository implementations.

pub mod queue_config;
pub mod turn;
