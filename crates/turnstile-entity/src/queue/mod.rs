//! Queue configuration entities.

pub mod config;

pub use config::{QueueConfig, QueueLimits};
