//! Redis-backed admission coordinator.

pub mod client;
pub mod coordinator;

pub use client::RedisClient;
pub use coordinator::RedisCoordinator;
