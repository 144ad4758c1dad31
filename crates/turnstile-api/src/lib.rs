//! # turnstile-api
//!
//! The request-facing gateway of the admission engine: join, position,
//! leave, checkout completion, on-demand worker runs, and queue
//! configuration CRUD. Transport concerns only — all decisions are made by
//! the service layer.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
