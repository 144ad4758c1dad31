//! Turn ledger entities.

pub mod model;
pub mod state;

pub use model::{NewTurn, Turn};
pub use state::TurnState;
