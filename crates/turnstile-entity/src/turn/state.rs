//! Turn state enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of one participation attempt.
///
/// `Completed` and `Abandoned` are terminal; a turn never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "turn_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    /// Queued behind other buyers, not yet admitted.
    Waiting,
    /// Holds an active slot and may check out.
    Active,
    /// Checkout finished successfully.
    Completed,
    /// Left voluntarily or the checkout window lapsed unused.
    Abandoned,
}

impl TurnState {
    /// Whether this state permits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Whether the ledger's state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: TurnState) -> bool {
        match (self, next) {
            (Self::Waiting, Self::Active) => true,
            (Self::Waiting, Self::Abandoned) => true,
            (Self::Active, Self::Completed) => true,
            (Self::Active, Self::Abandoned) => true,
            _ => false,
        }
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TurnState {
    type Err = turnstile_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(turnstile_core::AppError::validation(format!(
                "Invalid turn state: '{s}'. Expected one of: waiting, active, completed, abandoned"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(TurnState::Waiting.can_transition_to(TurnState::Active));
        assert!(TurnState::Waiting.can_transition_to(TurnState::Abandoned));
        assert!(TurnState::Active.can_transition_to(TurnState::Completed));
        assert!(TurnState::Active.can_transition_to(TurnState::Abandoned));
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for next in [
            TurnState::Waiting,
            TurnState::Active,
            TurnState::Completed,
            TurnState::Abandoned,
        ] {
            assert!(!TurnState::Completed.can_transition_to(next));
            assert!(!TurnState::Abandoned.can_transition_to(next));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("waiting".parse::<TurnState>().unwrap(), TurnState::Waiting);
        assert_eq!("ACTIVE".parse::<TurnState>().unwrap(), TurnState::Active);
        assert!("expired".parse::<TurnState>().is_err());
    }
}
