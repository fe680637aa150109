//! Coordinator lifecycle states.
//!
//! Valid transitions:
//! - Stopped -> Starting (start requested)
//! - Starting -> Running (collaborators wired and started)
//! - Starting -> Stopped (start aborted)
//! - Running -> Stopped (stop)

use std::fmt;

use parley_core::error::ParleyError;

/// Lifecycle state of the turn coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordinatorState {
    /// Not wired to any collaborator. Ticks are ignored.
    #[default]
    Stopped,
    /// Wiring subscriptions and starting collaborators.
    Starting,
    /// Processing ticks.
    Running,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Stopped => write!(f, "Stopped"),
            CoordinatorState::Starting => write!(f, "Starting"),
            CoordinatorState::Running => write!(f, "Running"),
        }
    }
}

impl CoordinatorState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &CoordinatorState) -> bool {
        matches!(
            (self, target),
            (CoordinatorState::Stopped, CoordinatorState::Starting)
                | (CoordinatorState::Starting, CoordinatorState::Running)
                | (CoordinatorState::Starting, CoordinatorState::Stopped)
                | (CoordinatorState::Running, CoordinatorState::Stopped)
        )
    }

    /// Move to `target`, or report why that is not allowed.
    pub fn transition(&mut self, target: CoordinatorState) -> Result<(), ParleyError> {
        if self.can_transition_to(&target) {
            tracing::debug!("Coordinator state: {} -> {}", self, target);
            *self = target;
            Ok(())
        } else {
            Err(ParleyError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(CoordinatorState::Stopped.to_string(), "Stopped");
        assert_eq!(CoordinatorState::Starting.to_string(), "Starting");
        assert_eq!(CoordinatorState::Running.to_string(), "Running");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(CoordinatorState::Stopped.can_transition_to(&CoordinatorState::Starting));
        assert!(CoordinatorState::Starting.can_transition_to(&CoordinatorState::Running));
        assert!(CoordinatorState::Starting.can_transition_to(&CoordinatorState::Stopped));
        assert!(CoordinatorState::Running.can_transition_to(&CoordinatorState::Stopped));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!CoordinatorState::Stopped.can_transition_to(&CoordinatorState::Running));
        assert!(!CoordinatorState::Running.can_transition_to(&CoordinatorState::Starting));
        assert!(!CoordinatorState::Running.can_transition_to(&CoordinatorState::Running));
        assert!(!CoordinatorState::Stopped.can_transition_to(&CoordinatorState::Stopped));
    }

    #[test]
    fn test_transition_applies_and_rejects() {
        let mut state = CoordinatorState::default();
        state.transition(CoordinatorState::Starting).unwrap();
        state.transition(CoordinatorState::Running).unwrap();
        assert_eq!(state, CoordinatorState::Running);

        let err = state.transition(CoordinatorState::Starting).unwrap_err();
        assert!(matches!(err, ParleyError::InvalidTransition { .. }));
        assert_eq!(state, CoordinatorState::Running);
    }
}
