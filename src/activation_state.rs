//! State machine for one activation attempt
//!
//! # State Transitions
//!
//! ```text
//!     Idle ──► ServicePublished ──► ScriptWritten ──► ScriptLoaded
//!                    │                    │                 │
//!                    │                    │                 v
//!                    │                    │           ScriptRunning
//!                    │                    │                 │
//!                    │                    │                 v
//!                    │                    │          AwaitingSignal
//!                    │                    │                 │
//!                    │                    │                 v
//!                    │                    │             Resolved
//!                    v                    v                 v
//!     ┌─────────────────────────────────────────────────────────┐
//!     │                         TornDown                        │
//!     └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state after `Idle` may fall through to `TornDown`. A failed publish
//! never leaves `Idle`, so there is nothing to tear down.

use serde::Serialize;

use crate::debug_log::debug_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    #[default]
    Idle,
    ServicePublished,
    ScriptWritten,
    ScriptLoaded,
    ScriptRunning,
    AwaitingSignal,
    Resolved,
    TornDown,
}

impl ActivationState {
    /// Successor on the path where nothing goes wrong
    pub fn next(&self) -> Option<Self> {
        match self {
            ActivationState::Idle => Some(ActivationState::ServicePublished),
            ActivationState::ServicePublished => Some(ActivationState::ScriptWritten),
            ActivationState::ScriptWritten => Some(ActivationState::ScriptLoaded),
            ActivationState::ScriptLoaded => Some(ActivationState::ScriptRunning),
            ActivationState::ScriptRunning => Some(ActivationState::AwaitingSignal),
            ActivationState::AwaitingSignal => Some(ActivationState::Resolved),
            ActivationState::Resolved => Some(ActivationState::TornDown),
            ActivationState::TornDown => None,
        }
    }

    pub fn can_transition_to(&self, to: ActivationState) -> bool {
        match to {
            ActivationState::TornDown => self.has_publication(),
            _ => self.next() == Some(to),
        }
    }

    /// Whether the callback service is (or may be) registered in this state
    pub fn has_publication(&self) -> bool {
        !matches!(self, ActivationState::Idle | ActivationState::TornDown)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ActivationState::TornDown)
    }
}

/// Current state plus every state visited, in order
#[derive(Debug, Clone)]
pub struct StateTrail {
    current: ActivationState,
    visited: Vec<ActivationState>,
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            current: ActivationState::Idle,
            visited: vec![ActivationState::Idle],
        }
    }

    pub fn current(&self) -> ActivationState {
        self.current
    }

    pub fn visited(&self) -> &[ActivationState] {
        &self.visited
    }

    /// Move to `to`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, to: ActivationState) -> bool {
        if !self.current.can_transition_to(to) {
            debug_log(
                "ACTIVATE",
                &format!("Ignoring transition {:?} -> {:?}", self.current, to),
            );
            return false;
        }
        self.current = to;
        self.visited.push(to);
        true
    }

    pub fn reached(&self, state: ActivationState) -> bool {
        self.visited.contains(&state)
    }
}
