//! Dispatch failures

use quire_core::VaultAction;
use std::fmt;
use thiserror::Error;

/// One action that failed during execution
#[derive(Debug, Clone)]
pub struct ActionFailure {
    pub action: VaultAction,
    /// The store's error message
    pub error: String,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.error)
    }
}

/// Why a batch did not fully apply
#[derive(Debug, Error)]
pub enum DispatchError {
    /// In-batch dependencies form a cycle; nothing was executed
    #[error("dependency cycle among {} actions: {}", .stranded.len(), .stranded.join(", "))]
    Cycle { stranded: Vec<String> },

    /// Some actions failed; every other action was applied
    #[error("{} action(s) failed", .0.len())]
    Partial(Vec<ActionFailure>),
}

impl DispatchError {
    /// Per-action failures (empty for a cycle)
    pub fn failures(&self) -> &[ActionFailure] {
        match self {
            DispatchError::Partial(failures) => failures,
            DispatchError::Cycle { .. } => &[],
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, DispatchError::Cycle { .. })
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
