use crate::position::{Offset, Position};
use crate::scope::{GetterId, VariableId};

/// Errors raised by the scope resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScopeError {
    /// A getter precedes every variable in its chain.
    #[error("unresolved reference to '{name}' at {position}")]
    UnresolvedReference { name: String, position: Position },

    /// An internal consistency check failed. The chain is poisoned afterwards.
    #[error("scope invariant violated in chain '{chain}': {reason}")]
    InvariantViolation { chain: String, reason: String },

    /// A chain was poisoned by an earlier invariant violation.
    #[error("chain '{0}' is poisoned by an earlier invariant violation")]
    PoisonedChain(String),

    /// Shifting a position would leave the `i64` grid. Nothing was moved.
    #[error("moving {position} by {offset} leaves the grid")]
    OutOfRange { position: Position, offset: Offset },

    #[error("unknown variable {0}")]
    UnknownVariable(VariableId),

    #[error("unknown getter {0}")]
    UnknownGetter(GetterId),

    #[error("{0} is not implemented")]
    UnsupportedOperation(&'static str),
}

impl ScopeError {
    pub(crate) fn invariant(chain: &str, reason: impl Into<String>) -> Self {
        ScopeError::InvariantViolation {
            chain: chain.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that leave the resolver untouched and may be retried.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScopeError::UnresolvedReference { .. } | ScopeError::OutOfRange { .. }
        )
    }
}
