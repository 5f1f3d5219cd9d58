//! The failure taxonomy shared by the proxy and every module.
//!
//! A call either completes or returns one [`CallError`]; in the latter case
//! the proxy discards every state change the call made. Nothing is retried
//! internally.

use crate::id::{Address, Selector};
use crate::token::TokenError;

/// Broad class of a [`CallError`], used by callers to decide whether a
/// resubmission can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller lacks the privilege. Retry only from a different caller.
    Authorization,
    /// Malformed, empty, zero or out-of-range inputs.
    Validation,
    /// Not enough lines or circles yet.
    Resource,
    /// Structural misuse of the routing table.
    Routing,
    /// Operation issued in the wrong lifecycle state.
    Sequence,
    /// Encoding failures and other host-level faults.
    Internal,
}

/// Every way a call through the proxy can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    // -- authorization --
    #[error("caller {caller} is not authorized")]
    NotAuthorized { caller: Address },

    // -- validation --
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    // -- resource --
    #[error("not enough lines to level up: need {required}, have {available}")]
    NotEnoughLinesToLevelUp { required: u128, available: u128 },
    #[error("not enough lines to buy upgrade: need {required}, have {available}")]
    NotEnoughLinesToBuyUpgrade { required: u128, available: u128 },
    #[error("token: {0}")]
    Token(#[from] TokenError),

    // -- routing --
    #[error("unknown operation {0}")]
    UnknownOperation(Selector),
    #[error("operation {0} is already bound")]
    OperationAlreadyBound(Selector),
    #[error("operation {0} is not bound")]
    OperationNotBound(Selector),
    #[error("operation {0} is already bound to that module")]
    NoOpReplace(Selector),
    #[error("no module deployed at {0}")]
    ModuleNotDeployed(Address),

    // -- sequence --
    #[error("player {0} already started")]
    AlreadyStarted(Address),
    #[error("player {0} has not started")]
    NotStarted(Address),
    #[error("polygon tier {tier} cannot be leveled before tier {required}")]
    PolygonLevelUpNotAllowed { tier: u32, required: u32 },
    #[error("game already initialized")]
    AlreadyInitialized,
    #[error("game not initialized")]
    NotInitialized,

    // -- internal --
    #[error("codec: {0}")]
    Codec(String),
}

impl CallError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CallError::NotAuthorized { .. } => ErrorCategory::Authorization,
            CallError::InvalidArguments(_) => ErrorCategory::Validation,
            CallError::NotEnoughLinesToLevelUp { .. }
            | CallError::NotEnoughLinesToBuyUpgrade { .. } => ErrorCategory::Resource,
            CallError::Token(err) => match err {
                TokenError::Unauthorized { .. } => ErrorCategory::Authorization,
                TokenError::InsufficientBalance { .. }
                | TokenError::InsufficientAllowance { .. } => ErrorCategory::Resource,
                TokenError::Overflow => ErrorCategory::Internal,
            },
            CallError::UnknownOperation(_)
            | CallError::OperationAlreadyBound(_)
            | CallError::OperationNotBound(_)
            | CallError::NoOpReplace(_)
            | CallError::ModuleNotDeployed(_) => ErrorCategory::Routing,
            CallError::AlreadyStarted(_)
            | CallError::NotStarted(_)
            | CallError::PolygonLevelUpNotAllowed { .. }
            | CallError::AlreadyInitialized
            | CallError::NotInitialized => ErrorCategory::Sequence,
            CallError::Codec(_) => ErrorCategory::Internal,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CallError::InvalidArguments(reason.into())
    }
}

pub type CallResult<T> = Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let sel = Selector([1, 2, 3, 4]);
        assert_eq!(
            CallError::NotAuthorized {
                caller: Address::ZERO
            }
            .category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            CallError::invalid("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CallError::NotEnoughLinesToLevelUp {
                required: 2,
                available: 1
            }
            .category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            CallError::from(TokenError::InsufficientBalance {
                required: 5,
                available: 0
            })
            .category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            CallError::NoOpReplace(sel).category(),
            ErrorCategory::Routing
        );
        assert_eq!(
            CallError::PolygonLevelUpNotAllowed {
                tier: 2,
                required: 1
            }
            .category(),
            ErrorCategory::Sequence
        );
    }

    #[test]
    fn error_display_messages() {
        let msg = CallError::UnknownOperation(Selector([0xde, 0xad, 0xbe, 0xef])).to_string();
        assert!(msg.contains("0xdeadbeef"), "got: {msg}");

        let msg = CallError::NotEnoughLinesToBuyUpgrade {
            required: 1000,
            available: 7,
        }
        .to_string();
        assert!(msg.contains("1000"), "got: {msg}");
        assert!(msg.contains("7"), "got: {msg}");
    }
}
