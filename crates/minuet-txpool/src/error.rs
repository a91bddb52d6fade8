//! Transaction pool error types

use minuet_primitives::{H256, U256};
use thiserror::Error;

/// Transaction pool errors surfaced to callers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxPoolError {
    /// Transaction id is already live in the pool
    #[error("transaction already in pool: {0}")]
    Duplicate(H256),

    /// Replacement did not clear the price bump threshold
    #[error("replacement transaction underpriced: old tip {old}, new tip {new}")]
    Underpriced {
        /// Effective tip of the incumbent
        old: u128,
        /// Effective tip of the replacement
        new: u128,
    },

    /// Nonce already consumed on chain
    #[error("nonce too low: expected at least {expected}, got {got}")]
    NonceTooLow {
        /// Lowest acceptable nonce
        expected: u64,
        /// Nonce carried by the transaction
        got: u64,
    },

    /// Nonce would leave a hole in the sender's sequence
    #[error("nonce gap: expected at most {expected}, got {got}")]
    NonceGap {
        /// Highest nonce that keeps the sequence contiguous
        expected: u64,
        /// Nonce carried by the transaction
        got: u64,
    },

    /// Signature recovery failed
    #[error("sender unknown: signature recovery failed")]
    SenderUnknown,

    /// Sender balance cannot cover the transaction at all
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Worst-case cost of the transaction
        required: U256,
        /// Balance at the current head
        available: U256,
    },

    /// Gas limit below the intrinsic cost
    #[error("gas limit too low: {0}")]
    GasLimitTooLow(u64),

    /// Transaction type not valid under the head's fork rules
    #[error("invalid transaction type for current fork")]
    InvalidType,

    /// The pool has no resolvable head to validate against
    #[error("head unknown: state oracle cannot resolve the current head")]
    HeadUnknown,

    /// The packer's dry-run rejected the transaction
    #[error("vm execution error: {0}")]
    VmExec(String),

    /// No live item with the given id
    #[error("unknown item: {0}")]
    UnknownItem(H256),
}

/// Result type for transaction pool operations
pub type TxPoolResult<T> = Result<T, TxPoolError>;
