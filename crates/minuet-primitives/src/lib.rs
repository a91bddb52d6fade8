//! # minuet-primitives
//!
//! Primitive types for the Minuet ledger.
//!
//! Provides the fundamental data types shared by every other crate:
//! 20-byte account addresses, 32-byte hashes, and the 256-bit unsigned
//! integer used for wei balances.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::Address;
pub use error::ParseError;
pub use hash::H256;

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Block height type
pub type BlockHeight = u64;

/// Transaction nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_balance_arithmetic() {
        let balance = U256::from(1_000_000_000_000_000_000u128);
        let cost = U256::from(21_000u64) * U256::from(10_000_000_000u64);
        assert!(balance > cost);
        assert_eq!(balance - cost, U256::from(999_790_000_000_000_000u128));
    }
}
