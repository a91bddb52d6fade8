//! # minuet-types
//!
//! Transaction and block types for the Minuet ledger.
//!
//! This crate provides:
//! - Legacy and EIP-1559 transaction bodies with signatures
//! - Effective-tip computation against a block base fee
//! - A deterministic byte codec and keccak-256 content hashing
//! - Block header and assembled-block types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod block;
pub mod codec;
mod transaction;

pub use block::{Block, BlockHeader, Withdrawal};
pub use transaction::{
    DynamicFeeTx, LegacyTx, SignedTransaction, TransactionBody, TxSignature, TxType,
};

use minuet_primitives::H256;
use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}
