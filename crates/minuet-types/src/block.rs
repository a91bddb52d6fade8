//! Block types for the Minuet ledger

use bytes::Bytes;
use minuet_primitives::{Address, H256};

use crate::transaction::SignedTransaction;

/// Block header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Parent block hash
    pub parent_hash: H256,
    /// Block producer address
    pub beneficiary: Address,
    /// State root after executing the block
    pub state_root: H256,
    /// Transactions trie root
    pub transactions_root: H256,
    /// Block number (height)
    pub number: u64,
    /// Gas limit for the block
    pub gas_limit: u64,
    /// Gas used by all transactions
    pub gas_used: u64,
    /// Block timestamp (Unix seconds)
    pub timestamp: u64,
    /// Extra data (consensus-specific)
    pub extra_data: Bytes,
    /// Base fee per gas (EIP-1559); None before London
    pub base_fee_per_gas: Option<u128>,
}

impl BlockHeader {
    /// Create a genesis block header
    pub fn genesis() -> Self {
        Self {
            parent_hash: H256::ZERO,
            beneficiary: Address::ZERO,
            state_root: H256::ZERO,
            transactions_root: H256::ZERO,
            number: 0,
            gas_limit: 30_000_000,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::new(),
            base_fee_per_gas: Some(1_000_000_000),
        }
    }

    /// Header hash (keccak of the canonical encoding)
    pub fn hash(&self) -> H256 {
        crate::keccak256(&crate::codec::encode_header(self))
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.number == 0 && self.parent_hash == H256::ZERO
    }
}

/// Validator withdrawal (post-Shanghai)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawal {
    /// Monotonic withdrawal index
    pub index: u64,
    /// Index of the validator withdrawing
    pub validator_index: u64,
    /// Recipient address
    pub address: Address,
    /// Amount in gwei
    pub amount: u64,
}

/// Assembled block (header + ordered transactions)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Block header
    pub header: BlockHeader,
    /// Ordered transactions
    pub txs: Vec<SignedTransaction>,
    /// Withdrawals, when the fork rules call for them
    pub withdrawals: Option<Vec<Withdrawal>>,
}

impl Block {
    /// Create a new block without withdrawals
    pub fn new(header: BlockHeader, txs: Vec<SignedTransaction>) -> Self {
        Self {
            header,
            txs,
            withdrawals: None,
        }
    }

    /// Get block number
    pub fn number(&self) -> u64 {
        self.header.number
    }

    /// Get transaction count
    pub fn tx_count(&self) -> usize {
        self.txs.len()
    }
}
