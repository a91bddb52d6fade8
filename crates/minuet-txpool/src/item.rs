//! Pooled item record

use minuet_primitives::{Address, H256, U256};
use minuet_types::SignedTransaction;

/// Lifecycle bucket of a live item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ItemStatus {
    /// Parked: not currently eligible for block inclusion
    #[default]
    Pending,
    /// Eligible for the next block, waiting on the packer
    Staged,
    /// Selected by the packer for the next block
    Packed,
}

impl ItemStatus {
    /// All statuses in promotion order
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Pending, ItemStatus::Staged, ItemStatus::Packed];

    pub(crate) fn index(self) -> usize {
        match self {
            ItemStatus::Pending => 0,
            ItemStatus::Staged => 1,
            ItemStatus::Packed => 2,
        }
    }
}

/// Why an item was moved to the waste basket
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Superseded by a higher-tipped item at the same sender and nonce
    Replaced,
    /// Disposal of a lower nonce left this item unreachable
    NonceGap,
    /// Nonce already consumed on chain
    NonceTooLow,
    /// Exceeded the configured lifetime
    Expired,
    /// Failed the supersede price bump
    Underpriced,
    /// Sender balance cannot cover the transaction
    InsufficientFunds,
    /// Gas limit below the intrinsic cost
    GasLimitTooLow,
    /// Transaction type not valid under the head's fork rules
    InvalidType,
    /// Signature recovery failed
    SenderUnknown,
    /// The packer's dry-run failed
    VmError,
    /// Explicit disposal by the operator
    User,
}

/// A transaction plus the metadata the pool derives for it.
///
/// Immutable after insert except for the status (moved by the buckets
/// engine and packer), the reject reason (set on disposal), and the
/// timestamp (reset on resurrection).
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) id: H256,
    pub(crate) tx: SignedTransaction,
    pub(crate) sender: Address,
    pub(crate) timestamp: u64,
    pub(crate) seq: u64,
    pub(crate) status: ItemStatus,
    pub(crate) info: String,
    pub(crate) reject: Option<RejectReason>,
    pub(crate) local: bool,
}

impl Item {
    pub(crate) fn new(
        id: H256,
        tx: SignedTransaction,
        sender: Address,
        timestamp: u64,
        seq: u64,
        info: String,
        local: bool,
    ) -> Self {
        Self {
            id,
            tx,
            sender,
            timestamp,
            seq,
            status: ItemStatus::Pending,
            info,
            reject: None,
            local,
        }
    }

    /// Transaction content hash
    pub fn id(&self) -> H256 {
        self.id
    }

    /// The transaction itself
    pub fn tx(&self) -> &SignedTransaction {
        &self.tx
    }

    /// Sender recovered at insert time
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Transaction nonce
    pub fn nonce(&self) -> u64 {
        self.tx.nonce()
    }

    /// Transaction gas limit
    pub fn gas_limit(&self) -> u64 {
        self.tx.gas_limit()
    }

    /// Wall-clock at acceptance, milliseconds
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Arrival sequence number, unique per pool
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Current lifecycle bucket
    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Free-form producer note
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Rejection kind; only meaningful while in the waste basket
    pub fn reject(&self) -> Option<RejectReason> {
        self.reject
    }

    /// True if the sender is a configured local account
    pub fn local(&self) -> bool {
        self.local
    }

    /// Producer reward per gas at the given base fee
    pub fn effective_tip(&self, base_fee: Option<u128>) -> Option<u128> {
        self.tx.effective_tip(base_fee)
    }

    /// Tip used for rank ordering; zero when not includable at this base fee
    pub fn rank_tip(&self, base_fee: Option<u128>) -> u128 {
        self.tx.effective_tip(base_fee).unwrap_or(0)
    }

    /// Worst-case cost charged to the sender: `gas_limit * fee_cap + value`
    pub fn max_cost(&self) -> U256 {
        self.tx.max_cost()
    }
}
