//! Transaction types for the Minuet ledger

use bytes::Bytes;
use minuet_primitives::{Address, H256, U256};

/// Transaction type identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (pre-EIP-2718)
    #[default]
    Legacy = 0,
    /// EIP-1559 dynamic fee transaction
    DynamicFee = 2,
}

/// Legacy transaction (Type 0)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    /// Transaction nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: u128,
    /// Input data
    pub data: Bytes,
}

impl Default for LegacyTx {
    fn default() -> Self {
        Self {
            nonce: 0,
            gas_price: 0,
            gas_limit: 21_000,
            to: None,
            value: 0,
            data: Bytes::new(),
        }
    }
}

/// EIP-1559 dynamic fee transaction (Type 2)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicFeeTx {
    /// Chain ID
    pub chain_id: u64,
    /// Transaction nonce
    pub nonce: u64,
    /// Max priority fee per gas (tip cap)
    pub max_priority_fee_per_gas: u128,
    /// Max fee per gas
    pub max_fee_per_gas: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<Address>,
    /// Value to transfer in wei
    pub value: u128,
    /// Input data
    pub data: Bytes,
}

/// Signature components
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// Recovery ID (v value)
    pub v: u64,
    /// R component
    pub r: H256,
    /// S component
    pub s: H256,
}

impl TxSignature {
    /// Create a new signature
    pub fn new(v: u64, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }

    /// Check if the signature is well-formed (non-zero r and s)
    pub fn is_valid(&self) -> bool {
        !self.r.is_zero() && !self.s.is_zero()
    }
}

/// Transaction body (unsigned)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionBody {
    /// Legacy transaction
    Legacy(LegacyTx),
    /// EIP-1559 transaction
    DynamicFee(DynamicFeeTx),
}

/// Signed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction type
    pub tx_type: TxType,
    /// Transaction body
    pub tx: TransactionBody,
    /// Signature
    pub signature: TxSignature,
}

impl SignedTransaction {
    /// Create a new signed legacy transaction
    pub fn new_legacy(tx: LegacyTx, signature: TxSignature) -> Self {
        Self {
            tx_type: TxType::Legacy,
            tx: TransactionBody::Legacy(tx),
            signature,
        }
    }

    /// Create a new signed EIP-1559 transaction
    pub fn new_dynamic_fee(tx: DynamicFeeTx, signature: TxSignature) -> Self {
        Self {
            tx_type: TxType::DynamicFee,
            tx: TransactionBody::DynamicFee(tx),
            signature,
        }
    }

    /// Content hash of the transaction (keccak of the canonical encoding)
    pub fn hash(&self) -> H256 {
        crate::keccak256(&crate::codec::encode_tx(self))
    }

    /// Get transaction nonce
    pub fn nonce(&self) -> u64 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.nonce,
            TransactionBody::DynamicFee(tx) => tx.nonce,
        }
    }

    /// Get gas limit
    pub fn gas_limit(&self) -> u64 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_limit,
            TransactionBody::DynamicFee(tx) => tx.gas_limit,
        }
    }

    /// Get recipient address
    pub fn to(&self) -> Option<&Address> {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.to.as_ref(),
            TransactionBody::DynamicFee(tx) => tx.to.as_ref(),
        }
    }

    /// Get transfer value
    pub fn value(&self) -> u128 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.value,
            TransactionBody::DynamicFee(tx) => tx.value,
        }
    }

    /// Get input data
    pub fn data(&self) -> &Bytes {
        match &self.tx {
            TransactionBody::Legacy(tx) => &tx.data,
            TransactionBody::DynamicFee(tx) => &tx.data,
        }
    }

    /// Check if this is a contract creation transaction
    pub fn is_contract_creation(&self) -> bool {
        self.to().is_none()
    }

    /// The most the sender agreed to pay per gas unit
    pub fn fee_cap(&self) -> u128 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_price,
            TransactionBody::DynamicFee(tx) => tx.max_fee_per_gas,
        }
    }

    /// The most the sender agreed to tip the producer per gas unit
    pub fn tip_cap(&self) -> u128 {
        match &self.tx {
            TransactionBody::Legacy(tx) => tx.gas_price,
            TransactionBody::DynamicFee(tx) => tx.max_priority_fee_per_gas,
        }
    }

    /// Producer reward per gas unit at the given base fee.
    ///
    /// Before London (`base_fee == None`) this is the gas price (the fee cap
    /// for a dynamic-fee body). After London it is
    /// `min(tip_cap, fee_cap - base_fee)`, or `None` when the base fee
    /// exceeds the fee cap and the transaction cannot be included at all.
    pub fn effective_tip(&self, base_fee: Option<u128>) -> Option<u128> {
        let Some(base_fee) = base_fee else {
            return Some(self.fee_cap());
        };
        let cap = self.fee_cap();
        if base_fee > cap {
            return None;
        }
        Some(self.tip_cap().min(cap - base_fee))
    }

    /// Upper bound on what executing this transaction can cost the sender:
    /// `gas_limit * fee_cap + value`.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit()) * U256::from(self.fee_cap()) + U256::from(self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig() -> TxSignature {
        TxSignature::new(27, H256::from_bytes([1u8; 32]), H256::from_bytes([2u8; 32]))
    }

    fn dynamic(tip_cap: u128, fee_cap: u128) -> SignedTransaction {
        SignedTransaction::new_dynamic_fee(
            DynamicFeeTx {
                chain_id: 1,
                nonce: 0,
                max_priority_fee_per_gas: tip_cap,
                max_fee_per_gas: fee_cap,
                gas_limit: 21_000,
                to: None,
                value: 0,
                data: Bytes::new(),
            },
            sig(),
        )
    }

    // ==================== Accessor tests ====================

    #[test]
    fn test_legacy_accessors() {
        let to = Address::from_bytes([0x42; 20]);
        let tx = SignedTransaction::new_legacy(
            LegacyTx {
                nonce: 5,
                gas_price: 100,
                gas_limit: 50_000,
                to: Some(to),
                value: 1_000,
                data: Bytes::from(vec![0x01, 0x02]),
            },
            sig(),
        );

        assert_eq!(tx.tx_type, TxType::Legacy);
        assert_eq!(tx.nonce(), 5);
        assert_eq!(tx.gas_limit(), 50_000);
        assert_eq!(tx.to(), Some(&to));
        assert_eq!(tx.value(), 1_000);
        assert_eq!(tx.data().len(), 2);
        assert!(!tx.is_contract_creation());
        assert_eq!(tx.fee_cap(), 100);
        assert_eq!(tx.tip_cap(), 100);
    }

    #[test]
    fn test_contract_creation() {
        let tx = SignedTransaction::new_legacy(LegacyTx::default(), sig());
        assert!(tx.is_contract_creation());
    }

    // ==================== Effective tip tests ====================

    #[test]
    fn test_effective_tip_pre_london() {
        let legacy = SignedTransaction::new_legacy(
            LegacyTx {
                gas_price: 100,
                ..Default::default()
            },
            sig(),
        );
        assert_eq!(legacy.effective_tip(None), Some(100));

        // A dynamic body without a base fee falls back to its fee cap
        assert_eq!(dynamic(10, 100).effective_tip(None), Some(100));
    }

    #[test]
    fn test_effective_tip_post_london_legacy() {
        let legacy = SignedTransaction::new_legacy(
            LegacyTx {
                gas_price: 100,
                ..Default::default()
            },
            sig(),
        );
        assert_eq!(legacy.effective_tip(Some(40)), Some(60));
        assert_eq!(legacy.effective_tip(Some(100)), Some(0));
        assert_eq!(legacy.effective_tip(Some(101)), None);
    }

    #[test]
    fn test_effective_tip_post_london_dynamic() {
        // tip cap not binding: min(10, 100 - 50) = 10
        assert_eq!(dynamic(10, 100).effective_tip(Some(50)), Some(10));
        // tip cap binding: min(50, 100 - 80) = 20
        assert_eq!(dynamic(50, 100).effective_tip(Some(80)), Some(20));
        // base fee at the cap
        assert_eq!(dynamic(10, 100).effective_tip(Some(100)), Some(0));
        // base fee over the cap: not includable
        assert_eq!(dynamic(10, 100).effective_tip(Some(150)), None);
    }

    #[test]
    fn test_max_cost() {
        let tx = SignedTransaction::new_legacy(
            LegacyTx {
                gas_price: 10,
                gas_limit: 21_000,
                value: 500,
                ..Default::default()
            },
            sig(),
        );
        assert_eq!(tx.max_cost(), U256::from(21_000u64 * 10 + 500));
    }

    // ==================== Signature tests ====================

    #[test]
    fn test_signature_validity() {
        assert!(sig().is_valid());
        assert!(!TxSignature::new(27, H256::ZERO, H256::from_bytes([2u8; 32])).is_valid());
        assert!(!TxSignature::new(27, H256::from_bytes([1u8; 32]), H256::ZERO).is_valid());
    }

    // ==================== Hash tests ====================

    #[test]
    fn test_hash_is_stable() {
        let tx = dynamic(10, 100);
        assert_eq!(tx.hash(), tx.hash());
    }

    #[test]
    fn test_hash_differs_by_content() {
        let a = dynamic(10, 100);
        let b = dynamic(11, 100);
        assert_ne!(a.hash(), b.hash());
    }
}
