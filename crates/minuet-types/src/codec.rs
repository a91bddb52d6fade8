//! Binary encoding/decoding for transactions and block headers.
//!
//! Provides the deterministic serialization behind transaction content
//! hashes and block header hashes. Fixed-width fields are little-endian;
//! variable-width fields carry a u32 length prefix.

use bytes::Bytes;
use minuet_primitives::{Address, H256};

use crate::block::BlockHeader;
use crate::transaction::{
    DynamicFeeTx, LegacyTx, SignedTransaction, TransactionBody, TxSignature,
};

// ============================================================================
// Transaction encoding
// ============================================================================

/// Encode a signed transaction to bytes.
pub fn encode_tx(tx: &SignedTransaction) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(tx.tx_type as u8);
    match &tx.tx {
        TransactionBody::Legacy(body) => {
            buf.extend_from_slice(&body.nonce.to_le_bytes());
            buf.extend_from_slice(&body.gas_price.to_le_bytes());
            buf.extend_from_slice(&body.gas_limit.to_le_bytes());
            encode_to(&mut buf, &body.to);
            buf.extend_from_slice(&body.value.to_le_bytes());
            encode_bytes(&mut buf, &body.data);
        }
        TransactionBody::DynamicFee(body) => {
            buf.extend_from_slice(&body.chain_id.to_le_bytes());
            buf.extend_from_slice(&body.nonce.to_le_bytes());
            buf.extend_from_slice(&body.max_priority_fee_per_gas.to_le_bytes());
            buf.extend_from_slice(&body.max_fee_per_gas.to_le_bytes());
            buf.extend_from_slice(&body.gas_limit.to_le_bytes());
            encode_to(&mut buf, &body.to);
            buf.extend_from_slice(&body.value.to_le_bytes());
            encode_bytes(&mut buf, &body.data);
        }
    }
    buf.extend_from_slice(&tx.signature.v.to_le_bytes());
    buf.extend_from_slice(tx.signature.r.as_bytes());
    buf.extend_from_slice(tx.signature.s.as_bytes());
    buf
}

/// Decode a signed transaction from bytes.
pub fn decode_tx(bytes: &[u8]) -> Option<SignedTransaction> {
    let mut r = Reader::new(bytes);
    let tx = match r.u8()? {
        0 => {
            let body = LegacyTx {
                nonce: r.u64()?,
                gas_price: r.u128()?,
                gas_limit: r.u64()?,
                to: r.to()?,
                value: r.u128()?,
                data: r.bytes()?,
            };
            SignedTransaction::new_legacy(body, r.signature()?)
        }
        2 => {
            let body = DynamicFeeTx {
                chain_id: r.u64()?,
                nonce: r.u64()?,
                max_priority_fee_per_gas: r.u128()?,
                max_fee_per_gas: r.u128()?,
                gas_limit: r.u64()?,
                to: r.to()?,
                value: r.u128()?,
                data: r.bytes()?,
            };
            SignedTransaction::new_dynamic_fee(body, r.signature()?)
        }
        _ => return None,
    };
    r.finish()?;
    Some(tx)
}

// ============================================================================
// Block header encoding
// ============================================================================

/// Encode a block header to bytes.
pub fn encode_header(header: &BlockHeader) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(header.parent_hash.as_bytes());
    buf.extend_from_slice(header.beneficiary.as_bytes());
    buf.extend_from_slice(header.state_root.as_bytes());
    buf.extend_from_slice(header.transactions_root.as_bytes());
    buf.extend_from_slice(&header.number.to_le_bytes());
    buf.extend_from_slice(&header.gas_limit.to_le_bytes());
    buf.extend_from_slice(&header.gas_used.to_le_bytes());
    buf.extend_from_slice(&header.timestamp.to_le_bytes());
    encode_bytes(&mut buf, &header.extra_data);
    match header.base_fee_per_gas {
        Some(fee) => {
            buf.push(1);
            buf.extend_from_slice(&fee.to_le_bytes());
        }
        None => buf.push(0),
    }
    buf
}

// ============================================================================
// Helpers
// ============================================================================

fn encode_to(buf: &mut Vec<u8>, to: &Option<Address>) {
    match to {
        Some(addr) => {
            buf.push(1);
            buf.extend_from_slice(addr.as_bytes());
        }
        None => buf.push(0),
    }
}

fn encode_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(data);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn u128(&mut self) -> Option<u128> {
        Some(u128::from_le_bytes(self.take(16)?.try_into().ok()?))
    }

    fn h256(&mut self) -> Option<H256> {
        H256::from_slice(self.take(32)?).ok()
    }

    fn to(&mut self) -> Option<Option<Address>> {
        match self.u8()? {
            0 => Some(None),
            1 => Some(Some(Address::from_slice(self.take(20)?).ok()?)),
            _ => None,
        }
    }

    fn bytes(&mut self) -> Option<Bytes> {
        let len = u32::from_le_bytes(self.take(4)?.try_into().ok()?) as usize;
        Some(Bytes::copy_from_slice(self.take(len)?))
    }

    fn signature(&mut self) -> Option<TxSignature> {
        Some(TxSignature::new(self.u64()?, self.h256()?, self.h256()?))
    }

    fn finish(&self) -> Option<()> {
        (self.pos == self.bytes.len()).then_some(())
    }
}
