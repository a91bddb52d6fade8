//! Shared fixtures: deterministic oracle, recovery, vm, and clock mocks
//! plus transaction builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use minuet_primitives::{Address, H256, U256};
use minuet_types::{BlockHeader, DynamicFeeTx, LegacyTx, SignedTransaction, TxSignature};
use minuet_txpool::{
    Clock, OracleError, PoolConfig, RecoveryError, Sandbox, SenderRecovery, StateOracle, TxPool,
    VmError, VmExecutor,
};

// ============================================================================
// Oracle
// ============================================================================

/// In-memory account state, shared with the test body for funding
pub struct TestOracle {
    accounts: Mutex<HashMap<Address, (u64, U256)>>,
    base_fee: Mutex<Option<u128>>,
    resolvable: AtomicBool,
}

impl TestOracle {
    pub fn new(base_fee: Option<u128>) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            base_fee: Mutex::new(base_fee),
            resolvable: AtomicBool::new(true),
        })
    }

    pub fn fund(&self, addr: Address, nonce: u64, balance: u128) {
        self.accounts
            .lock()
            .unwrap()
            .insert(addr, (nonce, U256::from(balance)));
    }

    /// Make every head lookup fail, as if the head were unknown
    pub fn set_unresolvable(&self) {
        self.resolvable.store(false, Ordering::SeqCst);
    }
}

impl StateOracle for TestOracle {
    fn account_nonce(&self, addr: Address, _head: H256) -> Result<u64, OracleError> {
        Ok(self.accounts.lock().unwrap().get(&addr).map_or(0, |(n, _)| *n))
    }

    fn account_balance(&self, addr: Address, _head: H256) -> Result<U256, OracleError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&addr)
            .map_or(U256::zero(), |(_, b)| *b))
    }

    fn base_fee(&self, head: H256) -> Result<Option<u128>, OracleError> {
        if !self.resolvable.load(Ordering::SeqCst) {
            return Err(OracleError::UnknownHead(head));
        }
        Ok(*self.base_fee.lock().unwrap())
    }
}

// ============================================================================
// Recovery
// ============================================================================

/// Reads the sender straight out of the signature's r component; a zero r
/// fails recovery.
pub struct SigRecovery;

impl SenderRecovery for SigRecovery {
    fn recover(&self, tx: &SignedTransaction) -> Result<Address, RecoveryError> {
        if tx.signature.r.is_zero() {
            return Err(RecoveryError::InvalidSignature);
        }
        Address::from_slice(&tx.signature.r.as_bytes()[..20])
            .map_err(|_| RecoveryError::InvalidSignature)
    }
}

// ============================================================================
// Vm
// ============================================================================

/// Deterministic dry-run executor.
///
/// Calldata starting 0xff reverts; 0xfe reports out-of-gas. Otherwise
/// charges gas and value against the sandbox and bumps the nonce.
pub struct TestVm;

impl VmExecutor for TestVm {
    fn dry_run(
        &self,
        tx: &SignedTransaction,
        sender: Address,
        sandbox: &mut Sandbox<'_>,
        header: &BlockHeader,
    ) -> Result<u64, VmError> {
        match tx.data().first() {
            Some(&0xff) => return Err(VmError::Execution("revert".into())),
            Some(&0xfe) => return Err(VmError::OutOfGas),
            _ => {}
        }

        let mut acc = sandbox
            .account(sender)
            .map_err(|e| VmError::Execution(e.to_string()))?;
        if acc.nonce != tx.nonce() {
            return Err(VmError::Execution(format!(
                "nonce mismatch: state {}, tx {}",
                acc.nonce,
                tx.nonce()
            )));
        }

        let price = match header.base_fee_per_gas {
            None => tx.fee_cap(),
            Some(base_fee) => match tx.effective_tip(Some(base_fee)) {
                Some(tip) => base_fee + tip,
                None => return Err(VmError::Execution("fee cap below base fee".into())),
            },
        };
        let gas = (21_000 + tx.data().len() as u64 * 16).min(tx.gas_limit());
        let cost = U256::from(gas) * U256::from(price) + U256::from(tx.value());
        if acc.balance < cost {
            return Err(VmError::Execution("insufficient balance".into()));
        }

        acc.nonce += 1;
        acc.balance -= cost;
        sandbox.set_account(sender, acc);
        Ok(gas)
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Clock the test advances by hand
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_millis: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(start_millis)))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn sender(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

/// Signature whose r encodes the sender for [`SigRecovery`]
pub fn sig_for(sender_byte: u8) -> TxSignature {
    TxSignature::new(
        27,
        H256::from_bytes([sender_byte; 32]),
        H256::from_bytes([1; 32]),
    )
}

pub fn legacy_tx(sender_byte: u8, nonce: u64, gas_price: u128) -> SignedTransaction {
    legacy_tx_with(sender_byte, nonce, gas_price, 0, &[])
}

pub fn legacy_tx_with(
    sender_byte: u8,
    nonce: u64,
    gas_price: u128,
    value: u128,
    data: &[u8],
) -> SignedTransaction {
    SignedTransaction::new_legacy(
        LegacyTx {
            nonce,
            gas_price,
            gas_limit: 21_000 + data.len() as u64 * 16,
            to: Some(Address::from_bytes([0x99; 20])),
            value,
            data: Bytes::copy_from_slice(data),
        },
        sig_for(sender_byte),
    )
}

pub fn dynamic_tx(sender_byte: u8, nonce: u64, tip_cap: u128, fee_cap: u128) -> SignedTransaction {
    SignedTransaction::new_dynamic_fee(
        DynamicFeeTx {
            chain_id: 1,
            nonce,
            max_priority_fee_per_gas: tip_cap,
            max_fee_per_gas: fee_cap,
            gas_limit: 21_000,
            to: Some(Address::from_bytes([0x99; 20])),
            value: 0,
            data: Bytes::new(),
        },
        sig_for(sender_byte),
    )
}

pub fn header(number: u64, base_fee: Option<u128>) -> BlockHeader {
    BlockHeader {
        number,
        base_fee_per_gas: base_fee,
        ..BlockHeader::genesis()
    }
}

// ============================================================================
// Pool wiring
// ============================================================================

pub struct Fixture {
    pub pool: TxPool,
    pub oracle: Arc<TestOracle>,
    pub clock: Arc<ManualClock>,
}

/// A pool pointed at a resolvable head with the given base fee
pub fn pool_at(cfg: PoolConfig, base_fee: Option<u128>) -> Fixture {
    let oracle = TestOracle::new(base_fee);
    let clock = ManualClock::new(1_000_000);
    let pool = TxPool::with_clock(
        cfg,
        oracle.clone(),
        Arc::new(SigRecovery),
        Arc::new(TestVm),
        clock.clone(),
    );
    assert!(pool.update_head(&header(1, base_fee)));
    Fixture { pool, oracle, clock }
}

/// Low floors so unit-sized tips classify as stageable
pub fn low_floor_cfg() -> PoolConfig {
    PoolConfig {
        min_pre_london_gas_price: 1,
        min_priority_fee: 1,
        ..Default::default()
    }
}
