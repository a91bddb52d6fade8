//! Transaction pool façade.
//!
//! Serializes every state-mutating operation behind one write lock and
//! runs the buckets engine plus the packer before the mutating call
//! returns, so any read that follows a mutation observes a fully
//! reconciled pool.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use minuet_metrics::Metrics;
use minuet_primitives::{Address, H256};
use minuet_types::{Block, BlockHeader, SignedTransaction, TxType};
use parking_lot::RwLock;

use crate::buckets;
use crate::config::{PoolConfig, PoolFlags, MIN_TX_GAS};
use crate::error::{TxPoolError, TxPoolResult};
use crate::item::{Item, ItemStatus, RejectReason};
use crate::packer::{self, PackOutcome};
use crate::store::{Counts, TxDb};
use crate::traits::{Clock, SenderRecovery, StateOracle, SystemClock, VmExecutor};
use crate::verify;

/// Σ gas limit per bucket
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasTotals {
    /// Pending bucket
    pub pending: u64,
    /// Staged bucket
    pub staged: u64,
    /// Packed bucket
    pub packed: u64,
}

/// Current head, with its hash cached
struct Head {
    header: BlockHeader,
    hash: H256,
}

struct PoolInner {
    db: TxDb,
    cfg: PoolConfig,
    head: Option<Head>,
    packed: PackOutcome,
}

/// The transaction pool
pub struct TxPool {
    inner: RwLock<PoolInner>,
    oracle: Arc<dyn StateOracle>,
    recovery: Arc<dyn SenderRecovery>,
    vm: Arc<dyn VmExecutor>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl TxPool {
    /// Create a pool using the system clock
    pub fn new(
        cfg: PoolConfig,
        oracle: Arc<dyn StateOracle>,
        recovery: Arc<dyn SenderRecovery>,
        vm: Arc<dyn VmExecutor>,
    ) -> Self {
        Self::with_clock(cfg, oracle, recovery, vm, Arc::new(SystemClock))
    }

    /// Create a pool with an injected clock, e.g. for deterministic expiry
    pub fn with_clock(
        cfg: PoolConfig,
        oracle: Arc<dyn StateOracle>,
        recovery: Arc<dyn SenderRecovery>,
        vm: Arc<dyn VmExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let db = TxDb::new(cfg.max_rejects, None);
        Self {
            inner: RwLock::new(PoolInner {
                db,
                cfg,
                head: None,
                packed: PackOutcome::default(),
            }),
            oracle,
            recovery,
            vm,
            clock,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// The pool's metrics store
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Add a batch of transactions.
    ///
    /// The whole batch is processed against one consistent snapshot. An
    /// empty batch is the idiomatic way to force a maintenance pass.
    /// Per-item failures land in the waste basket with their reason and do
    /// not abort the batch; an unresolvable head aborts it with no state
    /// change.
    pub fn add(&self, txs: &[SignedTransaction], info: &str) -> TxPoolResult<()> {
        let mut inner = self.inner.write();
        if inner.head.is_none() {
            return Err(TxPoolError::HeadUnknown);
        }
        for tx in txs {
            if let Err(err) = self.insert_tx(&mut inner, tx, info) {
                if err == TxPoolError::HeadUnknown {
                    return Err(err);
                }
                tracing::debug!(%err, "transaction rejected");
                self.metrics.inc("txpool.rejects");
            }
        }
        self.maintain(&mut inner)
    }

    /// Add a single transaction, returning its id or the typed rejection
    pub fn add_one(&self, tx: &SignedTransaction, info: &str) -> TxPoolResult<H256> {
        let mut inner = self.inner.write();
        if inner.head.is_none() {
            return Err(TxPoolError::HeadUnknown);
        }
        let result = self.insert_tx(&mut inner, tx, info);
        if let Err(err) = &result {
            if !matches!(err, TxPoolError::Duplicate(_)) {
                self.metrics.inc("txpool.rejects");
            }
        }
        self.maintain(&mut inner)?;
        result
    }

    /// Dispose items on the operator's behalf, cascading higher-nonce
    /// dependents of each. Returns how many of the given ids were live.
    pub fn dispose(&self, ids: &[H256]) -> TxPoolResult<usize> {
        let mut inner = self.inner.write();
        let mut disposed = 0;
        for id in ids {
            if let Some(implied) = inner.db.dispose_cascade(*id, RejectReason::User) {
                disposed += 1;
                self.metrics.add("txpool.implied_evictions", implied as u64);
            }
        }
        self.maintain(&mut inner)?;
        Ok(disposed)
    }

    /// Move an item to another bucket without eligibility checks.
    ///
    /// Administrative escape hatch; the next maintenance pass will fold
    /// the item back into policy.
    pub fn reassign(&self, id: H256, status: ItemStatus) -> TxPoolResult<()> {
        self.inner.write().db.reassign(id, status)
    }

    /// Point the pool at a new head and reconcile everything against it.
    ///
    /// Returns false, leaving the head unchanged, when the state oracle
    /// cannot resolve the header.
    pub fn update_head(&self, header: &BlockHeader) -> bool {
        let hash = header.hash();
        if self.oracle.base_fee(hash).is_err() {
            tracing::warn!(number = header.number, %hash, "head rejected, oracle cannot resolve it");
            return false;
        }
        let mut inner = self.inner.write();
        inner.head = Some(Head {
            header: header.clone(),
            hash,
        });
        inner.db.set_base_fee(header.base_fee_per_gas);
        match self.maintain(&mut inner) {
            Ok(()) => {
                tracing::info!(number = header.number, %hash, "head updated");
                true
            }
            Err(err) => {
                tracing::warn!(%err, "maintenance failed after head update");
                false
            }
        }
    }

    /// Force a full buckets-engine and packer pass without a head change
    pub fn trigger_reorg(&self) -> TxPoolResult<()> {
        let mut inner = self.inner.write();
        if inner.head.is_none() {
            return Err(TxPoolError::HeadUnknown);
        }
        self.maintain(&mut inner)
    }

    /// Drop every waste-basket entry; returns how many were dropped
    pub fn flush_rejects(&self) -> usize {
        let mut inner = self.inner.write();
        let flushed = inner.db.flush_rejects();
        self.metrics.set("txpool.basket", 0);
        flushed
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Look up a live item by id
    pub fn get(&self, id: H256) -> TxPoolResult<Item> {
        self.inner
            .read()
            .db
            .get(&id)
            .cloned()
            .ok_or(TxPoolError::UnknownItem(id))
    }

    /// Look up a disposed item in the waste basket
    pub fn rejected(&self, id: H256) -> Option<Item> {
        self.inner.read().db.basket().get(&id).cloned()
    }

    /// Live items in arrival order, optionally filtered by status
    pub fn items(&self, status: Option<ItemStatus>) -> Vec<Item> {
        self.inner
            .read()
            .db
            .items_by_arrival()
            .filter(|item| status.map_or(true, |s| item.status() == s))
            .cloned()
            .collect()
    }

    /// Per-bucket and total item counts
    pub fn counts(&self) -> Counts {
        self.inner.read().db.counts()
    }

    /// One sender's [pending, staged, packed] item counts
    pub fn sender_counts(&self, sender: Address) -> [usize; 3] {
        self.inner.read().db.sender_status_counts(sender)
    }

    /// Σ gas limit per bucket
    pub fn gas_totals(&self) -> GasTotals {
        let inner = self.inner.read();
        let mut totals = GasTotals::default();
        for item in inner.db.items_by_arrival() {
            match item.status() {
                ItemStatus::Pending => totals.pending += item.gas_limit(),
                ItemStatus::Staged => totals.staged += item.gas_limit(),
                ItemStatus::Packed => totals.packed += item.gas_limit(),
            }
        }
        totals
    }

    /// Σ effective tip × gas used over the current packed set
    pub fn profitability(&self) -> u128 {
        self.inner.read().packed.profitability
    }

    /// Total dry-run gas of the current packed set
    pub fn packed_gas(&self) -> u64 {
        self.inner.read().packed.gas_cumulative
    }

    /// Assemble the packed set into a block proposal
    pub fn assemble_block(&self) -> TxPoolResult<Block> {
        let inner = self.inner.read();
        let Some(head) = &inner.head else {
            return Err(TxPoolError::HeadUnknown);
        };
        let txs: Vec<SignedTransaction> = inner
            .packed
            .order
            .iter()
            .filter_map(|id| inner.db.get(id))
            .map(|item| item.tx().clone())
            .collect();
        let header = BlockHeader {
            parent_hash: head.hash,
            beneficiary: head.header.beneficiary,
            // Roots are the executor's to fill in
            state_root: H256::ZERO,
            transactions_root: H256::ZERO,
            number: head.header.number + 1,
            gas_limit: inner.cfg.max_gas_limit,
            gas_used: inner.packed.gas_cumulative,
            timestamp: self.clock.now_millis() / 1_000,
            extra_data: Bytes::new(),
            base_fee_per_gas: inner.db.base_fee(),
        };
        tracing::info!(
            number = header.number,
            txs = txs.len(),
            gas_used = header.gas_used,
            "assembled block"
        );
        Ok(Block {
            header,
            txs,
            withdrawals: None,
        })
    }

    /// Re-check every structural invariant; for tests and debugging
    pub fn verify(&self) -> Result<(), String> {
        verify::check_invariants(&self.inner.read().db)
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Override the base fee the pool classifies and ranks against
    pub fn set_base_fee(&self, base_fee: Option<u128>) -> TxPoolResult<()> {
        let mut inner = self.inner.write();
        inner.db.set_base_fee(base_fee);
        self.maintain(&mut inner)
    }

    /// Base fee currently in effect
    pub fn base_fee(&self) -> Option<u128> {
        self.inner.read().db.base_fee()
    }

    /// Set the item lifetime used by the zombifier
    pub fn set_life_time(&self, life_time: Duration) {
        self.inner.write().cfg.life_time = life_time;
    }

    /// Set the pre-London gas price floor and reconcile
    pub fn set_min_gas_price(&self, price: u128) -> TxPoolResult<()> {
        let mut inner = self.inner.write();
        inner.cfg.min_pre_london_gas_price = price;
        self.maintain(&mut inner)
    }

    /// Set the supersede price bump percentage
    pub fn set_price_bump(&self, bump: u8) {
        self.inner.write().cfg.price_bump = bump;
    }

    /// Replace the behavior flags and reconcile
    pub fn set_flags(&self, flags: PoolFlags) -> TxPoolResult<()> {
        let mut inner = self.inner.write();
        inner.cfg.flags = flags;
        self.maintain(&mut inner)
    }

    /// Current behavior flags
    pub fn flags(&self) -> PoolFlags {
        self.inner.read().cfg.flags
    }

    /// Resize the waste basket
    pub fn set_max_rejects(&self, capacity: usize) {
        let mut inner = self.inner.write();
        inner.cfg.max_rejects = capacity;
        inner.db.set_max_rejects(capacity);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate and link one transaction. Failures other than `Duplicate`
    /// leave a record in the waste basket.
    fn insert_tx(
        &self,
        inner: &mut PoolInner,
        tx: &SignedTransaction,
        info: &str,
    ) -> TxPoolResult<H256> {
        let id = tx.hash();
        if inner.db.contains(&id) {
            return Err(TxPoolError::Duplicate(id));
        }
        let Some(head) = &inner.head else {
            return Err(TxPoolError::HeadUnknown);
        };
        let (head_hash, pre_london) = (head.hash, head.header.base_fee_per_gas.is_none());
        let now = self.clock.now_millis();

        let sender = match self.recovery.recover(tx) {
            Ok(sender) => sender,
            Err(_) => {
                let seq = inner.db.next_seq();
                let item = Item::new(id, tx.clone(), Address::ZERO, now, seq, info.into(), false);
                inner.db.record_reject(item, RejectReason::SenderUnknown);
                return Err(TxPoolError::SenderUnknown);
            }
        };
        let local = inner.cfg.local_accounts.contains(&sender);

        // Resurrection carries the old info and a strictly newer timestamp
        let (info, timestamp, resurrected) = match inner.db.take_reject(&id) {
            Some(old) => (old.info().to_string(), now.max(old.timestamp() + 1), true),
            None => (info.to_string(), now, false),
        };

        let reject = |inner: &mut PoolInner, reason: RejectReason, err: TxPoolError| {
            let seq = inner.db.next_seq();
            let item = Item::new(id, tx.clone(), sender, timestamp, seq, info.clone(), local);
            inner.db.record_reject(item, reason);
            Err(err)
        };

        if pre_london && tx.tx_type == TxType::DynamicFee {
            return reject(inner, RejectReason::InvalidType, TxPoolError::InvalidType);
        }
        if tx.gas_limit() < MIN_TX_GAS {
            return reject(
                inner,
                RejectReason::GasLimitTooLow,
                TxPoolError::GasLimitTooLow(tx.gas_limit()),
            );
        }

        let onchain_nonce = self
            .oracle
            .account_nonce(sender, head_hash)
            .map_err(|_| TxPoolError::HeadUnknown)?;
        if tx.nonce() < onchain_nonce {
            return reject(
                inner,
                RejectReason::NonceTooLow,
                TxPoolError::NonceTooLow {
                    expected: onchain_nonce,
                    got: tx.nonce(),
                },
            );
        }
        let balance = self
            .oracle
            .account_balance(sender, head_hash)
            .map_err(|_| TxPoolError::HeadUnknown)?;
        if balance < tx.max_cost() {
            return reject(
                inner,
                RejectReason::InsufficientFunds,
                TxPoolError::InsufficientFunds {
                    required: tx.max_cost(),
                    available: balance,
                },
            );
        }

        let seq = inner.db.next_seq();
        let item = Item::new(id, tx.clone(), sender, timestamp, seq, info.clone(), local);
        let price_bump = inner.cfg.price_bump;
        match inner.db.insert(item, price_bump) {
            Ok(outcome) => {
                if resurrected {
                    self.metrics.inc("txpool.resurrections");
                }
                self.metrics
                    .add("txpool.implied_evictions", outcome.implied_evictions as u64);
                Ok(id)
            }
            Err(err @ TxPoolError::NonceGap { .. }) => {
                reject(inner, RejectReason::NonceGap, err)
            }
            Err(err @ TxPoolError::Underpriced { .. }) => {
                reject(inner, RejectReason::Underpriced, err)
            }
            Err(err) => Err(err),
        }
    }

    /// Zombify, reconcile buckets, and re-pack. No-op without a head.
    fn maintain(&self, inner: &mut PoolInner) -> TxPoolResult<()> {
        let PoolInner {
            db,
            cfg,
            head,
            packed,
        } = inner;
        let Some(head) = head else {
            return Ok(());
        };
        let now = self.clock.now_millis();
        let base_fee = db.base_fee();
        buckets::run(db, self.oracle.as_ref(), head.hash, base_fee, cfg, now, &self.metrics)?;
        *packed = packer::pack(
            db,
            self.oracle.as_ref(),
            self.vm.as_ref(),
            &head.header,
            base_fee,
            cfg,
            &self.metrics,
        )?;
        self.metrics.set("txpool.live", db.len() as i64);
        self.metrics.set("txpool.basket", db.basket().len() as i64);
        Ok(())
    }
}
