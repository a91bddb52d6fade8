//! Packer: selects the packed set for the next block.
//!
//! Pure function over the staged bucket: clears any previous packed set
//! back to staged, then greedily pulls the highest-tipped sender front,
//! dry-running each transaction against a copy-on-write sandbox until the
//! block gas budget is spent. Deterministic, so re-running without
//! intervening mutation reproduces the same packed list.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::cmp::Reverse;

use minuet_metrics::Metrics;
use minuet_primitives::{Address, H256};
use minuet_types::BlockHeader;

use crate::config::PoolConfig;
use crate::error::TxPoolResult;
use crate::item::{ItemStatus, RejectReason};
use crate::store::TxDb;
use crate::traits::{Sandbox, StateOracle, VmError, VmExecutor};

/// The packed set and its accounting
#[derive(Debug, Default, Clone)]
pub(crate) struct PackOutcome {
    /// Packed item ids in inclusion order
    pub order: Vec<H256>,
    /// Dry-run gas per packed item
    pub gas_used: HashMap<H256, u64>,
    /// Total dry-run gas of the packed set
    pub gas_cumulative: u64,
    /// Σ effective tip × gas used over the packed set
    pub profitability: u128,
}

/// Sender front in the selection heap: highest tip first, earlier arrival
/// breaking ties.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Front {
    tip: u128,
    arrival: Reverse<u64>,
    sender: Address,
}

/// Select and mark the packed set.
pub(crate) fn pack(
    db: &mut TxDb,
    oracle: &dyn StateOracle,
    vm: &dyn VmExecutor,
    header: &BlockHeader,
    base_fee: Option<u128>,
    cfg: &PoolConfig,
    metrics: &Metrics,
) -> TxPoolResult<PackOutcome> {
    // Re-pack from scratch so the result only depends on current state
    for id in db.status_ids(ItemStatus::Packed) {
        db.reassign(id, ItemStatus::Staged)?;
    }

    let mut queues: HashMap<Address, VecDeque<H256>> = HashMap::new();
    for sender in db.senders() {
        let staged: VecDeque<H256> = db
            .sender_items(sender)
            .filter(|item| item.status() == ItemStatus::Staged)
            .map(|item| item.id())
            .collect();
        if !staged.is_empty() {
            queues.insert(sender, staged);
        }
    }

    let mut heap: BinaryHeap<Front> = BinaryHeap::new();
    for (sender, queue) in &queues {
        if let Some(item) = queue.front().and_then(|id| db.get(id)) {
            heap.push(Front {
                tip: item.rank_tip(base_fee),
                arrival: Reverse(item.seq()),
                sender: *sender,
            });
        }
    }

    let gas_limit_budget = if cfg.flags.pack_items_max_gas_limit {
        cfg.max_gas_limit
    } else {
        cfg.trg_gas_limit
    };

    let mut sandbox = Sandbox::new(oracle, header.hash());
    let mut out = PackOutcome::default();

    while let Some(front) = heap.pop() {
        let Some(queue) = queues.get_mut(&front.sender) else {
            continue;
        };
        let Some(&id) = queue.front() else {
            continue;
        };
        let Some(item) = db.get(&id) else {
            queue.pop_front();
            continue;
        };

        // Reserve block space by the declared gas limit before running
        if out.gas_cumulative + item.gas_limit() > gas_limit_budget {
            queues.remove(&front.sender);
            if cfg.flags.pack_items_try_harder {
                continue;
            }
            break;
        }

        let tx = item.tx().clone();
        let sender = item.sender();
        let tip = item.rank_tip(base_fee);

        match vm.dry_run(&tx, sender, &mut sandbox, header) {
            Ok(gas) => {
                db.reassign(id, ItemStatus::Packed)?;
                queue.pop_front();
                out.order.push(id);
                out.gas_used.insert(id, gas);
                out.gas_cumulative += gas;
                out.profitability += tip * u128::from(gas);
                if let Some(next) = queue.front().and_then(|id| db.get(id)) {
                    heap.push(Front {
                        tip: next.rank_tip(base_fee),
                        arrival: Reverse(next.seq()),
                        sender: front.sender,
                    });
                }
            }
            Err(VmError::OutOfGas) => {
                // No room left for this sender in this block
                queues.remove(&front.sender);
            }
            Err(VmError::Execution(reason)) => {
                tracing::warn!(id = %id, %reason, "dry-run failed, disposing item");
                db.dispose_cascade(id, RejectReason::VmError);
                metrics.inc("txpool.rejects");
                queues.remove(&front.sender);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::traits::OracleError;
    use minuet_primitives::U256;
    use minuet_types::{LegacyTx, SignedTransaction, TxSignature};

    struct RichOracle;

    impl StateOracle for RichOracle {
        fn account_nonce(&self, _addr: Address, _head: H256) -> Result<u64, OracleError> {
            Ok(0)
        }

        fn account_balance(&self, _addr: Address, _head: H256) -> Result<U256, OracleError> {
            Ok(U256::from(u128::MAX))
        }

        fn base_fee(&self, _head: H256) -> Result<Option<u128>, OracleError> {
            Ok(None)
        }
    }

    /// Burns the declared gas limit; calldata starting 0xff reverts,
    /// 0xfe reports out-of-gas.
    struct ExactVm;

    impl VmExecutor for ExactVm {
        fn dry_run(
            &self,
            tx: &SignedTransaction,
            _sender: Address,
            _sandbox: &mut Sandbox<'_>,
            _header: &BlockHeader,
        ) -> Result<u64, VmError> {
            match tx.data().first() {
                Some(&0xff) => Err(VmError::Execution("revert".into())),
                Some(&0xfe) => Err(VmError::OutOfGas),
                _ => Ok(tx.gas_limit()),
            }
        }
    }

    fn stage_item(
        db: &mut TxDb,
        sender: u8,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        data: &[u8],
    ) -> H256 {
        let seq = db.next_seq();
        let tx = SignedTransaction::new_legacy(
            LegacyTx {
                nonce,
                gas_price,
                gas_limit,
                to: Some(Address::from_bytes([0x42; 20])),
                value: u128::from(seq),
                data: bytes::Bytes::copy_from_slice(data),
            },
            TxSignature::new(
                27,
                H256::from_bytes([sender; 32]),
                H256::from_bytes([2; 32]),
            ),
        );
        let item = Item::new(
            tx.hash(),
            tx,
            Address::from_bytes([sender; 20]),
            1_000 + seq,
            seq,
            String::new(),
            false,
        );
        let id = item.id();
        db.insert(item, 10).unwrap();
        db.reassign(id, ItemStatus::Staged).unwrap();
        id
    }

    fn run(db: &mut TxDb, cfg: &PoolConfig) -> PackOutcome {
        let metrics = Metrics::new();
        pack(
            db,
            &RichOracle,
            &ExactVm,
            &BlockHeader::genesis(),
            None,
            cfg,
            &metrics,
        )
        .unwrap()
    }

    fn cfg(trg: u64, max: u64) -> PoolConfig {
        PoolConfig {
            trg_gas_limit: trg,
            max_gas_limit: max,
            ..Default::default()
        }
    }

    // ==================== Selection tests ====================

    #[test]
    fn test_highest_tip_first_nonce_order_kept() {
        let mut db = TxDb::new(10, None);
        let a0 = stage_item(&mut db, 0xaa, 0, 10, 21_000, &[]);
        let a1 = stage_item(&mut db, 0xaa, 1, 90, 21_000, &[]); // rich but behind a0
        let b0 = stage_item(&mut db, 0xbb, 0, 50, 21_000, &[]);

        let out = run(&mut db, &cfg(1_000_000, 2_000_000));

        // b0 (tip 50) beats a0 (tip 10); a1 only after a0
        assert_eq!(out.order, vec![b0, a0, a1]);
        assert_eq!(out.gas_cumulative, 63_000);
        for id in &out.order {
            assert_eq!(db.get(id).unwrap().status(), ItemStatus::Packed);
        }
    }

    #[test]
    fn test_arrival_breaks_tip_ties() {
        let mut db = TxDb::new(10, None);
        let first = stage_item(&mut db, 0xbb, 0, 50, 21_000, &[]);
        let second = stage_item(&mut db, 0xaa, 0, 50, 21_000, &[]);

        let out = run(&mut db, &cfg(1_000_000, 2_000_000));
        assert_eq!(out.order, vec![first, second]);
    }

    #[test]
    fn test_idempotent_without_mutation() {
        let mut db = TxDb::new(10, None);
        for sender in [0xaa, 0xbb, 0xcc] {
            for nonce in 0..3 {
                stage_item(&mut db, sender, nonce, 10 + u128::from(sender), 21_000, &[]);
            }
        }
        let first = run(&mut db, &cfg(1_000_000, 2_000_000));
        let second = run(&mut db, &cfg(1_000_000, 2_000_000));
        assert_eq!(first.order, second.order);
        assert_eq!(first.gas_cumulative, second.gas_cumulative);
        assert_eq!(first.profitability, second.profitability);
    }

    // ==================== Gas budget tests ====================

    #[test]
    fn test_stops_at_target_gas() {
        let mut db = TxDb::new(10, None);
        stage_item(&mut db, 0xaa, 0, 90, 21_000, &[]);
        stage_item(&mut db, 0xbb, 0, 50, 21_000, &[]);
        stage_item(&mut db, 0xcc, 0, 10, 21_000, &[]);

        let out = run(&mut db, &cfg(45_000, 2_000_000));
        assert_eq!(out.order.len(), 2);
        assert_eq!(out.gas_cumulative, 42_000);
        assert_eq!(db.status_count(ItemStatus::Staged), 1);
    }

    #[test]
    fn test_max_flag_extends_budget() {
        let mut db = TxDb::new(10, None);
        stage_item(&mut db, 0xaa, 0, 90, 21_000, &[]);
        stage_item(&mut db, 0xbb, 0, 50, 21_000, &[]);
        stage_item(&mut db, 0xcc, 0, 10, 21_000, &[]);

        let mut config = cfg(45_000, 70_000);
        config.flags.pack_items_max_gas_limit = true;
        let out = run(&mut db, &config);
        assert_eq!(out.order.len(), 3);
        assert_eq!(out.gas_cumulative, 63_000);
    }

    #[test]
    fn test_try_harder_fills_around_big_item() {
        let mut db = TxDb::new(10, None);
        // Highest tip but too big for the remaining budget
        stage_item(&mut db, 0xaa, 0, 90, 40_000, &[]);
        let small = stage_item(&mut db, 0xbb, 0, 10, 21_000, &[]);

        // Without try-harder the first no-fit ends the block
        let out = run(&mut db, &cfg(30_000, 60_000));
        assert!(out.order.is_empty());

        let mut config = cfg(30_000, 60_000);
        config.flags.pack_items_try_harder = true;
        let out = run(&mut db, &config);
        assert_eq!(out.order, vec![small]);
    }

    // ==================== Failure tests ====================

    #[test]
    fn test_exec_error_disposes_with_cascade() {
        let mut db = TxDb::new(10, None);
        let bad = stage_item(&mut db, 0xaa, 0, 90, 21_000, &[0xff]);
        let dependent = stage_item(&mut db, 0xaa, 1, 90, 21_000, &[]);
        let other = stage_item(&mut db, 0xbb, 0, 10, 21_000, &[]);

        let out = run(&mut db, &cfg(1_000_000, 2_000_000));

        assert_eq!(out.order, vec![other]);
        assert!(!db.contains(&bad));
        assert!(!db.contains(&dependent));
        assert_eq!(db.basket().get(&bad).unwrap().reject(), Some(RejectReason::VmError));
        assert_eq!(db.basket().get(&dependent).unwrap().reject(), Some(RejectReason::NonceGap));
    }

    #[test]
    fn test_out_of_gas_parks_sender_without_disposing() {
        let mut db = TxDb::new(10, None);
        // Highest-tip front reports out-of-gas; its dependent must wait too
        let starved = stage_item(&mut db, 0xaa, 0, 90, 21_000, &[0xfe]);
        let dependent = stage_item(&mut db, 0xaa, 1, 90, 21_000, &[]);
        let other = stage_item(&mut db, 0xbb, 0, 10, 21_000, &[]);

        let out = run(&mut db, &cfg(1_000_000, 2_000_000));

        // Only the other sender is packed; the starved sender keeps its
        // items staged and nothing lands in the basket
        assert_eq!(out.order, vec![other]);
        assert_eq!(db.get(&starved).unwrap().status(), ItemStatus::Staged);
        assert_eq!(db.get(&dependent).unwrap().status(), ItemStatus::Staged);
        assert!(db.basket().is_empty());
    }

    #[test]
    fn test_empty_staged_packs_nothing() {
        let mut db = TxDb::new(10, None);
        let out = run(&mut db, &cfg(1_000_000, 2_000_000));
        assert!(out.order.is_empty());
        assert_eq!(out.gas_cumulative, 0);
        assert_eq!(out.profitability, 0);
    }
}
