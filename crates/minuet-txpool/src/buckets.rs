//! Buckets engine: moves items across pending/staged/packed.
//!
//! Runs after every mutating pool operation. First expires overdue items,
//! then walks each sender's nonce sequence against on-chain state,
//! promoting the contiguous affordable prefix to staged and parking the
//! rest as pending. Per-sender bucket order along nonces is non-decreasing
//! by construction.

use minuet_metrics::Metrics;
use minuet_primitives::H256;

use crate::classifier;
use crate::config::PoolConfig;
use crate::error::{TxPoolError, TxPoolResult};
use crate::item::{ItemStatus, RejectReason};
use crate::store::TxDb;
use crate::traits::StateOracle;

/// One full maintenance pass: zombify, then reconcile every sender.
pub(crate) fn run(
    db: &mut TxDb,
    oracle: &dyn StateOracle,
    head: H256,
    base_fee: Option<u128>,
    cfg: &PoolConfig,
    now: u64,
    metrics: &Metrics,
) -> TxPoolResult<()> {
    zombify(db, cfg, now, metrics);
    for sender in db.senders() {
        let onchain_nonce = oracle
            .account_nonce(sender, head)
            .map_err(|_| TxPoolError::HeadUnknown)?;
        let mut balance = oracle
            .account_balance(sender, head)
            .map_err(|_| TxPoolError::HeadUnknown)?;

        // Items whose nonce the chain already consumed
        let stale: Vec<H256> = db
            .sender_nonces(sender)
            .into_iter()
            .filter(|(nonce, _)| *nonce < onchain_nonce)
            .map(|(_, id)| id)
            .collect();
        for id in stale {
            db.dispose(id, RejectReason::NonceTooLow);
            metrics.inc("txpool.rejects");
        }

        // Promote the contiguous affordable prefix
        let mut running = onchain_nonce;
        let mut can_stay_packed = true;
        let mut demote_rest = false;
        for (nonce, id) in db.sender_nonces(sender) {
            if demote_rest || nonce != running {
                db.reassign(id, ItemStatus::Pending)?;
                demote_rest = true;
                continue;
            }
            let (eligible, cost, was_packed) = {
                let Some(item) = db.get(&id) else { continue };
                (
                    classifier::fee_ok(item, base_fee, cfg),
                    item.max_cost(),
                    item.status() == ItemStatus::Packed,
                )
            };
            if eligible && balance >= cost {
                let status = if was_packed && can_stay_packed {
                    ItemStatus::Packed
                } else {
                    can_stay_packed = false;
                    ItemStatus::Staged
                };
                db.reassign(id, status)?;
                balance -= cost;
                running += 1;
            } else {
                db.reassign(id, ItemStatus::Pending)?;
                can_stay_packed = false;
                demote_rest = true;
            }
        }
    }
    Ok(())
}

/// Move expired items to the basket, cascading their higher-nonce
/// dependents. Local items and buckets without their zombify flag are
/// left alone.
fn zombify(db: &mut TxDb, cfg: &PoolConfig, now: u64, metrics: &Metrics) {
    let mut expired: Vec<H256> = Vec::new();
    for item in db.items_by_arrival() {
        // Arrival order is non-decreasing in timestamp
        if !classifier::is_expired(item, now, cfg) {
            break;
        }
        if item.local() {
            continue;
        }
        if !classifier::may_zombify(item.status(), &cfg.flags) {
            continue;
        }
        expired.push(item.id());
    }
    for id in expired {
        // May already be gone if an earlier cascade swept it
        if let Some(implied) = db.dispose_cascade(id, RejectReason::Expired) {
            metrics.inc("txpool.evictions");
            metrics.add("txpool.implied_evictions", implied as u64);
        }
    }
}
