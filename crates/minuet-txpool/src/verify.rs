//! Debug invariant verifier.
//!
//! Re-checks the store's cross-index invariants; tests call this after
//! every public operation. A violation here is a pool bug, never a caller
//! error, so the result is a plain description rather than a typed error.

use std::collections::HashSet;

use crate::item::ItemStatus;
use crate::store::TxDb;

/// Check every structural invariant of the store.
///
/// Returns a description of the first violation found.
pub fn check_invariants(db: &TxDb) -> Result<(), String> {
    let counts = db.counts();

    // Bucket counts must add up to the live total
    if counts.pending + counts.staged + counts.packed != counts.total {
        return Err(format!(
            "bucket counts {}+{}+{} do not sum to total {}",
            counts.pending, counts.staged, counts.packed, counts.total
        ));
    }

    // Rank and arrival traversals must cover every live item exactly once
    let rank_ids: Vec<_> = db.rank_asc().map(|it| it.id()).collect();
    if rank_ids.len() != counts.total || rank_ids.iter().collect::<HashSet<_>>().len() != counts.total {
        return Err(format!(
            "rank index covers {} entries for {} live items",
            rank_ids.len(),
            counts.total
        ));
    }
    let arrival_ids: Vec<_> = db.items_by_arrival().map(|it| it.id()).collect();
    if arrival_ids.len() != counts.total
        || arrival_ids.iter().collect::<HashSet<_>>().len() != counts.total
    {
        return Err(format!(
            "arrival index covers {} entries for {} live items",
            arrival_ids.len(),
            counts.total
        ));
    }

    // Status index must agree with each item's status field
    let mut status_total = 0;
    for status in ItemStatus::ALL {
        for id in db.status_ids(status) {
            status_total += 1;
            match db.get(&id) {
                Some(item) if item.status() == status => {}
                Some(item) => {
                    return Err(format!(
                        "item {id} is {:?} but indexed as {status:?}",
                        item.status()
                    ));
                }
                None => return Err(format!("status index holds dead id {id}")),
            }
        }
    }
    if status_total != counts.total {
        return Err(format!(
            "status indexes hold {status_total} ids for {} live items",
            counts.total
        ));
    }

    // Per sender: the sender index points at live items of that sender,
    // nonces are contiguous, and bucket order along nonces never promotes
    // again after a demotion
    let mut sender_total = 0;
    for sender in db.senders() {
        let nonces = db.sender_nonces(sender);
        let mut prev_nonce: Option<u64> = None;
        let mut prev_status: Option<ItemStatus> = None;
        for (nonce, id) in nonces {
            sender_total += 1;
            let Some(item) = db.get(&id) else {
                return Err(format!("sender index holds dead id {id}"));
            };
            if item.sender() != sender || item.nonce() != nonce {
                return Err(format!("sender index mislinked for id {id}"));
            }
            if let Some(prev) = prev_nonce {
                if nonce != prev + 1 {
                    return Err(format!(
                        "sender {sender} has nonce gap between {prev} and {nonce}"
                    ));
                }
            }
            if let Some(prev) = prev_status {
                if item.status() > prev {
                    return Err(format!(
                        "sender {sender} has {:?} at nonce {nonce} after {prev:?}",
                        item.status()
                    ));
                }
            }
            prev_nonce = Some(nonce);
            prev_status = Some(item.status());
        }
    }
    if sender_total != counts.total {
        return Err(format!(
            "sender index holds {sender_total} ids for {} live items",
            counts.total
        ));
    }

    // Live store and waste basket must be disjoint
    for item in db.basket().iter() {
        if db.contains(&item.id()) {
            return Err(format!("id {} is both live and disposed", item.id()));
        }
        if item.reject().is_none() {
            return Err(format!("basket item {} carries no reject reason", item.id()));
        }
    }
    if counts.disposed != db.basket().len() {
        return Err(format!(
            "disposed count {} does not match basket size {}",
            counts.disposed,
            db.basket().len()
        ));
    }

    Ok(())
}
