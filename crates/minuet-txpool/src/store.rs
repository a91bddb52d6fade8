//! Multi-indexed store of live items.
//!
//! One canonical record per item, coordinated across five indexes:
//! identity, sender+nonce, effective-tip rank, status, and arrival time.
//! Every mutating operation either fully succeeds with all indexes in sync
//! or leaves the store unchanged and returns a typed error. Disposed items
//! move to the embedded [`WasteBasket`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use minuet_primitives::{Address, H256};

use crate::basket::WasteBasket;
use crate::error::{TxPoolError, TxPoolResult};
use crate::item::{Item, ItemStatus, RejectReason};

/// Rank index key: ascending effective tip, ties broken by sender bytes
/// then nonce. Descending traversal yields the most profitable item first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    tip: u128,
    sender: Address,
    nonce: u64,
}

/// What an insert did besides linking the new item
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// An incumbent at the same sender and nonce was replaced
    pub superseded: bool,
    /// Higher-nonce items of the sender disposed as a consequence
    pub implied_evictions: usize,
}

/// Per-bucket and total item counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Items parked as pending
    pub pending: usize,
    /// Items staged for inclusion
    pub staged: usize,
    /// Items packed into the next block
    pub packed: usize,
    /// All live items
    pub total: usize,
    /// Items in the waste basket
    pub disposed: usize,
}

/// Multi-indexed transaction store
pub struct TxDb {
    items: HashMap<H256, Item>,
    by_sender: HashMap<Address, BTreeMap<u64, H256>>,
    rank: BTreeSet<RankKey>,
    by_status: [BTreeSet<H256>; 3],
    by_arrival: BTreeMap<(u64, u64), H256>,
    basket: WasteBasket,
    base_fee: Option<u128>,
    next_seq: u64,
}

impl TxDb {
    /// Create an empty store with the given basket capacity and base fee
    pub fn new(max_rejects: usize, base_fee: Option<u128>) -> Self {
        Self {
            items: HashMap::new(),
            by_sender: HashMap::new(),
            rank: BTreeSet::new(),
            by_status: Default::default(),
            by_arrival: BTreeMap::new(),
            basket: WasteBasket::new(max_rejects),
            base_fee,
            next_seq: 0,
        }
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no item is live
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Next arrival sequence number
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Base fee the rank index is currently keyed at
    pub fn base_fee(&self) -> Option<u128> {
        self.base_fee
    }

    /// Re-key the rank index at a new base fee
    pub fn set_base_fee(&mut self, base_fee: Option<u128>) {
        if self.base_fee == base_fee {
            return;
        }
        self.base_fee = base_fee;
        self.rank = self.items.values().map(|it| self.rank_key(it)).collect();
    }

    fn rank_key(&self, item: &Item) -> RankKey {
        RankKey {
            tip: item.rank_tip(self.base_fee),
            sender: item.sender(),
            nonce: item.nonce(),
        }
    }

    /// Check whether an id is live
    pub fn contains(&self, id: &H256) -> bool {
        self.items.contains_key(id)
    }

    /// Look up a live item
    pub fn get(&self, id: &H256) -> Option<&Item> {
        self.items.get(id)
    }

    /// The waste basket of disposed items
    pub fn basket(&self) -> &WasteBasket {
        &self.basket
    }

    /// Pull a disposed item out of the basket, e.g. for resurrection
    pub fn take_reject(&mut self, id: &H256) -> Option<Item> {
        self.basket.take(id)
    }

    /// Resize the waste basket, evicting oldest entries when shrinking
    pub fn set_max_rejects(&mut self, capacity: usize) -> usize {
        self.basket.set_capacity(capacity)
    }

    /// Drop every basket entry; returns how many were dropped
    pub fn flush_rejects(&mut self) -> usize {
        self.basket.clear()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Link a new item into all five indexes.
    ///
    /// A sender+nonce collision triggers the supersede path: the incumbent
    /// must be beaten by at least `price_bump` percent of effective tip,
    /// the incumbent moves to the basket as `Replaced`, and every
    /// higher-nonce item of the sender is disposed as an implied
    /// `NonceGap` eviction. A nonce that would leave the sender's
    /// sequence non-contiguous is rejected outright.
    pub fn insert(&mut self, item: Item, price_bump: u8) -> TxPoolResult<InsertOutcome> {
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(TxPoolError::Duplicate(id));
        }

        let sender = item.sender();
        let nonce = item.nonce();
        let mut outcome = InsertOutcome::default();

        let collision = match self.by_sender.get(&sender) {
            Some(bucket) if !bucket.is_empty() => {
                // Bucket keys are contiguous, so first/last bound the range
                let first = *bucket.keys().next().expect("bucket not empty");
                let last = *bucket.keys().next_back().expect("bucket not empty");
                if bucket.contains_key(&nonce) {
                    Some(bucket[&nonce])
                } else if nonce > last + 1 {
                    return Err(TxPoolError::NonceGap {
                        expected: last + 1,
                        got: nonce,
                    });
                } else if nonce + 1 < first {
                    return Err(TxPoolError::NonceGap {
                        expected: first - 1,
                        got: nonce,
                    });
                } else {
                    None
                }
            }
            _ => None,
        };

        if let Some(old_id) = collision {
            let old_tip = self.items[&old_id].rank_tip(self.base_fee);
            let new_tip = item.rank_tip(self.base_fee);
            let threshold = old_tip.saturating_mul(100 + u128::from(price_bump)) / 100;
            if new_tip < threshold {
                return Err(TxPoolError::Underpriced {
                    old: old_tip,
                    new: new_tip,
                });
            }
            tracing::debug!(id = %id, old = %old_id, old_tip, new_tip, "superseding item");
            outcome.superseded = true;
            outcome.implied_evictions = self.dispose_from(sender, nonce + 1, RejectReason::NonceGap);
            self.dispose(old_id, RejectReason::Replaced);
        }

        self.link(item);
        Ok(outcome)
    }

    /// Unlink an item from all indexes and push it into the basket.
    ///
    /// Never fails; returns false if the id was not live.
    pub fn dispose(&mut self, id: H256, reason: RejectReason) -> bool {
        let Some(mut item) = self.unlink(id) else {
            return false;
        };
        tracing::debug!(id = %id, ?reason, "item disposed");
        item.reject = Some(reason);
        if let Some(dropped) = self.basket.push(item) {
            tracing::warn!(id = %dropped.id(), "waste basket full, dropping oldest entry");
        }
        true
    }

    /// Dispose every live item of `sender` with nonce ≥ `from_nonce`,
    /// highest nonce first so the sequence stays contiguous at each step.
    ///
    /// Returns the number of items disposed.
    pub fn dispose_from(&mut self, sender: Address, from_nonce: u64, reason: RejectReason) -> usize {
        let ids: Vec<H256> = self
            .by_sender
            .get(&sender)
            .map(|bucket| bucket.range(from_nonce..).map(|(_, id)| *id).collect())
            .unwrap_or_default();
        let mut disposed = 0;
        for id in ids.into_iter().rev() {
            if self.dispose(id, reason) {
                disposed += 1;
            }
        }
        disposed
    }

    /// Dispose one item with `reason` and its higher-nonce dependents as
    /// implied `NonceGap` evictions.
    ///
    /// Returns the implied eviction count, or None if the id was not live.
    pub fn dispose_cascade(&mut self, id: H256, reason: RejectReason) -> Option<usize> {
        let item = self.items.get(&id)?;
        let (sender, nonce) = (item.sender(), item.nonce());
        let implied = self.dispose_from(sender, nonce + 1, RejectReason::NonceGap);
        self.dispose(id, reason);
        Some(implied)
    }

    /// Record an item that never made it into the live store, e.g. an
    /// add-time rejection.
    pub fn record_reject(&mut self, mut item: Item, reason: RejectReason) {
        item.reject = Some(reason);
        if let Some(dropped) = self.basket.push(item) {
            tracing::warn!(id = %dropped.id(), "waste basket full, dropping oldest entry");
        }
    }

    /// Move an item to another status bucket. Updates the status index
    /// only; eligibility is the policy layer's business.
    pub fn reassign(&mut self, id: H256, status: ItemStatus) -> TxPoolResult<()> {
        let item = self
            .items
            .get_mut(&id)
            .ok_or(TxPoolError::UnknownItem(id))?;
        let old = item.status;
        if old == status {
            return Ok(());
        }
        item.status = status;
        self.by_status[old.index()].remove(&id);
        self.by_status[status.index()].insert(id);
        Ok(())
    }

    fn link(&mut self, item: Item) {
        let id = item.id();
        let key = self.rank_key(&item);
        self.by_sender
            .entry(item.sender())
            .or_default()
            .insert(item.nonce(), id);
        self.rank.insert(key);
        self.by_status[item.status().index()].insert(id);
        self.by_arrival.insert((item.timestamp(), item.seq()), id);
        self.items.insert(id, item);
    }

    fn unlink(&mut self, id: H256) -> Option<Item> {
        let item = self.items.remove(&id)?;
        if let Some(bucket) = self.by_sender.get_mut(&item.sender()) {
            bucket.remove(&item.nonce());
            if bucket.is_empty() {
                self.by_sender.remove(&item.sender());
            }
        }
        let key = self.rank_key(&item);
        self.rank.remove(&key);
        self.by_status[item.status().index()].remove(&id);
        self.by_arrival.remove(&(item.timestamp(), item.seq()));
        Some(item)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// All senders with live items
    pub fn senders(&self) -> Vec<Address> {
        self.by_sender.keys().copied().collect()
    }

    /// A sender's (nonce, id) pairs in ascending nonce order
    pub fn sender_nonces(&self, sender: Address) -> Vec<(u64, H256)> {
        self.by_sender
            .get(&sender)
            .map(|bucket| bucket.iter().map(|(n, id)| (*n, *id)).collect())
            .unwrap_or_default()
    }

    /// A sender's items in ascending nonce order
    pub fn sender_items(&self, sender: Address) -> impl Iterator<Item = &Item> {
        self.by_sender
            .get(&sender)
            .into_iter()
            .flat_map(|bucket| bucket.values())
            .filter_map(|id| self.items.get(id))
    }

    /// Lowest live nonce of a sender
    pub fn first_nonce(&self, sender: Address) -> Option<u64> {
        self.by_sender
            .get(&sender)
            .and_then(|b| b.keys().next().copied())
    }

    /// Highest live nonce of a sender
    pub fn last_nonce(&self, sender: Address) -> Option<u64> {
        self.by_sender
            .get(&sender)
            .and_then(|b| b.keys().next_back().copied())
    }

    /// Per-status item counts for one sender
    pub fn sender_status_counts(&self, sender: Address) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for item in self.sender_items(sender) {
            counts[item.status().index()] += 1;
        }
        counts
    }

    /// Ids currently in the given status
    pub fn status_ids(&self, status: ItemStatus) -> Vec<H256> {
        self.by_status[status.index()].iter().copied().collect()
    }

    /// Number of items in the given status
    pub fn status_count(&self, status: ItemStatus) -> usize {
        self.by_status[status.index()].len()
    }

    /// Items in arrival order, oldest first
    pub fn items_by_arrival(&self) -> impl Iterator<Item = &Item> {
        self.by_arrival.values().filter_map(|id| self.items.get(id))
    }

    /// Items by ascending effective tip
    pub fn rank_asc(&self) -> impl Iterator<Item = &Item> {
        self.rank.iter().filter_map(|key| self.rank_lookup(key))
    }

    /// Items by descending effective tip
    pub fn rank_desc(&self) -> impl Iterator<Item = &Item> {
        self.rank
            .iter()
            .rev()
            .filter_map(|key| self.rank_lookup(key))
    }

    fn rank_lookup(&self, key: &RankKey) -> Option<&Item> {
        let id = self.by_sender.get(&key.sender)?.get(&key.nonce)?;
        self.items.get(id)
    }

    /// Per-bucket and total counts
    pub fn counts(&self) -> Counts {
        Counts {
            pending: self.status_count(ItemStatus::Pending),
            staged: self.status_count(ItemStatus::Staged),
            packed: self.status_count(ItemStatus::Packed),
            total: self.items.len(),
            disposed: self.basket.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn rank_len(&self) -> usize {
        self.rank.len()
    }

    #[cfg(test)]
    pub(crate) fn arrival_len(&self) -> usize {
        self.by_arrival.len()
    }
}
