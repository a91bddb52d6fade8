//! Eligibility predicates.
//!
//! Pure functions over an item and the current chain context; the buckets
//! engine composes them with the per-sender nonce and balance walk.

use crate::config::{PoolConfig, PoolFlags};
use crate::item::{Item, ItemStatus};

/// Fee-side staging check: the item must clear the configured tip floor
/// and, once a base fee exists, still pay a non-negative effective tip.
pub(crate) fn fee_ok(item: &Item, base_fee: Option<u128>, cfg: &PoolConfig) -> bool {
    match item.effective_tip(base_fee) {
        Some(tip) => tip >= cfg.min_tip(base_fee),
        // Base fee above the fee cap: not includable at all
        None => false,
    }
}

/// Age check: strictly older than the configured lifetime
pub(crate) fn is_expired(item: &Item, now_millis: u64, cfg: &PoolConfig) -> bool {
    let life = cfg.life_time.as_millis() as u64;
    now_millis > life && item.timestamp() < now_millis - life
}

/// Whether the zombifier may touch an item in the given bucket
pub(crate) fn may_zombify(status: ItemStatus, flags: &PoolFlags) -> bool {
    match status {
        ItemStatus::Packed => flags.auto_zombify_packed,
        ItemStatus::Pending | ItemStatus::Staged => flags.auto_zombify_unpacked,
    }
}
