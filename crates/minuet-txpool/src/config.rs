//! Pool configuration

use std::collections::HashSet;
use std::time::Duration;

use minuet_primitives::Address;

/// Intrinsic gas of a plain value transfer
pub const MIN_TX_GAS: u64 = 21_000;

/// Behavior toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolFlags {
    /// Expire packed items past their lifetime
    pub auto_zombify_packed: bool,
    /// Expire pending and staged items past their lifetime
    pub auto_zombify_unpacked: bool,
    /// Let the packer fill up to the hard gas limit instead of the target
    pub pack_items_max_gas_limit: bool,
    /// Keep probing other senders after the first does-not-fit front
    pub pack_items_try_harder: bool,
}

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum percent price increase for a replacement to supersede
    pub price_bump: u8,
    /// Age past which items become eligible for expiry
    pub life_time: Duration,
    /// Waste basket capacity
    pub max_rejects: usize,
    /// Minimum gas price accepted for staging before London
    pub min_pre_london_gas_price: u128,
    /// Minimum priority fee accepted for staging after London
    pub min_priority_fee: u128,
    /// Soft per-block gas target for the packer
    pub trg_gas_limit: u64,
    /// Hard per-block gas limit
    pub max_gas_limit: u64,
    /// Behavior toggles
    pub flags: PoolFlags,
    /// Accounts whose items count as local (never expired)
    pub local_accounts: HashSet<Address>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            price_bump: 10,
            life_time: Duration::from_secs(60 * 60),
            max_rejects: 500,
            min_pre_london_gas_price: 1_000_000_000, // 1 gwei
            min_priority_fee: 1_000_000_000,         // 1 gwei
            trg_gas_limit: 15_000_000,
            max_gas_limit: 30_000_000,
            flags: PoolFlags::default(),
            local_accounts: HashSet::new(),
        }
    }
}

impl PoolConfig {
    /// Minimum effective tip required for staging at the given base fee.
    ///
    /// Before London (no base fee) the whole gas price is the producer's,
    /// so the pre-London floor applies; after London only the priority fee
    /// is, so the priority floor applies.
    pub fn min_tip(&self, base_fee: Option<u128>) -> u128 {
        if base_fee.is_none() {
            self.min_pre_london_gas_price
        } else {
            self.min_priority_fee
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.price_bump, 10);
        assert_eq!(cfg.max_rejects, 500);
        assert!(cfg.trg_gas_limit <= cfg.max_gas_limit);
        assert!(!cfg.flags.auto_zombify_unpacked);
    }

    #[test]
    fn test_min_tip_selects_floor_by_fork() {
        let cfg = PoolConfig {
            min_pre_london_gas_price: 7,
            min_priority_fee: 3,
            ..Default::default()
        };
        assert_eq!(cfg.min_tip(None), 7);
        assert_eq!(cfg.min_tip(Some(100)), 3);
    }
}
