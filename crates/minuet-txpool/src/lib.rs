//! # minuet-txpool
//!
//! Transaction pool and block packer for the Minuet ledger.
//!
//! This crate provides:
//! - A multi-indexed store of candidate transactions, keyed by identity,
//!   sender+nonce, effective-tip rank, lifecycle status, and arrival time
//! - Supersede-by-price with cascade disposal of higher-nonce dependents
//! - A pending/staged/packed promotion pipeline driven by fee, nonce
//!   contiguity, balance, and base-fee rules, plus time-based expiry
//! - A waste basket of rejected items with bounded retention and
//!   resurrection on re-add
//! - A packer that assembles a profitable, well-formed block proposal
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------+
//! |                TxPool                 |  <- serialized façade
//! +---------------------------------------+
//!        |                   |
//! +-------------+    +--------------+
//! | Buckets     |    |   Packer     |  <- policy layers
//! | engine      |    |              |
//! +-------------+    +--------------+
//!        |                   |
//! +---------------------------------------+
//! |                 TxDb                  |  <- five coordinated indexes
//! +---------------------------------------+
//!        |
//! +-------------+
//! | WasteBasket |  <- bounded FIFO of rejects
//! +-------------+
//! ```
//!
//! The node wires in the external collaborators: a [`StateOracle`] for
//! account nonces and balances, a [`SenderRecovery`] for signatures, and a
//! [`VmExecutor`] for packer dry-runs.
//!
//! ## Usage
//!
//! ```ignore
//! use minuet_txpool::{PoolConfig, TxPool};
//!
//! let pool = TxPool::new(PoolConfig::default(), oracle, recovery, vm);
//! pool.update_head(&header);
//! pool.add(&txs, "rpc")?;
//! let block = pool.assemble_block()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod basket;
mod buckets;
mod classifier;
mod config;
mod error;
mod item;
mod packer;
mod pool;
mod store;
mod traits;
mod verify;

pub use basket::WasteBasket;
pub use config::{PoolConfig, PoolFlags, MIN_TX_GAS};
pub use error::{TxPoolError, TxPoolResult};
pub use item::{Item, ItemStatus, RejectReason};
pub use pool::{GasTotals, TxPool};
pub use store::{Counts, InsertOutcome, TxDb};
pub use traits::{
    Clock, OracleError, RecoveryError, Sandbox, SandboxAccount, SenderRecovery, StateOracle,
    SystemClock, VmError, VmExecutor,
};
pub use verify::check_invariants;
