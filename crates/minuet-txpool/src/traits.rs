//! External collaborators consumed by the pool.
//!
//! The pool never reads chain state, recovers signatures, or executes
//! bytecode itself; the node wires in implementations of these traits.

use std::collections::HashMap;

use minuet_primitives::{Address, H256, U256};
use minuet_types::{BlockHeader, SignedTransaction};
use thiserror::Error;

/// State oracle failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle holds no state for the given head hash
    #[error("unknown head: {0}")]
    UnknownHead(H256),
}

/// Read-only view of account state at a given head.
///
/// Accounts absent from state resolve to nonce zero and balance zero,
/// matching Ethereum semantics for untouched accounts.
pub trait StateOracle: Send + Sync {
    /// Account nonce at the given head
    fn account_nonce(&self, addr: Address, head: H256) -> Result<u64, OracleError>;

    /// Account balance at the given head
    fn account_balance(&self, addr: Address, head: H256) -> Result<U256, OracleError>;

    /// Base fee at the given head; None before London activation
    fn base_fee(&self, head: H256) -> Result<Option<u128>, OracleError>;
}

/// Signature recovery failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    /// The signature does not resolve to a sender
    #[error("invalid signature")]
    InvalidSignature,
}

/// Recovers the sender address from a signed transaction
pub trait SenderRecovery: Send + Sync {
    /// Recover the sender, failing fast on malformed signatures
    fn recover(&self, tx: &SignedTransaction) -> Result<Address, RecoveryError>;
}

/// Dry-run execution failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// The transaction does not fit the remaining block space
    #[error("out of gas")]
    OutOfGas,
    /// Any other execution failure
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Copy-on-write account view the packer dry-runs against.
///
/// Seeded lazily from the state oracle at the packer's head; writes stay in
/// the sandbox and never touch the oracle.
pub struct Sandbox<'a> {
    oracle: &'a dyn StateOracle,
    head: H256,
    accounts: HashMap<Address, SandboxAccount>,
}

/// Mutable account state inside a [`Sandbox`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SandboxAccount {
    /// Account nonce
    pub nonce: u64,
    /// Account balance in wei
    pub balance: U256,
}

impl<'a> Sandbox<'a> {
    /// Create a sandbox over the oracle's state at `head`
    pub fn new(oracle: &'a dyn StateOracle, head: H256) -> Self {
        Self {
            oracle,
            head,
            accounts: HashMap::new(),
        }
    }

    /// Current (possibly locally modified) state of an account
    pub fn account(&mut self, addr: Address) -> Result<SandboxAccount, OracleError> {
        if let Some(acc) = self.accounts.get(&addr) {
            return Ok(*acc);
        }
        let acc = SandboxAccount {
            nonce: self.oracle.account_nonce(addr, self.head)?,
            balance: self.oracle.account_balance(addr, self.head)?,
        };
        self.accounts.insert(addr, acc);
        Ok(acc)
    }

    /// Overwrite an account's state in the sandbox
    pub fn set_account(&mut self, addr: Address, acc: SandboxAccount) {
        self.accounts.insert(addr, acc);
    }
}

/// Executes a transaction against sandboxed state without committing it
pub trait VmExecutor: Send + Sync {
    /// Dry-run `tx` from `sender`, applying its effects to the sandbox.
    ///
    /// Returns the gas actually used on success.
    fn dry_run(
        &self,
        tx: &SignedTransaction,
        sender: Address,
        sandbox: &mut Sandbox<'_>,
        header: &BlockHeader,
    ) -> Result<u64, VmError>;
}

/// Injected wall clock, so expiry is deterministic under test
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
