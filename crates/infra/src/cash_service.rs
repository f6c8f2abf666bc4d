//! Cash posting service for the petty-cash box and the main register.
//!
//! Computing a balance and storing the entry are two steps; two posts on the
//! same chain racing between them would build on the same prior balance. Posts
//! are therefore serialized per [`CashChain`] inside this process. Posts on
//! different chains proceed concurrently.
//!
//! Every post and delete also holds the reset gate for reading;
//! [`CashPostingService::delete_all`] holds it for writing, so no post can
//! store a balance built on rows a reset has just removed.
//!
//! The lock table gains one entry per chain posted on. A reset drops the
//! entries of the register it empties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tracing::instrument;

use stockyard_cash::{
    BalanceLine, CashChain, CashLedgerEntry, NewCashEntry, ProjectScope, Register,
    RunningBalanceLedger, ScopeTotals,
};
use stockyard_core::CashEntryId;

use crate::error::ServiceError;
use crate::repository::CashLedgerRepository;

type ChainLocks = HashMap<CashChain, Arc<tokio::sync::Mutex<()>>>;

pub struct CashPostingService {
    repo: Arc<dyn CashLedgerRepository>,
    reset_gate: RwLock<()>,
    chain_locks: Mutex<ChainLocks>,
}

impl std::fmt::Debug for CashPostingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashPostingService").finish_non_exhaustive()
    }
}

impl CashPostingService {
    pub fn new(repo: Arc<dyn CashLedgerRepository>) -> Self {
        Self {
            repo,
            reset_gate: RwLock::new(()),
            chain_locks: Mutex::new(HashMap::new()),
        }
    }

    fn locks(&self) -> std::sync::MutexGuard<'_, ChainLocks> {
        // The map only hands out lock handles; a poisoned guard leaves it intact.
        self.chain_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn chain_lock(&self, chain: CashChain) -> Arc<tokio::sync::Mutex<()>> {
        self.locks().entry(chain).or_default().clone()
    }

    /// Number of chains with a lock entry.
    pub fn tracked_chains(&self) -> usize {
        self.locks().len()
    }

    /// Post a new entry on top of its chain's latest balance.
    #[instrument(skip(self, input), fields(chain = %input.chain(), date = %input.date), err)]
    pub async fn post(&self, input: NewCashEntry) -> Result<CashLedgerEntry, ServiceError> {
        input.validate()?;
        let chain = input.chain();

        let _gate = self.reset_gate.read().await;
        let lock = self.chain_lock(chain);
        let _guard = lock.lock().await;

        let snapshot = self.repo.find_all(chain.register, Some(chain.scope)).await?;
        let ledger = RunningBalanceLedger::for_chain(chain, &snapshot);
        let prior = ledger.next_balance();

        if let Some(last) = ledger.last_entry() {
            if input.date < last.date {
                tracing::warn!(
                    last_date = %last.date,
                    "back-dated entry builds on the latest balance; later entries are not rebalanced"
                );
            }
        }

        let posted = ledger.post(input)?;
        let entry = self.repo.create(posted).await?;

        tracing::info!(
            entry_id = %entry.id,
            prior,
            debit = entry.debit,
            credit = entry.credit,
            balance = entry.balance,
            "cash entry posted"
        );
        Ok(entry)
    }

    /// Entries of `register` ordered by `(date, sequence)`, every project
    /// scope when `scope` is `None`.
    pub async fn list(
        &self,
        register: Register,
        scope: Option<ProjectScope>,
    ) -> Result<Vec<CashLedgerEntry>, ServiceError> {
        Ok(self.repo.find_all(register, scope).await?)
    }

    pub async fn entry(&self, id: CashEntryId) -> Result<CashLedgerEntry, ServiceError> {
        self.repo.find_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    /// Delete one entry. Stored balances of later entries are left as they
    /// are; [`CashPostingService::reconcile`] reports the resulting drift.
    #[instrument(skip(self), fields(entry_id = %id), err)]
    pub async fn delete(&self, id: CashEntryId) -> Result<(), ServiceError> {
        let _gate = self.reset_gate.read().await;
        let entry = self.entry(id).await?;
        let lock = self.chain_lock(entry.chain());
        let _guard = lock.lock().await;

        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound);
        }
        tracing::info!(chain = %entry.chain(), "cash entry deleted");
        Ok(())
    }

    /// Empty one register. Waits for in-flight posts and deletes to finish.
    #[instrument(skip(self), fields(register = %register), err)]
    pub async fn delete_all(&self, register: Register) -> Result<u64, ServiceError> {
        let _gate = self.reset_gate.write().await;
        let removed = self.repo.delete_all(register).await?;
        self.locks().retain(|chain, _| chain.register != register);
        tracing::warn!(removed, "cash register emptied");
        Ok(removed)
    }

    /// Balance the next entry of `chain` would build on.
    pub async fn balance(&self, chain: CashChain) -> Result<i64, ServiceError> {
        Ok(self.repo.last_balance(chain).await?)
    }

    /// Replay of the chain next to stored balances.
    pub async fn running_balances(&self, chain: CashChain) -> Result<Vec<BalanceLine>, ServiceError> {
        let snapshot = self.repo.find_all(chain.register, Some(chain.scope)).await?;
        Ok(RunningBalanceLedger::for_chain(chain, &snapshot).running_balances())
    }

    /// Entries whose stored balance disagrees with the replay.
    pub async fn reconcile(&self, chain: CashChain) -> Result<Vec<BalanceLine>, ServiceError> {
        let snapshot = self.repo.find_all(chain.register, Some(chain.scope)).await?;
        let drift = RunningBalanceLedger::for_chain(chain, &snapshot).reconcile();
        if !drift.is_empty() {
            tracing::warn!(chain = %chain, lines = drift.len(), "stored balances drift from replay");
        }
        Ok(drift)
    }

    pub async fn totals(&self, chain: CashChain) -> Result<ScopeTotals, ServiceError> {
        let snapshot = self.repo.find_all(chain.register, Some(chain.scope)).await?;
        Ok(RunningBalanceLedger::for_chain(chain, &snapshot).totals())
    }
}
