use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockyard_core::{CashEntryId, DomainError, DomainResult, latest, sort_chronologically};

use crate::entry::{CashChain, CashLedgerEntry, NewCashEntry, PostedEntry, ProjectScope, Register};

/// Read-only view of one balance chain over a snapshot of entries.
///
/// The ledger holds no state of its own: it is rebuilt from whatever the
/// store returned, filtered to one register and project scope and ordered by
/// `(date, sequence)`.
#[derive(Debug, Clone)]
pub struct RunningBalanceLedger<'a> {
    chain: CashChain,
    entries: Vec<&'a CashLedgerEntry>,
}

/// Per-entry comparison of the stored balance with a chronological replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub entry_id: CashEntryId,
    pub date: NaiveDate,
    pub label: String,
    pub debit: i64,
    pub credit: i64,
    /// Balance stored when the entry was posted.
    pub stored_balance: i64,
    /// Balance obtained by replaying the scope from zero in date order.
    pub expected_balance: i64,
}

impl BalanceLine {
    /// Stored minus expected. Non-zero after out-of-order posts or deletes.
    pub fn drift(&self) -> i64 {
        self.stored_balance - self.expected_balance
    }
}

/// Aggregate figures of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeTotals {
    pub register: Register,
    pub scope: ProjectScope,
    pub entries: usize,
    pub total_debit: i64,
    pub total_credit: i64,
    /// Stored balance of the latest entry (0 for an empty scope).
    pub last_balance: i64,
}

impl<'a> RunningBalanceLedger<'a> {
    /// Build `chain` out of a snapshot that may hold any register or scope.
    pub fn for_chain(
        chain: CashChain,
        entries: impl IntoIterator<Item = &'a CashLedgerEntry>,
    ) -> Self {
        let mut entries: Vec<&'a CashLedgerEntry> =
            entries.into_iter().filter(|e| chain.contains(e)).collect();
        sort_chronologically(&mut entries);
        Self { chain, entries }
    }

    pub fn chain(&self) -> CashChain {
        self.chain
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of the scope, oldest first.
    pub fn entries(&self) -> &[&'a CashLedgerEntry] {
        &self.entries
    }

    /// Latest entry by date; among same-date entries, the last inserted.
    pub fn last_entry(&self) -> Option<&'a CashLedgerEntry> {
        latest(self.entries.iter().copied())
    }

    /// Balance a new entry builds on: the stored balance of the latest entry,
    /// or 0 for an empty scope.
    pub fn next_balance(&self) -> i64 {
        self.last_entry().map(|e| e.balance).unwrap_or(0)
    }

    /// Compute the entry to store for `new`: `next_balance + credit - debit`.
    ///
    /// Stored entries are never touched, even when `new` is dated before them.
    pub fn post(&self, new: NewCashEntry) -> DomainResult<PostedEntry> {
        if new.chain() != self.chain {
            return Err(DomainError::invariant("entry does not belong to this ledger chain"));
        }

        let balance = self
            .next_balance()
            .checked_add(new.credit)
            .and_then(|b| b.checked_sub(new.debit))
            .ok_or_else(|| DomainError::invariant("balance overflow"))?;

        Ok(PostedEntry {
            register: new.register,
            date: new.date,
            label: new.label,
            debit: new.debit,
            credit: new.credit,
            balance,
            project_id: new.project_id,
            payment_method: new.payment_method,
        })
    }

    /// Replay the chain from zero in chronological order, next to the stored
    /// balances.
    pub fn running_balances(&self) -> Vec<BalanceLine> {
        let mut running: i64 = 0;
        self.entries
            .iter()
            .map(|e| {
                running = running.saturating_add(e.credit).saturating_sub(e.debit);
                BalanceLine {
                    entry_id: e.id,
                    date: e.date,
                    label: e.label.clone(),
                    debit: e.debit,
                    credit: e.credit,
                    stored_balance: e.balance,
                    expected_balance: running,
                }
            })
            .collect()
    }

    /// Lines whose stored balance disagrees with the replay.
    pub fn reconcile(&self) -> Vec<BalanceLine> {
        self.running_balances()
            .into_iter()
            .filter(|l| l.drift() != 0)
            .collect()
    }

    pub fn totals(&self) -> ScopeTotals {
        let (total_debit, total_credit) = self.entries.iter().fold((0i64, 0i64), |(d, c), e| {
            (d.saturating_add(e.debit), c.saturating_add(e.credit))
        });
        ScopeTotals {
            register: self.chain.register,
            scope: self.chain.scope,
            entries: self.entries.len(),
            total_debit,
            total_credit,
            last_balance: self.next_balance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stockyard_core::ProjectId;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn petty(scope: ProjectScope) -> CashChain {
        scope.in_register(Register::Petty)
    }

    fn stored(
        project_id: Option<ProjectId>,
        date: NaiveDate,
        debit: i64,
        credit: i64,
        balance: i64,
        sequence: u64,
    ) -> CashLedgerEntry {
        CashLedgerEntry {
            id: CashEntryId::new(),
            register: Register::Petty,
            date,
            label: format!("entry-{sequence}"),
            debit,
            credit,
            balance,
            project_id,
            payment_method: None,
            sequence,
        }
    }

    fn new_entry(project_id: Option<ProjectId>, date: NaiveDate, debit: i64, credit: i64) -> NewCashEntry {
        NewCashEntry {
            register: Register::Petty,
            date,
            label: "fuel".to_string(),
            debit,
            credit,
            project_id,
            payment_method: None,
        }
    }

    #[test]
    fn empty_scope_starts_at_zero() {
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Unassigned), std::iter::empty());
        assert_eq!(ledger.next_balance(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn single_entry_balance_is_next_balance() {
        let p = ProjectId::new();
        let entries = vec![stored(Some(p), day(1), 0, 42, 42, 1)];
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries);
        assert_eq!(ledger.next_balance(), 42);
    }

    #[test]
    fn debit_decreases_and_credit_increases_balance() {
        let p = ProjectId::new();
        let entries = vec![stored(Some(p), day(1), 0, 100, 100, 1)];
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries);

        let out = ledger.post(new_entry(Some(p), day(2), 30, 0)).unwrap();
        assert_eq!(out.balance, 70);

        let inflow = ledger.post(new_entry(Some(p), day(2), 0, 50)).unwrap();
        assert_eq!(inflow.balance, 150);
    }

    #[test]
    fn other_scopes_do_not_leak_into_the_chain() {
        let (a, b) = (ProjectId::new(), ProjectId::new());
        let entries = vec![
            stored(Some(a), day(1), 0, 10, 10, 1),
            stored(Some(b), day(9), 0, 500, 500, 2),
            stored(None, day(10), 0, 7, 7, 3),
        ];
        assert_eq!(
            RunningBalanceLedger::for_chain(petty(ProjectScope::Project(a)), &entries).next_balance(),
            10
        );
        assert_eq!(
            RunningBalanceLedger::for_chain(petty(ProjectScope::Unassigned), &entries).next_balance(),
            7
        );
    }

    #[test]
    fn registers_keep_separate_chains() {
        let p = ProjectId::new();
        let scope = ProjectScope::Project(p);
        let mut main_entry = stored(Some(p), day(4), 0, 5_000, 5_000, 2);
        main_entry.register = Register::Main;
        let entries = vec![stored(Some(p), day(1), 0, 100, 100, 1), main_entry];

        let petty_ledger = RunningBalanceLedger::for_chain(petty(scope), &entries);
        assert_eq!(petty_ledger.next_balance(), 100);

        let main_ledger = RunningBalanceLedger::for_chain(scope.in_register(Register::Main), &entries);
        assert_eq!(main_ledger.next_balance(), 5_000);

        let mut input = new_entry(Some(p), day(5), 1_000, 0);
        input.register = Register::Main;
        assert_eq!(main_ledger.post(input.clone()).unwrap().balance, 4_000);
        assert!(matches!(
            petty_ledger.post(input).unwrap_err(),
            DomainError::InvariantViolation(_)
        ));
    }

    #[test]
    fn same_date_tie_goes_to_last_inserted() {
        let p = ProjectId::new();
        let entries = vec![
            stored(Some(p), day(3), 0, 5, 5, 4),
            stored(Some(p), day(3), 0, 20, 25, 9),
            stored(Some(p), day(2), 0, 1, 999, 12),
        ];
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries);
        assert_eq!(ledger.next_balance(), 25);
        assert_eq!(ledger.last_entry().map(|e| e.sequence), Some(9));
    }

    #[test]
    fn posting_into_another_scope_is_rejected() {
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(ProjectId::new())), std::iter::empty());
        let err = ledger.post(new_entry(None, day(1), 1, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn negative_amounts_fail_validation() {
        assert!(new_entry(None, day(1), -1, 0).validate().is_err());
        assert!(new_entry(None, day(1), 0, -1).validate().is_err());
        assert!(new_entry(None, day(1), 0, 0).validate().is_ok());
    }

    #[test]
    fn deleting_a_middle_entry_shows_up_as_drift() {
        let p = ProjectId::new();
        let mut entries = vec![
            stored(Some(p), day(1), 0, 100, 100, 1),
            stored(Some(p), day(2), 30, 0, 70, 2),
            stored(Some(p), day(3), 0, 10, 80, 3),
        ];
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries);
        assert!(ledger.reconcile().is_empty());

        entries.remove(1);
        let ledger = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries);
        let drift = ledger.reconcile();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].stored_balance, 80);
        assert_eq!(drift[0].expected_balance, 110);
        assert_eq!(drift[0].drift(), -30);
    }

    #[test]
    fn totals_sum_the_scope() {
        let p = ProjectId::new();
        let entries = vec![
            stored(Some(p), day(1), 0, 100, 100, 1),
            stored(Some(p), day(2), 30, 0, 70, 2),
            stored(None, day(2), 1_000, 0, -1_000, 3),
        ];
        let totals = RunningBalanceLedger::for_chain(petty(ProjectScope::Project(p)), &entries).totals();
        assert_eq!(totals.entries, 2);
        assert_eq!(totals.total_debit, 30);
        assert_eq!(totals.total_credit, 100);
        assert_eq!(totals.last_balance, 70);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: posting in date order keeps the stored chain equal to the
        /// replay, and the final balance is sum(credit) - sum(debit).
        #[test]
        fn in_order_posting_never_drifts(
            moves in prop::collection::vec((0i64..10_000, 0i64..10_000), 0..28)
        ) {
            let p = Some(ProjectId::new());
            let scope = ProjectScope::of(p);
            let mut entries: Vec<CashLedgerEntry> = Vec::new();

            for (i, (debit, credit)) in moves.iter().enumerate() {
                let posted = RunningBalanceLedger::for_chain(petty(scope), &entries)
                    .post(new_entry(p, day(1 + i as u32), *debit, *credit))
                    .unwrap();
                entries.push(posted.into_entry(CashEntryId::new(), i as u64 + 1));
                entries.sort_by_key(|e| (e.date, e.sequence));
            }

            let ledger = RunningBalanceLedger::for_chain(petty(scope), &entries);
            let expected: i64 = moves.iter().map(|(d, c)| c - d).sum();
            prop_assert_eq!(ledger.next_balance(), expected);
            prop_assert!(ledger.reconcile().is_empty());
        }
    }
}
