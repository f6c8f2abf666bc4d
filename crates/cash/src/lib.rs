//! Cash register module (running balances of the petty-cash box and the main
//! register).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.
//!
//! Sign convention: `balance = prior balance + credit - debit`. A credit is
//! money coming into the register, a debit is money going out. Both registers
//! follow the same rule and never share a chain.

pub mod entry;
pub mod ledger;

pub use entry::{CashChain, CashLedgerEntry, NewCashEntry, PostedEntry, ProjectScope, Register};
pub use ledger::{BalanceLine, RunningBalanceLedger, ScopeTotals};
