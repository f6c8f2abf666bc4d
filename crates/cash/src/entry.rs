use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockyard_core::{CashEntryId, Chronological, DomainError, DomainResult, Entity, ProjectId};

/// Cash register an entry is written to.
///
/// The petty-cash box and the main register keep separate balances; an entry
/// never builds on the other register's chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    #[default]
    Petty,
    Main,
}

impl Register {
    pub fn as_str(self) -> &'static str {
        match self {
            Register::Petty => "petty",
            Register::Main => "main",
        }
    }
}

impl core::fmt::Display for Register {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Register {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "petty" => Ok(Register::Petty),
            "main" => Ok(Register::Main),
            other => Err(DomainError::validation(format!("unknown register `{other}`"))),
        }
    }
}

/// Project grouping inside a register.
///
/// Entries attached to a project form that project's chain; entries without a
/// project form a single shared chain of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "project_id")]
pub enum ProjectScope {
    Project(ProjectId),
    Unassigned,
}

impl ProjectScope {
    pub fn of(project_id: Option<ProjectId>) -> Self {
        match project_id {
            Some(id) => ProjectScope::Project(id),
            None => ProjectScope::Unassigned,
        }
    }

    pub fn project_id(self) -> Option<ProjectId> {
        match self {
            ProjectScope::Project(id) => Some(id),
            ProjectScope::Unassigned => None,
        }
    }

    pub fn in_register(self, register: Register) -> CashChain {
        CashChain { register, scope: self }
    }
}

impl core::fmt::Display for ProjectScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProjectScope::Project(id) => write!(f, "project:{id}"),
            ProjectScope::Unassigned => f.write_str("unassigned"),
        }
    }
}

/// Key of one balance chain: a register and a project scope within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CashChain {
    pub register: Register,
    pub scope: ProjectScope,
}

impl CashChain {
    pub fn new(register: Register, scope: ProjectScope) -> Self {
        Self { register, scope }
    }

    pub fn contains(self, entry: &CashLedgerEntry) -> bool {
        entry.chain() == self
    }
}

impl core::fmt::Display for CashChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.register, self.scope)
    }
}

/// One stored cash movement with its running balance ("solde").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashLedgerEntry {
    pub id: CashEntryId,
    pub register: Register,
    pub date: NaiveDate,
    pub label: String,
    /// Money out, in smallest currency unit.
    pub debit: i64,
    /// Money in, in smallest currency unit.
    pub credit: i64,
    /// Balance computed when the entry was posted. Never recomputed.
    pub balance: i64,
    pub project_id: Option<ProjectId>,
    /// Cash, cheque, transfer... Free text, as written on the voucher.
    pub payment_method: Option<String>,
    /// Insertion position assigned by the store.
    pub sequence: u64,
}

impl CashLedgerEntry {
    pub fn scope(&self) -> ProjectScope {
        ProjectScope::of(self.project_id)
    }

    pub fn chain(&self) -> CashChain {
        CashChain::new(self.register, self.scope())
    }
}

impl Entity for CashLedgerEntry {
    type Id = CashEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Chronological for CashLedgerEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Input for posting an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCashEntry {
    #[serde(default)]
    pub register: Register,
    pub date: NaiveDate,
    pub label: String,
    pub debit: i64,
    pub credit: i64,
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl NewCashEntry {
    pub fn scope(&self) -> ProjectScope {
        ProjectScope::of(self.project_id)
    }

    pub fn chain(&self) -> CashChain {
        CashChain::new(self.register, self.scope())
    }

    /// Input-boundary checks: amounts must be non-negative.
    pub fn validate(&self) -> DomainResult<()> {
        if self.debit < 0 {
            return Err(DomainError::validation("debit cannot be negative"));
        }
        if self.credit < 0 {
            return Err(DomainError::validation("credit cannot be negative"));
        }
        Ok(())
    }
}

/// An entry whose balance has been computed, waiting for the store to assign
/// its id and insertion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedEntry {
    pub register: Register,
    pub date: NaiveDate,
    pub label: String,
    pub debit: i64,
    pub credit: i64,
    pub balance: i64,
    pub project_id: Option<ProjectId>,
    pub payment_method: Option<String>,
}

impl PostedEntry {
    pub fn into_entry(self, id: CashEntryId, sequence: u64) -> CashLedgerEntry {
        CashLedgerEntry {
            id,
            register: self.register,
            date: self.date,
            label: self.label,
            debit: self.debit,
            credit: self.credit,
            balance: self.balance,
            project_id: self.project_id,
            payment_method: self.payment_method,
            sequence,
        }
    }
}
