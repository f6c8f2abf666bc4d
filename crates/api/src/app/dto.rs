use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use stockyard_cash::{BalanceLine, CashChain, CashLedgerEntry, NewCashEntry, ProjectScope, Register};
use stockyard_core::{ClassId, ProjectId, PurchaseItemId, UnitId};
use stockyard_infra::CascadeReport;
use stockyard_stock::{
    MovementPatch, NewItemClass, NewPurchaseItem, NewStockMovement, NewUnit, PurchaseItemPatch,
};

use crate::app::errors;

type Rejection = axum::response::Response;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub acquired_on: String,
    pub designation: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_cost: Option<i64>,
    pub unit_id: String,
    pub class_id: String,
}

impl CreatePurchaseRequest {
    pub fn into_domain(self) -> Result<NewPurchaseItem, Rejection> {
        Ok(NewPurchaseItem {
            acquired_on: parse_date(&self.acquired_on, "acquired_on")?,
            designation: self.designation,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_cost: self.total_cost,
            unit_id: errors::parse_id::<UnitId>(&self.unit_id, "unit")?,
            class_id: errors::parse_id::<ClassId>(&self.class_id, "class")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub acquired_on: Option<String>,
    pub designation: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<i64>,
    pub total_cost: Option<i64>,
    pub unit_id: Option<String>,
    pub class_id: Option<String>,
}

impl UpdatePurchaseRequest {
    pub fn into_domain(self) -> Result<PurchaseItemPatch, Rejection> {
        Ok(PurchaseItemPatch {
            acquired_on: self
                .acquired_on
                .as_deref()
                .map(|d| parse_date(d, "acquired_on"))
                .transpose()?,
            designation: self.designation,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_cost: self.total_cost,
            unit_id: self
                .unit_id
                .as_deref()
                .map(|id| errors::parse_id::<UnitId>(id, "unit"))
                .transpose()?,
            class_id: self
                .class_id
                .as_deref()
                .map(|id| errors::parse_id::<ClassId>(id, "class"))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMovementRequest {
    pub purchase_item_id: String,
    pub date: String,
    pub quantity: i64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub observation: Option<String>,
}

impl CreateMovementRequest {
    pub fn into_domain(self) -> Result<NewStockMovement, Rejection> {
        Ok(NewStockMovement {
            purchase_item_id: errors::parse_id::<PurchaseItemId>(&self.purchase_item_id, "purchase item")?,
            date: parse_date(&self.date, "date")?,
            quantity: self.quantity,
            source: self.source,
            destination: self.destination,
            observation: self.observation,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMovementRequest {
    pub date: Option<String>,
    pub quantity: Option<i64>,
    pub observation: Option<String>,
    pub destination: Option<String>,
}

impl UpdateMovementRequest {
    pub fn into_domain(self) -> Result<MovementPatch, Rejection> {
        Ok(MovementPatch {
            date: self.date.as_deref().map(|d| parse_date(d, "date")).transpose()?,
            quantity: self.quantity,
            observation: self.observation,
            destination: self.destination,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub symbol: String,
}

impl From<CreateUnitRequest> for NewUnit {
    fn from(body: CreateUnitRequest) -> Self {
        NewUnit {
            name: body.name,
            symbol: body.symbol,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
}

impl From<CreateClassRequest> for NewItemClass {
    fn from(body: CreateClassRequest) -> Self {
        NewItemClass { name: body.name }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostCashEntryRequest {
    pub date: String,
    pub label: String,
    #[serde(default)]
    pub debit: i64,
    #[serde(default)]
    pub credit: i64,
    pub project_id: Option<String>,
    pub register: Option<String>,
    pub payment_method: Option<String>,
}

impl PostCashEntryRequest {
    pub fn into_domain(self) -> Result<NewCashEntry, Rejection> {
        let label = self.label.trim().to_string();
        if label.is_empty() {
            return Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "label cannot be empty",
            ));
        }
        Ok(NewCashEntry {
            register: parse_register(self.register.as_deref())?,
            date: parse_date(&self.date, "date")?,
            label,
            debit: self.debit,
            credit: self.credit,
            project_id: self
                .project_id
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| errors::parse_id::<ProjectId>(p, "project"))
                .transpose()?,
            payment_method: self
                .payment_method
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

/// `petty` (the default when absent) or `main`.
pub fn parse_register(raw: Option<&str>) -> Result<Register, Rejection> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Register::default()),
        Some(r) => r.parse().map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_register",
                format!("unknown register `{r}` (expected `petty` or `main`)"),
            )
        }),
    }
}

/// `?register=` and `?project=` selectors. `unassigned` (or an absent
/// project for per-chain endpoints) selects the entries without a project.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub register: Option<String>,
    pub project: Option<String>,
}

impl ScopeQuery {
    pub fn register(&self) -> Result<Register, Rejection> {
        parse_register(self.register.as_deref())
    }

    /// Chain of a per-chain endpoint.
    pub fn chain(&self) -> Result<CashChain, Rejection> {
        let scope = self.filter()?.unwrap_or(ProjectScope::Unassigned);
        Ok(CashChain::new(self.register()?, scope))
    }

    /// Optional filter of a listing endpoint; `None` means every scope.
    pub fn filter(&self) -> Result<Option<ProjectScope>, Rejection> {
        match self.project.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(p) if p.eq_ignore_ascii_case("unassigned") => Ok(Some(ProjectScope::Unassigned)),
            Some(p) => Ok(Some(ProjectScope::Project(errors::parse_id::<ProjectId>(p, "project")?))),
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC3339 timestamp (its date part is kept).
pub fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, Rejection> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_date",
                format!("{field} must be a date (YYYY-MM-DD)"),
            )
        })
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn cash_entry_to_json(entry: &CashLedgerEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id.to_string(),
        "register": entry.register,
        "date": entry.date,
        "label": entry.label,
        "debit": entry.debit,
        "credit": entry.credit,
        "balance": entry.balance,
        "project_id": entry.project_id.map(|p| p.to_string()),
        "payment_method": entry.payment_method,
    })
}

pub fn balance_line_to_json(line: &BalanceLine) -> serde_json::Value {
    serde_json::json!({
        "entry_id": line.entry_id.to_string(),
        "date": line.date,
        "label": line.label,
        "debit": line.debit,
        "credit": line.credit,
        "stored_balance": line.stored_balance,
        "expected_balance": line.expected_balance,
        "drift": line.drift(),
    })
}

pub fn cascade_to_json(id: PurchaseItemId, report: CascadeReport) -> serde_json::Value {
    serde_json::json!({
        "id": id.to_string(),
        "deleted": true,
        "movements_in_deleted": report.movements_in,
        "movements_out_deleted": report.movements_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_plain_and_rfc3339() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(parse_date("2024-05-17", "date").unwrap(), d);
        assert_eq!(parse_date("2024-05-17T08:30:00Z", "date").unwrap(), d);
        assert!(parse_date("17/05/2024", "date").is_err());
    }

    #[test]
    fn scope_query_selects_unassigned_petty_cash_by_default() {
        let q = ScopeQuery::default();
        assert_eq!(q.filter().unwrap(), None);
        assert_eq!(
            q.chain().unwrap(),
            CashChain::new(Register::Petty, ProjectScope::Unassigned)
        );

        let q = ScopeQuery { register: None, project: Some("UNASSIGNED".into()) };
        assert_eq!(q.filter().unwrap(), Some(ProjectScope::Unassigned));

        let p = ProjectId::new();
        let q = ScopeQuery { register: Some("main".into()), project: Some(p.to_string()) };
        assert_eq!(q.chain().unwrap(), CashChain::new(Register::Main, ProjectScope::Project(p)));

        let q = ScopeQuery { register: None, project: Some("site-9".into()) };
        assert!(q.chain().is_err());

        let q = ScopeQuery { register: Some("vault".into()), project: None };
        assert!(q.register().is_err());
    }

    #[test]
    fn blank_cash_label_is_rejected() {
        let body = PostCashEntryRequest {
            date: "2024-05-17".into(),
            label: "   ".into(),
            debit: 10,
            credit: 0,
            project_id: None,
            register: None,
            payment_method: None,
        };
        assert!(body.into_domain().is_err());
    }

    #[test]
    fn cash_request_defaults_to_petty_register() {
        let body = PostCashEntryRequest {
            date: "2024-05-17".into(),
            label: "deposit".into(),
            debit: 0,
            credit: 900,
            project_id: None,
            register: None,
            payment_method: Some("  ".into()),
        };
        let input = body.into_domain().unwrap();
        assert_eq!(input.register, Register::Petty);
        assert_eq!(input.payment_method, None);
    }
}
