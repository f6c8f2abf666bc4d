//! Cash ledger endpoints. `?register=main` selects the main register; the
//! petty-cash box is the default.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockyard_core::CashEntryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entries).post(post_entry).delete(delete_all_entries))
        .route("/balance", get(get_balance))
        .route("/running", get(get_running_balances))
        .route("/reconcile", get(get_reconcile))
        .route("/totals", get(get_totals))
        .route("/:id", get(get_entry).delete(delete_entry))
}

pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let register = match query.register() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let filter = match query.filter() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.list(register, filter).await {
        Ok(entries) => Json(entries.iter().map(dto::cash_entry_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn post_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PostCashEntryRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.post(input).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::cash_entry_to_json(&entry))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_all_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let register = match query.register() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.delete_all(register).await {
        Ok(count) => Json(serde_json::json!({ "deleted": count })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CashEntryId = match errors::parse_id(&id, "cash entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.entry(id).await {
        Ok(entry) => Json(dto::cash_entry_to_json(&entry)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Later entries keep their stored balances; see `/cash/reconcile`.
pub async fn delete_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CashEntryId = match errors::parse_id(&id, "cash entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let chain = match query.chain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.balance(chain).await {
        Ok(balance) => Json(serde_json::json!({
            "register": chain.register,
            "scope": chain.scope,
            "balance": balance,
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_running_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let chain = match query.chain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.running_balances(chain).await {
        Ok(lines) => Json(lines.iter().map(dto::balance_line_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_reconcile(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let chain = match query.chain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.reconcile(chain).await {
        Ok(lines) => Json(lines.iter().map(dto::balance_line_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_totals(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ScopeQuery>,
) -> axum::response::Response {
    let chain = match query.chain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.cash.totals(chain).await {
        Ok(totals) => Json(totals).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
