use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockyard_core::PurchaseItemId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route("/:id", get(get_purchase).patch(update_purchase).delete(delete_purchase))
}

pub async fn list_purchases(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock.list_purchases().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePurchaseRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.create_purchase(input).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseItemId = match errors::parse_id(&id, "purchase item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.purchase(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdatePurchaseRequest>,
) -> axum::response::Response {
    let id: PurchaseItemId = match errors::parse_id(&id, "purchase item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.update_purchase(id, patch).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Deletes the item together with its movements.
pub async fn delete_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseItemId = match errors::parse_id(&id, "purchase item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.delete_purchase(id).await {
        Ok(report) => Json(dto::cascade_to_json(id, report)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
