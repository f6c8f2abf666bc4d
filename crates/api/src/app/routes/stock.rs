use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockyard_core::PurchaseItemId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stock))
        .route("/shortages", get(list_shortages))
        .route("/:id", get(get_stock_details))
}

pub async fn list_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock.summaries().await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_shortages(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock.shortages().await {
        Ok(summaries) => Json(summaries).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock_details(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PurchaseItemId = match errors::parse_id(&id, "purchase item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.details(id).await {
        Ok(Some(details)) => Json(details).into_response(),
        Ok(None) => errors::not_found("purchase item"),
        Err(e) => errors::service_error_to_response(e),
    }
}
