//! Receipts (`/movements/in`) and issuances (`/movements/out`).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockyard_core::MovementId;
use stockyard_stock::Direction;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route(
            "/:direction",
            get(list_movements).post(create_movement).delete(delete_all_movements),
        )
        .route(
            "/:direction/:id",
            get(get_movement).patch(update_movement).delete(delete_movement),
        )
}

fn parse_direction(raw: &str) -> Result<Direction, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::NOT_FOUND,
            "unknown_direction",
            "movement direction must be `in` or `out`",
        )
    })
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(direction): Path<String>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.list_movements(direction).await {
        Ok(movements) => Json(movements).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(direction): Path<String>,
    Json(body): Json<dto::CreateMovementRequest>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.record_movement(direction, input).await {
        Ok(movement) => (StatusCode::CREATED, Json(movement)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_all_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(direction): Path<String>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.delete_all_movements(direction).await {
        Ok(count) => Json(serde_json::json!({ "deleted": count })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path((direction, id)): Path<(String, String)>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: MovementId = match errors::parse_id(&id, "movement") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.movement(direction, id).await {
        Ok(movement) => Json(movement).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path((direction, id)): Path<(String, String)>,
    Json(body): Json<dto::UpdateMovementRequest>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: MovementId = match errors::parse_id(&id, "movement") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.update_movement(direction, id, patch).await {
        Ok(movement) => Json(movement).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Path((direction, id)): Path<(String, String)>,
) -> axum::response::Response {
    let direction = match parse_direction(&direction) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let id: MovementId = match errors::parse_id(&id, "movement") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.delete_movement(direction, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
