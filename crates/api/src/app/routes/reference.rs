//! Units of measure and item classes.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use stockyard_core::{ClassId, UnitId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn units_router() -> Router {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/:id", delete(delete_unit))
}

pub fn classes_router() -> Router {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/:id", delete(delete_class))
}

pub async fn list_units(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock.units().await {
        Ok(units) => Json(units).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateUnitRequest>,
) -> axum::response::Response {
    match services.stock.create_unit(body.into()).await {
        Ok(unit) => (StatusCode::CREATED, Json(unit)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UnitId = match errors::parse_id(&id, "unit") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.delete_unit(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_classes(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.stock.classes().await {
        Ok(classes) => Json(classes).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_class(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateClassRequest>,
) -> axum::response::Response {
    match services.stock.create_class(body.into()).await {
        Ok(class) => (StatusCode::CREATED, Json(class)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_class(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClassId = match errors::parse_id(&id, "class") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.stock.delete_class(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
