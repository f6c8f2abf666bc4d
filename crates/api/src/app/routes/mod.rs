use axum::Router;

pub mod cash;
pub mod movements;
pub mod purchases;
pub mod reference;
pub mod stock;
pub mod system;

/// Router for all API endpoints except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/stock", stock::router())
        .nest("/purchases", purchases::router())
        .nest("/movements", movements::router())
        .nest("/units", reference::units_router())
        .nest("/classes", reference::classes_router())
        .nest("/cash", cash::router())
}
