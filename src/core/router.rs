use std::sync::Arc;

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Router};

use crate::core::middleware;
use crate::features::auth::JwtValidator;
use crate::features::shops::routes as shops_routes;
use crate::features::shops::ShopService;

/// Simple health check endpoint (no auth required)
async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All API routes, without the docs UI and the tracing/CORS layers added by `main`
pub fn api_router(shop_service: Arc<ShopService>, jwt_validator: Arc<JwtValidator>) -> Router {
    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(shops_routes::protected_routes(Arc::clone(&shop_service)))
        .route_layer(from_fn_with_state(jwt_validator, middleware::auth_middleware));

    // Public routes (no auth required)
    let public_routes = Router::new().merge(shops_routes::public_routes(shop_service));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .route("/health", get(health_check))
}
