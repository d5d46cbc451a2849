use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::shops::handlers;
use crate::features::shops::services::ShopService;

/// Public shop routes (no authentication required)
pub fn public_routes(service: Arc<ShopService>) -> Router {
    Router::new()
        // Static segments take priority over {id}
        .route("/api/shops/search", get(handlers::search_shops))
        .route("/api/shops/public/{slug}", get(handlers::get_public_shop))
        .route(
            "/api/shops/public/{slug}/services",
            get(handlers::list_shop_services),
        )
        .route(
            "/api/shops/public/{slug}/products",
            get(handlers::list_shop_products),
        )
        .route(
            "/api/shops/public/{slug}/reviews",
            get(handlers::list_shop_reviews),
        )
        .with_state(service)
}

/// Protected shop routes (require JWT authentication)
pub fn protected_routes(service: Arc<ShopService>) -> Router {
    Router::new()
        .route("/api/shops", post(handlers::create_shop))
        .route("/api/shops/provider", get(handlers::list_provider_shops))
        .route("/api/shops/my-shops", get(handlers::list_my_shops))
        .route(
            "/api/shops/{id}",
            put(handlers::update_shop).delete(handlers::delete_shop),
        )
        .route("/api/shops/{id}/restore", post(handlers::restore_shop))
        .route("/api/shops/{id}/reviews", post(handlers::create_review))
        .with_state(service)
}
