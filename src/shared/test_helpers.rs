use std::sync::Arc;

use axum::Router;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::time::Duration;
use uuid::Uuid;

use crate::core::router::api_router;
use crate::features::auth::model::Claims;
use crate::features::auth::JwtValidator;
use crate::features::shops::repositories::memory_shop_repository::MemoryShopRepository;
use crate::features::shops::ShopService;

pub const TEST_JWT_SECRET: &str = "test-secret-for-shop-directory";

/// Sign a one-hour access token with the test secret
pub fn issue_token(user_id: Uuid, role: Option<&str>) -> String {
    let claims = Claims {
        user_id: user_id.to_string(),
        role: role.map(str::to_string),
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Full API router backed by the given in-memory repository
pub fn test_app(repo: Arc<MemoryShopRepository>) -> Router {
    let service = Arc::new(ShopService::new(repo));
    let validator = Arc::new(JwtValidator::new(TEST_JWT_SECRET, Duration::from_secs(0)));
    api_router(service, validator)
}
