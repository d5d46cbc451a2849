use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::shops::dtos::{
    non_blank, CreateShopDto, ProviderShopsQuery, ShopSummaryDto, ShopWithOwnerDto,
    UpdateShopDto,
};
use crate::features::shops::models::OwnerShopFilter;
use crate::features::shops::services::ShopService;
use crate::shared::constants::PROVIDER_PAGE_SIZE;
use crate::shared::types::{ApiResponse, PageRequest};

/// Create a shop owned by the caller
#[utoipa::path(
    post,
    path = "/api/shops",
    request_body = CreateShopDto,
    responses(
        (status = 201, description = "Shop created", body = ApiResponse<ShopWithOwnerDto>),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn create_shop(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    AppJson(dto): AppJson<CreateShopDto>,
) -> Result<(StatusCode, Json<ApiResponse<ShopWithOwnerDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let shop = service.create_shop(dto.into_input(user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(shop.into()),
            Some("Shop created successfully".to_string()),
            None,
        )),
    ))
}

/// Update one of the caller's shops.
///
/// Renaming regenerates the public slug. Shops owned by someone else answer 404.
#[utoipa::path(
    put,
    path = "/api/shops/{id}",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    request_body = UpdateShopDto,
    responses(
        (status = 200, description = "Shop updated", body = ApiResponse<ShopWithOwnerDto>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn update_shop(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateShopDto>,
) -> Result<Json<ApiResponse<ShopWithOwnerDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let shop = service
        .update_owned_shop(user.user_id, id, dto.into())
        .await?;

    Ok(Json(ApiResponse::success(
        Some(shop.into()),
        Some("Shop updated successfully".to_string()),
        None,
    )))
}

/// Soft-delete one of the caller's shops
#[utoipa::path(
    delete,
    path = "/api/shops/{id}",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    responses(
        (status = 200, description = "Shop deleted"),
        (status = 404, description = "Shop not found")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn delete_shop(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_owned_shop(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Shop deleted successfully".to_string()),
        None,
    )))
}

/// Restore a soft-deleted shop of the caller
#[utoipa::path(
    post,
    path = "/api/shops/{id}/restore",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    responses(
        (status = 200, description = "Shop restored", body = ApiResponse<ShopWithOwnerDto>),
        (status = 404, description = "No deleted shop with this ID")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn restore_shop(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ShopWithOwnerDto>>> {
    let shop = service.restore_owned_shop(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(shop.into()),
        Some("Shop restored successfully".to_string()),
        None,
    )))
}

/// List the caller's shops with stats (paginated)
#[utoipa::path(
    get,
    path = "/api/shops/provider",
    params(ProviderShopsQuery),
    responses(
        (status = 200, description = "Owner's shops", body = ApiResponse<Vec<ShopSummaryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn list_provider_shops(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
    AppQuery(query): AppQuery<ProviderShopsQuery>,
) -> Result<Json<ApiResponse<Vec<ShopSummaryDto>>>> {
    let page = PageRequest::new(query.page, query.limit, PROVIDER_PAGE_SIZE);
    let filter = OwnerShopFilter {
        search: non_blank(query.search),
        status: query.status.unwrap_or_default(),
    };

    let (shops, meta) = service
        .list_provider_shops(user.user_id, filter, page)
        .await?;
    let items = shops.into_iter().map(ShopSummaryDto::from).collect();

    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}

/// List all of the caller's shops with stats
#[utoipa::path(
    get,
    path = "/api/shops/my-shops",
    responses(
        (status = 200, description = "Owner's shops", body = ApiResponse<Vec<ShopSummaryDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "shops"
)]
pub async fn list_my_shops(
    user: AuthenticatedUser,
    State(service): State<Arc<ShopService>>,
) -> Result<Json<ApiResponse<Vec<ShopSummaryDto>>>> {
    let shops = service.list_my_shops(user.user_id).await?;
    let items = shops.into_iter().map(ShopSummaryDto::from).collect();
    Ok(Json(ApiResponse::success(Some(items), None, None)))
}
