use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::shops::dtos::{
    non_blank, PageQuery, PublicShopDto, SearchShopsQuery, ShopProductsQuery, ShopReviewsDto,
    ShopSearchHitDto, ShopServicesQuery,
};
use crate::features::shops::models::{
    ProductDetail, ProductFilter, ServiceDetail, ServiceFilter, ShopSearch,
};
use crate::features::shops::services::ShopService;
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::{ApiResponse, PageRequest};

/// Public shop page by slug
#[utoipa::path(
    get,
    path = "/api/shops/public/{slug}",
    params(
        ("slug" = String, Path, description = "Shop slug")
    ),
    responses(
        (status = 200, description = "Shop found", body = ApiResponse<PublicShopDto>),
        (status = 404, description = "Shop not found")
    ),
    tag = "shops"
)]
pub async fn get_public_shop(
    State(service): State<Arc<ShopService>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PublicShopDto>>> {
    let shop = service
        .get_shop_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop not found".to_string()))?;

    Ok(Json(ApiResponse::success(Some(shop.into()), None, None)))
}

/// Paginated services of a shop
#[utoipa::path(
    get,
    path = "/api/shops/public/{slug}/services",
    params(
        ("slug" = String, Path, description = "Shop slug"),
        ShopServicesQuery
    ),
    responses(
        (status = 200, description = "Services", body = ApiResponse<Vec<ServiceDetail>>),
        (status = 404, description = "Shop not found")
    ),
    tag = "shops"
)]
pub async fn list_shop_services(
    State(service): State<Arc<ShopService>>,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<ShopServicesQuery>,
) -> Result<Json<ApiResponse<Vec<ServiceDetail>>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = ServiceFilter {
        category: non_blank(query.category),
        search: non_blank(query.search),
    };

    let (services, meta) = service.list_services(&slug, filter, page).await?;
    Ok(Json(ApiResponse::success(Some(services), None, Some(meta))))
}

/// Paginated products of a shop
#[utoipa::path(
    get,
    path = "/api/shops/public/{slug}/products",
    params(
        ("slug" = String, Path, description = "Shop slug"),
        ShopProductsQuery
    ),
    responses(
        (status = 200, description = "Products", body = ApiResponse<Vec<ProductDetail>>),
        (status = 404, description = "Shop not found")
    ),
    tag = "shops"
)]
pub async fn list_shop_products(
    State(service): State<Arc<ShopService>>,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<ShopProductsQuery>,
) -> Result<Json<ApiResponse<Vec<ProductDetail>>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = ProductFilter {
        search: non_blank(query.search),
        in_stock: query.in_stock.unwrap_or(false),
    };

    let (products, meta) = service.list_products(&slug, filter, page).await?;
    Ok(Json(ApiResponse::success(Some(products), None, Some(meta))))
}

/// Paginated reviews of a shop with the rating distribution
#[utoipa::path(
    get,
    path = "/api/shops/public/{slug}/reviews",
    params(
        ("slug" = String, Path, description = "Shop slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Reviews", body = ApiResponse<ShopReviewsDto>),
        (status = 404, description = "Shop not found")
    ),
    tag = "shops"
)]
pub async fn list_shop_reviews(
    State(service): State<Arc<ShopService>>,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<ApiResponse<ShopReviewsDto>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let reviews = service.list_reviews(&slug, page).await?;
    let meta = reviews.meta;

    Ok(Json(ApiResponse::success(
        Some(reviews.into()),
        None,
        Some(meta),
    )))
}

/// Search shops by text, city or service category
#[utoipa::path(
    get,
    path = "/api/shops/search",
    params(SearchShopsQuery),
    responses(
        (status = 200, description = "Matching shops", body = ApiResponse<Vec<ShopSearchHitDto>>),
        (status = 400, description = "No search parameter given")
    ),
    tag = "shops"
)]
pub async fn search_shops(
    State(service): State<Arc<ShopService>>,
    AppQuery(query): AppQuery<SearchShopsQuery>,
) -> Result<Json<ApiResponse<Vec<ShopSearchHitDto>>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let search = ShopSearch {
        text: non_blank(query.q),
        city: non_blank(query.city),
        category: non_blank(query.category),
    };

    let (hits, meta) = service.search_shops(search, page).await?;
    let items = hits.into_iter().map(ShopSearchHitDto::from).collect();

    Ok(Json(ApiResponse::success(Some(items), None, Some(meta))))
}
