use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::shops::services::ShopStats;
use crate::features::shops::{
    dtos as shops_dtos, handlers as shops_handlers, models as shops_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Shops (protected)
        shops_handlers::create_shop,
        shops_handlers::update_shop,
        shops_handlers::delete_shop,
        shops_handlers::restore_shop,
        shops_handlers::list_provider_shops,
        shops_handlers::list_my_shops,
        shops_handlers::create_review,
        // Shops (public)
        shops_handlers::get_public_shop,
        shops_handlers::list_shop_services,
        shops_handlers::list_shop_products,
        shops_handlers::list_shop_reviews,
        shops_handlers::search_shops,
    ),
    components(
        schemas(
            // Shared
            Meta,
            ShopStats,
            // Catalog
            shops_models::Design,
            shops_models::ShopAddress,
            shops_models::Category,
            shops_models::SubCategory,
            shops_models::Tag,
            shops_models::ServiceTranslation,
            shops_models::AvailabilityWindow,
            shops_models::ServiceDetail,
            shops_models::ServicePreview,
            shops_models::ProductDetail,
            // Owners and reviews
            shops_models::OwnerProfile,
            shops_models::OwnerSnippet,
            shops_models::ShopStatusFilter,
            shops_models::ReviewAuthor,
            shops_models::ReviewWithAuthor,
            shops_models::RatingBucket,
            // Requests
            shops_dtos::CreateShopDto,
            shops_dtos::UpdateShopDto,
            shops_dtos::CreateReviewDto,
            // Responses
            shops_dtos::ShopResponseDto,
            shops_dtos::ShopWithOwnerDto,
            shops_dtos::ShopSummaryDto,
            shops_dtos::PublicOwnerDto,
            shops_dtos::PublicShopDto,
            shops_dtos::ShopSearchHitDto,
            shops_dtos::ReviewStatsDto,
            shops_dtos::ShopReviewsDto,
            ApiResponse<shops_dtos::ShopWithOwnerDto>,
            ApiResponse<Vec<shops_dtos::ShopSummaryDto>>,
            ApiResponse<shops_dtos::PublicShopDto>,
            ApiResponse<Vec<shops_dtos::ShopSearchHitDto>>,
            ApiResponse<shops_dtos::ShopReviewsDto>,
            ApiResponse<Vec<shops_models::ServiceDetail>>,
            ApiResponse<Vec<shops_models::ProductDetail>>,
            ApiResponse<shops_models::ReviewWithAuthor>,
        )
    ),
    tags(
        (name = "shops", description = "Shop directory: owner management, public pages, search and reviews"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Daleel Balady Shops API",
        version = "0.1.0",
        description = "Shop directory API for Daleel Balady",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
