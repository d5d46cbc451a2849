use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::shops::models::{
    CreateShop, Design, OwnerProfile, OwnerSnippet, ProductDetail, ReviewWithAuthor,
    ServiceDetail, ServicePreview, Shop, ShopAddress, ShopAggregate, ShopSearchHit,
    ShopStatusFilter, ShopSummary, ShopUpdate, ShopWithOwner,
};
use crate::features::shops::services::{compute_shop_stats, ShopStats};
use crate::shared::constants::PUBLIC_REVIEW_PREVIEW;
use crate::shared::types::double_option;

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Request DTO for creating a shop
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopDto {
    /// Display name; the public slug is derived from it
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub design_id: Option<Uuid>,
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 32, message = "Phone must not exceed 32 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
    #[validate(length(max = 100, message = "City must not exceed 100 characters"))]
    pub city: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub location_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub location_lon: Option<f64>,
    #[validate(length(max = 1000))]
    pub cover_image: Option<String>,
    #[validate(length(max = 1000))]
    pub logo_image: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateShopDto {
    pub fn into_input(self, owner_id: Uuid) -> CreateShop {
        CreateShop {
            owner_id,
            name: self.name,
            design_id: self.design_id,
            description: self.description,
            phone: self.phone,
            email: self.email,
            website: self.website,
            city: non_blank(self.city),
            location_lat: self.location_lat,
            location_lon: self.location_lon,
            cover_image: self.cover_image,
            logo_image: self.logo_image,
            is_active: self.is_active,
        }
    }
}

/// Request DTO for updating a shop.
///
/// Omitted fields are left untouched. `null` clears the optional contact and
/// image fields; `name` and `city` can only be replaced.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopDto {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: Option<Option<String>>,
    #[validate(length(max = 100, message = "City must not exceed 100 characters"))]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 32, message = "Phone must not exceed 32 characters"))]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 1000))]
    pub cover_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 1000))]
    pub logo_image: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl From<UpdateShopDto> for ShopUpdate {
    fn from(dto: UpdateShopDto) -> Self {
        Self {
            name: dto.name,
            description: dto.description,
            city: non_blank(dto.city),
            phone: dto.phone,
            email: dto.email,
            website: dto.website,
            cover_image: dto.cover_image,
            logo_image: dto.logo_image,
            is_active: dto.is_active,
        }
    }
}

/// Query params for the provider's shop list
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ProviderShopsQuery {
    /// Page number (1-indexed)
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page (default 20)
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    /// Search in shop name or description
    pub search: Option<String>,
    /// `all`, `active` or `inactive`
    pub status: Option<ShopStatusFilter>,
}

/// Query params for shop search
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct SearchShopsQuery {
    /// Free text over shop name and description
    pub q: Option<String>,
    pub city: Option<String>,
    /// Category slug of any of the shop's services
    pub category: Option<String>,
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

/// Query params for a shop's services
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ShopServicesQuery {
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    /// Category slug
    pub category: Option<String>,
    /// Search in the service's English and Arabic texts
    pub search: Option<String>,
}

/// Query params for a shop's products
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ShopProductsQuery {
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    /// Search in product name or description
    pub search: Option<String>,
    /// Only products with stock left
    pub in_stock: Option<bool>,
}

/// Plain pagination query
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PageQuery {
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

/// Empty or whitespace-only query values count as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// RESPONSE DTOs
// =============================================================================

/// Shop fields as seen by its owner
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopResponseDto {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub design_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopResponseDto {
    fn from(s: Shop) -> Self {
        Self {
            id: s.id,
            owner_id: s.owner_id,
            design_id: s.design_id,
            name: s.name,
            slug: s.slug,
            description: s.description,
            phone: s.phone,
            email: s.email,
            website: s.website,
            city: s.city,
            location_lat: s.location_lat,
            location_lon: s.location_lon,
            cover_image: s.cover_image,
            logo_image: s.logo_image,
            is_active: s.is_active,
            is_verified: s.is_verified,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Shop returned by create, update and restore
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopWithOwnerDto {
    #[serde(flatten)]
    pub shop: ShopResponseDto,
    pub owner: OwnerProfile,
}

impl From<ShopWithOwner> for ShopWithOwnerDto {
    fn from(s: ShopWithOwner) -> Self {
        Self {
            shop: s.shop.into(),
            owner: s.owner,
        }
    }
}

/// Shop with its statistics, used by the owner's lists
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummaryDto {
    #[serde(flatten)]
    pub shop: ShopResponseDto,
    pub stats: ShopStats,
}

impl From<ShopSummary> for ShopSummaryDto {
    fn from(summary: ShopSummary) -> Self {
        let stats = compute_shop_stats(&summary);
        Self {
            shop: summary.shop.into(),
            stats,
        }
    }
}

/// Owner fields shown on the public shop page
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicOwnerDto {
    pub name: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub is_verified: bool,
    pub verified_badge: Option<String>,
}

impl From<OwnerProfile> for PublicOwnerDto {
    fn from(o: OwnerProfile) -> Self {
        Self {
            name: o.name,
            profile_pic: o.profile_pic,
            bio: o.bio,
            is_verified: o.is_verified,
            verified_badge: o.verified_badge,
        }
    }
}

/// Public shop page
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicShopDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub owner: PublicOwnerDto,
    pub services: Vec<ServiceDetail>,
    pub products: Vec<ProductDetail>,
    /// Most recent reviews only; the full list is paginated separately
    pub reviews: Vec<ReviewWithAuthor>,
    pub stats: ShopStats,
    pub design: Option<Design>,
    pub address: Option<ShopAddress>,
}

impl From<ShopAggregate> for PublicShopDto {
    fn from(aggregate: ShopAggregate) -> Self {
        let stats = compute_shop_stats(&aggregate);
        let ShopAggregate {
            shop,
            owner,
            services,
            products,
            mut reviews,
            address,
            design,
        } = aggregate;
        reviews.truncate(PUBLIC_REVIEW_PREVIEW);

        Self {
            id: shop.id,
            name: shop.name,
            slug: shop.slug,
            description: shop.description,
            phone: shop.phone,
            email: shop.email,
            website: shop.website,
            city: shop.city,
            location_lat: shop.location_lat,
            location_lon: shop.location_lon,
            cover_image: shop.cover_image,
            logo_image: shop.logo_image,
            is_verified: shop.is_verified,
            created_at: shop.created_at,
            owner: owner.into(),
            services,
            products,
            reviews,
            stats,
            design,
            address,
        }
    }
}

/// One shop in the search results
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopSearchHitDto {
    #[serde(flatten)]
    pub shop: ShopResponseDto,
    pub owner: OwnerSnippet,
    /// Up to three available services
    pub services: Vec<ServicePreview>,
    pub stats: ShopStats,
}

impl From<ShopSearchHit> for ShopSearchHitDto {
    fn from(hit: ShopSearchHit) -> Self {
        let stats = compute_shop_stats(&hit.summary);
        Self {
            shop: hit.summary.shop.into(),
            owner: hit.owner,
            services: hit.services,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_distinguishes_null_from_missing() {
        let dto: UpdateShopDto =
            serde_json::from_str(r#"{"phone": null, "website": "https://a.example"}"#).unwrap();
        let update = ShopUpdate::from(dto);

        assert_eq!(update.phone, Some(None));
        assert_eq!(update.website, Some(Some("https://a.example".to_string())));
        assert_eq!(update.email, None);
        assert_eq!(update.name, None);
    }

    #[test]
    fn test_update_dto_ignores_blank_city() {
        let dto: UpdateShopDto = serde_json::from_str(r#"{"city": "  "}"#).unwrap();
        assert_eq!(ShopUpdate::from(dto).city, None);
    }

    #[test]
    fn test_create_dto_validation() {
        let dto: CreateShopDto = serde_json::from_str(
            r#"{"name": "Pizza Place", "email": "not-an-email", "locationLat": 120.0}"#,
        )
        .unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("location_lat"));

        let ok: CreateShopDto =
            serde_json::from_str(r#"{"name": "Pizza Place", "website": "https://p.example"}"#)
                .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  cairo ".to_string())), Some("cairo".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
