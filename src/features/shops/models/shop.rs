use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::shops::models::{
    Design, ProductDetail, ReviewWithAuthor, ServiceDetail, ShopAddress,
};

/// Database model for shop
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Shop {
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
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Redacted owner projection; credentials are never selected
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub is_verified: bool,
    pub verified_badge: Option<String>,
    pub role: String,
}

/// Input for shop creation as supplied by a caller
#[derive(Debug, Clone, Default)]
pub struct CreateShop {
    pub owner_id: Uuid,
    pub name: Option<String>,
    pub design_id: Option<Uuid>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub city: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lon: Option<f64>,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub is_active: Option<bool>,
}

/// Row to persist once the slug is settled
#[derive(Debug, Clone)]
pub struct NewShop {
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
}

impl NewShop {
    pub fn from_input(input: CreateShop, name: String, slug: String) -> Self {
        Self {
            owner_id: input.owner_id,
            design_id: input.design_id,
            name,
            slug,
            description: input.description,
            phone: input.phone,
            email: input.email,
            website: input.website,
            city: input.city,
            location_lat: input.location_lat,
            location_lon: input.location_lon,
            cover_image: input.cover_image,
            logo_image: input.logo_image,
            is_active: input.is_active.unwrap_or(true),
        }
    }
}

/// Partial update of the owner-editable shop fields.
///
/// `None` leaves a column untouched. For nullable columns `Some(None)` clears
/// the value. `name` and `city` are never cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub city: Option<String>,
    pub phone: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub logo_image: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Shop joined with its redacted owner, returned by create and update
#[derive(Debug, Clone)]
pub struct ShopWithOwner {
    pub shop: Shop,
    pub owner: OwnerProfile,
}

/// Full public read-model of a shop
#[derive(Debug, Clone, PartialEq)]
pub struct ShopAggregate {
    pub shop: Shop,
    pub owner: OwnerProfile,
    pub services: Vec<ServiceDetail>,
    pub products: Vec<ProductDetail>,
    pub reviews: Vec<ReviewWithAuthor>,
    pub address: Option<ShopAddress>,
    pub design: Option<Design>,
}

/// Shop with counts, used by list views
#[derive(Debug, Clone, FromRow)]
pub struct ShopSummary {
    #[sqlx(flatten)]
    pub shop: Shop,
    pub service_count: i64,
    pub product_count: i64,
    pub review_count: i64,
    pub rating_total: i64,
}

/// Activity filter for the provider's shop list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShopStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ShopStatusFilter {
    pub fn is_active(&self) -> Option<bool> {
        match self {
            ShopStatusFilter::All => None,
            ShopStatusFilter::Active => Some(true),
            ShopStatusFilter::Inactive => Some(false),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OwnerShopFilter {
    pub search: Option<String>,
    pub status: ShopStatusFilter,
}

/// Cross-shop search criteria; at least one must be set
#[derive(Debug, Clone, Default)]
pub struct ShopSearch {
    pub text: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
}

impl ShopSearch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.city.is_none() && self.category.is_none()
    }
}

/// Owner fields shown next to a search hit
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSnippet {
    pub name: String,
    pub profile_pic: Option<String>,
    pub is_verified: bool,
    pub verified_badge: Option<String>,
}

/// One search result with its owner and a short service preview
#[derive(Debug, Clone)]
pub struct ShopSearchHit {
    pub summary: ShopSummary,
    pub owner: OwnerSnippet,
    pub services: Vec<crate::features::shops::models::ServicePreview>,
}
