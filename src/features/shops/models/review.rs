use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Public fields of a review author
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub name: String,
    pub profile_pic: Option<String>,
}

/// Review of a shop, service or product, joined with its author
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub author_id: Uuid,
    pub shop_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub author: ReviewAuthor,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub author_id: Uuid,
    pub shop_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Number of shop reviews carrying a given rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub rating: i16,
    pub count: i64,
}
