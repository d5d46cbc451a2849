use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::shops::models::{RatingBucket, ReviewWithAuthor};
use crate::features::shops::services::ShopReviews;

/// Request DTO for reviewing a shop
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    /// Whole stars from 1 to 5
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
    #[validate(length(max = 2000, message = "Comment must not exceed 2000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatsDto {
    pub average_rating: f64,
    pub total_reviews: i64,
    pub rating_distribution: Vec<RatingBucket>,
}

/// One page of reviews plus the shop-wide rating breakdown
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopReviewsDto {
    pub reviews: Vec<ReviewWithAuthor>,
    pub stats: ReviewStatsDto,
}

impl From<ShopReviews> for ShopReviewsDto {
    fn from(r: ShopReviews) -> Self {
        Self {
            reviews: r.reviews,
            stats: ReviewStatsDto {
                average_rating: r.average_rating,
                total_reviews: r.total_reviews,
                rating_distribution: r.distribution,
            },
        }
    }
}
