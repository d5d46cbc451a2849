use serde::Serialize;
use utoipa::ToSchema;

use crate::features::shops::models::{ShopAggregate, ShopSummary};

/// Anything that can report review and catalog counts for a shop
pub trait RatingSource {
    fn total_services(&self) -> i64;
    fn total_products(&self) -> i64;
    fn total_reviews(&self) -> i64;
    /// Sum of all review ratings
    fn rating_total(&self) -> i64;
    fn is_verified(&self) -> bool;
}

/// Figures shown next to a shop.
///
/// Owner listings count every non-deleted service and product, hidden ones
/// included. The public page only counts the available services and active
/// products it actually shows, so the two `totalServices` can differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopStats {
    pub total_services: i64,
    pub total_products: i64,
    pub total_reviews: i64,
    /// Mean rating rounded to one decimal; 0 without reviews
    pub average_rating: f64,
    pub is_verified: bool,
}

pub fn compute_shop_stats(source: &impl RatingSource) -> ShopStats {
    ShopStats {
        total_services: source.total_services(),
        total_products: source.total_products(),
        total_reviews: source.total_reviews(),
        average_rating: average_rating(source.rating_total(), source.total_reviews()),
        is_verified: source.is_verified(),
    }
}

/// Mean of `count` ratings summing to `total`, rounded to one decimal
pub fn average_rating(total: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    let mean = total as f64 / count as f64;
    (mean * 10.0).round() / 10.0
}

impl RatingSource for ShopAggregate {
    fn total_services(&self) -> i64 {
        self.services.len() as i64
    }

    fn total_products(&self) -> i64 {
        self.products.len() as i64
    }

    fn total_reviews(&self) -> i64 {
        self.reviews.len() as i64
    }

    fn rating_total(&self) -> i64 {
        self.reviews.iter().map(|r| r.rating as i64).sum()
    }

    fn is_verified(&self) -> bool {
        self.shop.is_verified
    }
}

impl RatingSource for ShopSummary {
    fn total_services(&self) -> i64 {
        self.service_count
    }

    fn total_products(&self) -> i64 {
        self.product_count
    }

    fn total_reviews(&self) -> i64 {
        self.review_count
    }

    fn rating_total(&self) -> i64 {
        self.rating_total
    }

    fn is_verified(&self) -> bool {
        self.shop.is_verified
    }
}
