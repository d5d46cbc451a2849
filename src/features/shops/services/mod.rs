mod shop_service;
pub mod slug;
pub mod stats;

pub use shop_service::{ShopReviews, ShopService};
pub use stats::{compute_shop_stats, RatingSource, ShopStats};
