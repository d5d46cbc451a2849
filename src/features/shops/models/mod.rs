mod catalog;
mod review;
mod shop;

pub use catalog::{
    AvailabilityWindow, Category, Design, ProductDetail, ProductFilter, ServiceDetail,
    ServiceFilter, ServicePreview, ServiceTranslation, ShopAddress, SubCategory, Tag,
};
pub use review::{NewReview, RatingBucket, ReviewAuthor, ReviewWithAuthor};
pub use shop::{
    CreateShop, NewShop, OwnerProfile, OwnerShopFilter, OwnerSnippet, Shop, ShopAggregate,
    ShopSearch, ShopSearchHit, ShopStatusFilter, ShopSummary, ShopUpdate, ShopWithOwner,
};
