use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::features::shops::models::{
    Design, NewReview, NewShop, OwnerProfile, OwnerShopFilter, ProductDetail, ProductFilter,
    RatingBucket, ReviewWithAuthor, ServiceDetail, ServiceFilter, Shop, ShopAddress, ShopSearch,
    ShopSearchHit, ShopSummary, ShopUpdate,
};
use crate::shared::types::PageRequest;

/// Errors raised by the persistence layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Another active shop already holds this slug
    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    #[error("Author already reviewed this shop")]
    DuplicateReview,

    #[error("Inconsistent data: {0}")]
    DataCorruption(String),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Field changes written by a single shop update
#[derive(Debug, Clone, Default)]
pub struct ShopChanges {
    pub fields: ShopUpdate,
    pub slug: Option<String>,
}

/// Store abstraction over shops and the catalog attached to them.
///
/// Every lookup that says "active" only sees rows with `deleted_at IS NULL`.
#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn active_slug_exists(&self, slug: &str, exclude_id: Option<Uuid>)
        -> RepositoryResult<bool>;

    /// Fails with [`RepositoryError::SlugTaken`] when the slug index rejects the row
    async fn insert_shop(&self, shop: NewShop) -> RepositoryResult<Shop>;

    async fn find_shop(&self, id: Uuid) -> RepositoryResult<Option<Shop>>;

    async fn find_owned_shop(&self, id: Uuid, owner_id: Uuid) -> RepositoryResult<Option<Shop>>;

    async fn find_deleted_owned_shop(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> RepositoryResult<Option<Shop>>;

    /// Returns `None` when no active shop has this id
    async fn update_shop(&self, id: Uuid, changes: ShopChanges) -> RepositoryResult<Option<Shop>>;

    async fn soft_delete_shop(&self, id: Uuid) -> RepositoryResult<bool>;

    async fn restore_shop(&self, id: Uuid, slug: &str) -> RepositoryResult<Option<Shop>>;

    async fn find_shop_by_slug(&self, slug: &str) -> RepositoryResult<Option<Shop>>;

    async fn find_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<OwnerProfile>>;

    async fn find_address(&self, shop_id: Uuid) -> RepositoryResult<Option<ShopAddress>>;

    async fn find_design(&self, design_id: Uuid) -> RepositoryResult<Option<Design>>;

    /// Available, non-deleted services, newest first. `None` loads them all.
    async fn list_shop_services(
        &self,
        shop_id: Uuid,
        filter: &ServiceFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ServiceDetail>, i64)>;

    /// Active, non-deleted products, newest first. `None` loads them all.
    async fn list_shop_products(
        &self,
        shop_id: Uuid,
        filter: &ProductFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ProductDetail>, i64)>;

    /// Reviews of the shop itself, newest first. `None` loads them all.
    async fn list_shop_reviews(
        &self,
        shop_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ReviewWithAuthor>, i64)>;

    async fn rating_distribution(&self, shop_id: Uuid) -> RepositoryResult<Vec<RatingBucket>>;

    async fn list_owner_shops(
        &self,
        owner_id: Uuid,
        filter: &OwnerShopFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ShopSummary>, i64)>;

    /// Active shops matching every given criterion, verified first then newest
    async fn search_shops(
        &self,
        search: &ShopSearch,
        page: PageRequest,
    ) -> RepositoryResult<(Vec<ShopSearchHit>, i64)>;

    async fn review_exists(&self, author_id: Uuid, shop_id: Uuid) -> RepositoryResult<bool>;

    /// Fails with [`RepositoryError::DuplicateReview`] when the author already reviewed the shop
    async fn insert_review(&self, review: NewReview) -> RepositoryResult<ReviewWithAuthor>;
}
