//! In-memory [`ShopRepository`] for service and route tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::features::shops::models::{
    Category, Design, NewReview, NewShop, OwnerProfile, OwnerShopFilter, OwnerSnippet,
    ProductDetail, ProductFilter, RatingBucket, ReviewAuthor, ReviewWithAuthor, ServiceDetail,
    ServiceFilter, ServicePreview, Shop, ShopAddress, ShopSearch, ShopSearchHit, ShopSummary,
};
use crate::features::shops::repositories::{
    RepositoryError, RepositoryResult, ShopChanges, ShopRepository,
};
use crate::shared::constants::SEARCH_SERVICE_PREVIEW;
use crate::shared::types::PageRequest;

struct StoredService {
    detail: ServiceDetail,
    deleted: bool,
}

struct StoredProduct {
    detail: ProductDetail,
    deleted: bool,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, OwnerProfile>,
    shops: Vec<Shop>,
    services: Vec<StoredService>,
    products: Vec<StoredProduct>,
    reviews: Vec<ReviewWithAuthor>,
    addresses: Vec<ShopAddress>,
    designs: Vec<Design>,
    /// Monotonic clock so "newest first" is deterministic
    tick: i64,
}

impl State {
    fn now(&mut self) -> chrono::DateTime<Utc> {
        self.tick += 1;
        chrono::DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_700_000_000 + self.tick)
    }

    fn slug_taken(&self, slug: &str, exclude_id: Option<Uuid>) -> bool {
        self.shops
            .iter()
            .any(|s| s.slug == slug && s.deleted_at.is_none() && Some(s.id) != exclude_id)
    }

    fn summary(&self, shop: &Shop) -> ShopSummary {
        let reviews: Vec<&ReviewWithAuthor> = self
            .reviews
            .iter()
            .filter(|r| r.shop_id == Some(shop.id))
            .collect();

        ShopSummary {
            shop: shop.clone(),
            service_count: self
                .services
                .iter()
                .filter(|s| s.detail.shop_id == shop.id && !s.deleted)
                .count() as i64,
            product_count: self
                .products
                .iter()
                .filter(|p| p.detail.shop_id == shop.id && !p.deleted)
                .count() as i64,
            review_count: reviews.len() as i64,
            rating_total: reviews.iter().map(|r| r.rating as i64).sum(),
        }
    }
}

/// Mutex-guarded store mirroring the Postgres semantics, including the
/// partial unique slug index and the one-review-per-author index.
#[derive(Default)]
pub struct MemoryShopRepository {
    state: Mutex<State>,
    stale_slug_reads: AtomicU32,
    slug_checks: AtomicU32,
}

impl MemoryShopRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` slug checks report "free", as if another writer
    /// committed between the check and the write.
    pub fn miss_next_slug_checks(&self, count: u32) {
        self.stale_slug_reads.store(count, Ordering::SeqCst);
    }

    pub fn slug_checks(&self) -> u32 {
        self.slug_checks.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, name: &str) -> OwnerProfile {
        let user = OwnerProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            phone: Some("+201000000000".to_string()),
            profile_pic: None,
            bio: None,
            is_verified: false,
            verified_badge: None,
            role: "PROVIDER".to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user.id, user.clone());
        user
    }

    /// Insert a shop row directly, bypassing slug derivation
    pub fn add_shop(&self, owner_id: Uuid, name: &str, slug: &str) -> Shop {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let shop = Shop {
            id: Uuid::new_v4(),
            owner_id,
            design_id: None,
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            phone: None,
            email: None,
            website: None,
            city: None,
            location_lat: None,
            location_lon: None,
            cover_image: None,
            logo_image: None,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.shops.push(shop.clone());
        shop
    }

    pub fn mark_deleted(&self, shop_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        if let Some(shop) = state.shops.iter_mut().find(|s| s.id == shop_id) {
            shop.deleted_at = Some(now);
        }
    }

    pub fn edit_shop(&self, shop_id: Uuid, edit: impl FnOnce(&mut Shop)) {
        let mut state = self.state.lock().unwrap();
        if let Some(shop) = state.shops.iter_mut().find(|s| s.id == shop_id) {
            edit(shop);
        }
    }

    pub fn add_design(&self, name: &str) -> Design {
        let design = Design {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
        };
        self.state.lock().unwrap().designs.push(design.clone());
        design
    }

    pub fn add_address(&self, shop_id: Uuid, city: &str) -> ShopAddress {
        let address = ShopAddress {
            id: Uuid::new_v4(),
            shop_id,
            street: Some("26 July St".to_string()),
            city: Some(city.to_string()),
            region: None,
            postal_code: None,
            country: Some("EG".to_string()),
        };
        self.state.lock().unwrap().addresses.push(address.clone());
        address
    }

    pub fn add_service(
        &self,
        shop_id: Uuid,
        category: Option<&str>,
        available: bool,
        deleted: bool,
    ) -> ServiceDetail {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let detail = ServiceDetail {
            id: Uuid::new_v4(),
            shop_id,
            price: Some(Decimal::new(15000, 2)),
            available,
            city: None,
            created_at: now,
            translation: None,
            categories: category
                .map(|slug| {
                    vec![Category {
                        id: Uuid::new_v4(),
                        name: slug.to_string(),
                        slug: slug.to_string(),
                    }]
                })
                .unwrap_or_default(),
            sub_category: None,
            tags: Vec::new(),
            design: None,
            availability: Vec::new(),
            reviews: Vec::new(),
        };
        state.services.push(StoredService {
            detail: detail.clone(),
            deleted,
        });
        detail
    }

    pub fn add_product(
        &self,
        shop_id: Uuid,
        name: &str,
        stock: i32,
        is_active: bool,
        deleted: bool,
    ) -> ProductDetail {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let detail = ProductDetail {
            id: Uuid::new_v4(),
            shop_id,
            name: name.to_string(),
            description: None,
            price: Decimal::new(9999, 2),
            stock,
            is_active,
            created_at: now,
            tags: Vec::new(),
            design: None,
            reviews: Vec::new(),
        };
        state.products.push(StoredProduct {
            detail: detail.clone(),
            deleted,
        });
        detail
    }

    pub fn add_review(&self, author_id: Uuid, shop_id: Uuid, rating: i16) -> ReviewWithAuthor {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        let author = state
            .users
            .get(&author_id)
            .map(|u| ReviewAuthor {
                name: u.name.clone(),
                profile_pic: u.profile_pic.clone(),
            })
            .unwrap_or(ReviewAuthor {
                name: "Anonymous".to_string(),
                profile_pic: None,
            });
        let review = ReviewWithAuthor {
            id: Uuid::new_v4(),
            author_id,
            shop_id: Some(shop_id),
            service_id: None,
            product_id: None,
            rating,
            comment: None,
            created_at: now,
            author,
        };
        state.reviews.push(review.clone());
        review
    }
}

fn paginate<T>(items: Vec<T>, page: Option<PageRequest>) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = match page {
        Some(p) => items
            .into_iter()
            .skip(usize::try_from(p.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(p.limit).unwrap_or(usize::MAX))
            .collect(),
        None => items,
    };
    (items, total)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[async_trait]
impl ShopRepository for MemoryShopRepository {
    async fn active_slug_exists(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        self.slug_checks.fetch_add(1, Ordering::SeqCst);
        let stale = self
            .stale_slug_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(false);
        }
        Ok(self.state.lock().unwrap().slug_taken(slug, exclude_id))
    }

    async fn insert_shop(&self, shop: NewShop) -> RepositoryResult<Shop> {
        let mut state = self.state.lock().unwrap();
        if state.slug_taken(&shop.slug, None) {
            return Err(RepositoryError::SlugTaken(shop.slug));
        }
        let now = state.now();
        let row = Shop {
            id: Uuid::new_v4(),
            owner_id: shop.owner_id,
            design_id: shop.design_id,
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
            is_active: shop.is_active,
            is_verified: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.shops.push(row.clone());
        Ok(row)
    }

    async fn find_shop(&self, id: Uuid) -> RepositoryResult<Option<Shop>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .shops
            .iter()
            .find(|s| s.id == id && s.deleted_at.is_none())
            .cloned())
    }

    async fn find_owned_shop(&self, id: Uuid, owner_id: Uuid) -> RepositoryResult<Option<Shop>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .shops
            .iter()
            .find(|s| s.id == id && s.owner_id == owner_id && s.deleted_at.is_none())
            .cloned())
    }

    async fn find_deleted_owned_shop(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> RepositoryResult<Option<Shop>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .shops
            .iter()
            .find(|s| s.id == id && s.owner_id == owner_id && s.deleted_at.is_some())
            .cloned())
    }

    async fn update_shop(&self, id: Uuid, changes: ShopChanges) -> RepositoryResult<Option<Shop>> {
        let mut state = self.state.lock().unwrap();
        if let Some(slug) = &changes.slug {
            if state.slug_taken(slug, Some(id)) {
                return Err(RepositoryError::SlugTaken(slug.clone()));
            }
        }
        let now = state.now();
        let Some(shop) = state
            .shops
            .iter_mut()
            .find(|s| s.id == id && s.deleted_at.is_none())
        else {
            return Ok(None);
        };

        let fields = changes.fields;
        if let Some(name) = fields.name {
            shop.name = name;
        }
        if let Some(slug) = changes.slug {
            shop.slug = slug;
        }
        if let Some(city) = fields.city {
            shop.city = Some(city);
        }
        if let Some(v) = fields.description {
            shop.description = v;
        }
        if let Some(v) = fields.phone {
            shop.phone = v;
        }
        if let Some(v) = fields.email {
            shop.email = v;
        }
        if let Some(v) = fields.website {
            shop.website = v;
        }
        if let Some(v) = fields.cover_image {
            shop.cover_image = v;
        }
        if let Some(v) = fields.logo_image {
            shop.logo_image = v;
        }
        if let Some(v) = fields.is_active {
            shop.is_active = v;
        }
        shop.updated_at = now;
        Ok(Some(shop.clone()))
    }

    async fn soft_delete_shop(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        match state
            .shops
            .iter_mut()
            .find(|s| s.id == id && s.deleted_at.is_none())
        {
            Some(shop) => {
                shop.deleted_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore_shop(&self, id: Uuid, slug: &str) -> RepositoryResult<Option<Shop>> {
        let mut state = self.state.lock().unwrap();
        if state.slug_taken(slug, Some(id)) {
            return Err(RepositoryError::SlugTaken(slug.to_string()));
        }
        let now = state.now();
        Ok(state
            .shops
            .iter_mut()
            .find(|s| s.id == id && s.deleted_at.is_some())
            .map(|shop| {
                shop.deleted_at = None;
                shop.slug = slug.to_string();
                shop.updated_at = now;
                shop.clone()
            }))
    }

    async fn find_shop_by_slug(&self, slug: &str) -> RepositoryResult<Option<Shop>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .shops
            .iter()
            .find(|s| s.slug == slug && s.deleted_at.is_none())
            .cloned())
    }

    async fn find_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<OwnerProfile>> {
        Ok(self.state.lock().unwrap().users.get(&owner_id).cloned())
    }

    async fn find_address(&self, shop_id: Uuid) -> RepositoryResult<Option<ShopAddress>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .addresses
            .iter()
            .find(|a| a.shop_id == shop_id)
            .cloned())
    }

    async fn find_design(&self, design_id: Uuid) -> RepositoryResult<Option<Design>> {
        let state = self.state.lock().unwrap();
        Ok(state.designs.iter().find(|d| d.id == design_id).cloned())
    }

    async fn list_shop_services(
        &self,
        shop_id: Uuid,
        filter: &ServiceFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ServiceDetail>, i64)> {
        let state = self.state.lock().unwrap();
        let mut services: Vec<ServiceDetail> = state
            .services
            .iter()
            .filter(|s| s.detail.shop_id == shop_id && s.detail.available && !s.deleted)
            .filter(|s| match &filter.category {
                Some(slug) => s.detail.categories.iter().any(|c| &c.slug == slug),
                None => true,
            })
            .filter(|s| match &filter.search {
                Some(text) => s.detail.translation.as_ref().is_some_and(|t| {
                    contains_ci(t.name_en.as_deref(), text)
                        || contains_ci(t.name_ar.as_deref(), text)
                        || contains_ci(t.description_en.as_deref(), text)
                        || contains_ci(t.description_ar.as_deref(), text)
                }),
                None => true,
            })
            .map(|s| s.detail.clone())
            .collect();
        services.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(services, page))
    }

    async fn list_shop_products(
        &self,
        shop_id: Uuid,
        filter: &ProductFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ProductDetail>, i64)> {
        let state = self.state.lock().unwrap();
        let mut products: Vec<ProductDetail> = state
            .products
            .iter()
            .filter(|p| p.detail.shop_id == shop_id && p.detail.is_active && !p.deleted)
            .filter(|p| !filter.in_stock || p.detail.stock > 0)
            .filter(|p| match &filter.search {
                Some(text) => {
                    contains_ci(Some(&p.detail.name), text)
                        || contains_ci(p.detail.description.as_deref(), text)
                }
                None => true,
            })
            .map(|p| p.detail.clone())
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(products, page))
    }

    async fn list_shop_reviews(
        &self,
        shop_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ReviewWithAuthor>, i64)> {
        let state = self.state.lock().unwrap();
        let mut reviews: Vec<ReviewWithAuthor> = state
            .reviews
            .iter()
            .filter(|r| r.shop_id == Some(shop_id))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(reviews, page))
    }

    async fn rating_distribution(&self, shop_id: Uuid) -> RepositoryResult<Vec<RatingBucket>> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<i16, i64> = HashMap::new();
        for review in state.reviews.iter().filter(|r| r.shop_id == Some(shop_id)) {
            *counts.entry(review.rating).or_default() += 1;
        }
        let mut buckets: Vec<RatingBucket> = counts
            .into_iter()
            .map(|(rating, count)| RatingBucket { rating, count })
            .collect();
        buckets.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(buckets)
    }

    async fn list_owner_shops(
        &self,
        owner_id: Uuid,
        filter: &OwnerShopFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ShopSummary>, i64)> {
        let state = self.state.lock().unwrap();
        let mut shops: Vec<&Shop> = state
            .shops
            .iter()
            .filter(|s| s.owner_id == owner_id && s.deleted_at.is_none())
            .filter(|s| match filter.status.is_active() {
                Some(active) => s.is_active == active,
                None => true,
            })
            .filter(|s| match &filter.search {
                Some(text) => {
                    contains_ci(Some(&s.name), text) || contains_ci(s.description.as_deref(), text)
                }
                None => true,
            })
            .collect();
        shops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let summaries = shops.into_iter().map(|s| state.summary(s)).collect();
        Ok(paginate(summaries, page))
    }

    async fn search_shops(
        &self,
        search: &ShopSearch,
        page: PageRequest,
    ) -> RepositoryResult<(Vec<ShopSearchHit>, i64)> {
        let state = self.state.lock().unwrap();
        let mut shops: Vec<&Shop> = state
            .shops
            .iter()
            .filter(|s| s.deleted_at.is_none())
            .filter(|s| match &search.text {
                Some(text) => {
                    contains_ci(Some(&s.name), text) || contains_ci(s.description.as_deref(), text)
                }
                None => true,
            })
            .filter(|s| match &search.city {
                Some(city) => contains_ci(s.city.as_deref(), city),
                None => true,
            })
            .filter(|s| match &search.category {
                Some(slug) => state.services.iter().any(|sv| {
                    sv.detail.shop_id == s.id
                        && !sv.deleted
                        && sv.detail.categories.iter().any(|c| &c.slug == slug)
                }),
                None => true,
            })
            .collect();
        shops.sort_by(|a, b| {
            b.is_verified
                .cmp(&a.is_verified)
                .then(b.created_at.cmp(&a.created_at))
        });

        let hits = shops
            .into_iter()
            .map(|shop| {
                let owner = state
                    .users
                    .get(&shop.owner_id)
                    .map(|u| OwnerSnippet {
                        name: u.name.clone(),
                        profile_pic: u.profile_pic.clone(),
                        is_verified: u.is_verified,
                        verified_badge: u.verified_badge.clone(),
                    })
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!("shop {} has no owner", shop.id))
                    })?;
                let mut services: Vec<&ServiceDetail> = state
                    .services
                    .iter()
                    .filter(|sv| sv.detail.shop_id == shop.id && sv.detail.available && !sv.deleted)
                    .map(|sv| &sv.detail)
                    .collect();
                services.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let services = services
                    .into_iter()
                    .take(SEARCH_SERVICE_PREVIEW as usize)
                    .map(|sv| ServicePreview {
                        id: sv.id,
                        price: sv.price,
                        translation: sv.translation.clone(),
                        categories: sv.categories.clone(),
                    })
                    .collect();
                Ok(ShopSearchHit {
                    summary: state.summary(shop),
                    owner,
                    services,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(paginate(hits, Some(page)))
    }

    async fn review_exists(&self, author_id: Uuid, shop_id: Uuid) -> RepositoryResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .reviews
            .iter()
            .any(|r| r.author_id == author_id && r.shop_id == Some(shop_id)))
    }

    async fn insert_review(&self, review: NewReview) -> RepositoryResult<ReviewWithAuthor> {
        let mut state = self.state.lock().unwrap();
        if state
            .reviews
            .iter()
            .any(|r| r.author_id == review.author_id && r.shop_id == Some(review.shop_id))
        {
            return Err(RepositoryError::DuplicateReview);
        }
        let author = state
            .users
            .get(&review.author_id)
            .map(|u| ReviewAuthor {
                name: u.name.clone(),
                profile_pic: u.profile_pic.clone(),
            })
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "review author {} has no user record",
                    review.author_id
                ))
            })?;
        let now = state.now();
        let row = ReviewWithAuthor {
            id: Uuid::new_v4(),
            author_id: review.author_id,
            shop_id: Some(review.shop_id),
            service_id: None,
            product_id: None,
            rating: review.rating,
            comment: review.comment,
            created_at: now,
            author,
        };
        state.reviews.push(row.clone());
        Ok(row)
    }
}
