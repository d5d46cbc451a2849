use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::features::shops::error::{ShopError, ShopResult};
use crate::features::shops::models::{
    CreateShop, NewReview, NewShop, OwnerShopFilter, ProductDetail, ProductFilter, RatingBucket,
    ReviewWithAuthor, ServiceDetail, ServiceFilter, Shop, ShopAggregate, ShopSearch,
    ShopSearchHit, ShopSummary, ShopUpdate, ShopWithOwner,
};
use crate::features::shops::repositories::{
    RepositoryError, RepositoryResult, ShopChanges, ShopRepository,
};
use crate::features::shops::services::slug::{
    base_slug_for_name, fit_base_slug, is_valid_slug,
};
use crate::features::shops::services::stats::average_rating;
use crate::shared::constants::{MAX_SLUG_ATTEMPTS, MAX_SLUG_WRITE_ATTEMPTS, MIN_SLUG_LEN};
use crate::shared::types::{Meta, PageRequest};

/// One page of a shop's reviews with its rating breakdown
#[derive(Debug, Clone)]
pub struct ShopReviews {
    pub reviews: Vec<ReviewWithAuthor>,
    pub meta: Meta,
    pub total_reviews: i64,
    pub average_rating: f64,
    pub distribution: Vec<RatingBucket>,
}

/// Shop directory: slug assignment, owner-scoped writes and public read models
pub struct ShopService {
    repo: Arc<dyn ShopRepository>,
}

impl ShopService {
    pub fn new(repo: Arc<dyn ShopRepository>) -> Self {
        Self { repo }
    }

    /// Find the first free slug among `base`, `base-1` .. `base-999`.
    ///
    /// Only active shops count as collisions, and `exclude_id` never collides
    /// with itself. Performs reads only.
    pub async fn ensure_unique_slug(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
    ) -> ShopResult<String> {
        if base.len() < MIN_SLUG_LEN {
            return Err(ShopError::InvalidInput(format!(
                "Base slug must be at least {} characters",
                MIN_SLUG_LEN
            )));
        }

        let mut candidate = base.to_string();
        for counter in 1..=MAX_SLUG_ATTEMPTS {
            if !self.repo.active_slug_exists(&candidate, exclude_id).await? {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, counter);
        }

        tracing::error!(
            "Slug space exhausted for '{}' after {} attempts",
            base,
            MAX_SLUG_ATTEMPTS
        );
        Err(ShopError::SlugExhausted {
            base: base.to_string(),
            attempts: MAX_SLUG_ATTEMPTS,
        })
    }

    /// Run `write` with a fresh unique slug, retrying when a concurrent writer
    /// claims the slug between the check and the write.
    async fn write_with_unique_slug<T, F, Fut>(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
        mut write: F,
    ) -> ShopResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = RepositoryResult<T>>,
    {
        for attempt in 1..=MAX_SLUG_WRITE_ATTEMPTS {
            let slug = self.ensure_unique_slug(base, exclude_id).await?;
            match write(slug).await {
                Err(RepositoryError::SlugTaken(slug)) => {
                    tracing::warn!(
                        "Slug '{}' was claimed concurrently (attempt {}/{})",
                        slug,
                        attempt,
                        MAX_SLUG_WRITE_ATTEMPTS
                    );
                }
                result => return result.map_err(ShopError::from),
            }
        }

        Err(ShopError::Conflict(format!(
            "Could not reserve a slug for '{}', please retry",
            base
        )))
    }

    async fn with_owner(&self, shop: Shop) -> ShopResult<ShopWithOwner> {
        let owner = self.repo.find_owner(shop.owner_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "shop {} references missing owner {}",
                shop.id, shop.owner_id
            ))
        })?;
        Ok(ShopWithOwner { shop, owner })
    }

    pub async fn create_shop(&self, input: CreateShop) -> ShopResult<ShopWithOwner> {
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .map(str::to_string)
            .ok_or(ShopError::MissingField("name"))?;
        let base = base_slug_for_name(&name)?;

        let template = NewShop::from_input(input, name, String::new());
        let repo = &self.repo;
        let shop = self
            .write_with_unique_slug(&base, None, move |slug| {
                repo.insert_shop(NewShop {
                    slug,
                    ..template.clone()
                })
            })
            .await?;

        tracing::info!("Shop created: name='{}', slug='{}'", shop.name, shop.slug);
        self.with_owner(shop).await
    }

    /// Apply a partial update, regenerating the slug when the name changes.
    ///
    /// Ownership is not checked here; see [`ShopService::update_owned_shop`].
    pub async fn update_shop(&self, shop_id: Uuid, patch: ShopUpdate) -> ShopResult<ShopWithOwner> {
        let mut patch = patch;
        if let Some(name) = patch.name.take() {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ShopError::InvalidInput("Shop name cannot be empty".to_string()));
            }
            patch.name = Some(name);
        }

        let renamed_base = match &patch.name {
            Some(name) => {
                let current = self
                    .repo
                    .find_shop(shop_id)
                    .await?
                    .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;
                if &current.name != name {
                    Some(base_slug_for_name(name)?)
                } else {
                    None
                }
            }
            None => None,
        };

        let repo = &self.repo;
        let updated = match renamed_base {
            Some(base) => {
                let shop = self
                    .write_with_unique_slug(&base, Some(shop_id), move |slug| {
                        repo.update_shop(
                            shop_id,
                            ShopChanges {
                                fields: patch.clone(),
                                slug: Some(slug),
                            },
                        )
                    })
                    .await?;
                if let Some(shop) = &shop {
                    tracing::info!("Shop {} renamed, slug is now '{}'", shop.id, shop.slug);
                }
                shop
            }
            None => {
                self.repo
                    .update_shop(
                        shop_id,
                        ShopChanges {
                            fields: patch,
                            slug: None,
                        },
                    )
                    .await?
            }
        };

        let shop = updated.ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;
        self.with_owner(shop).await
    }

    /// Update a shop on behalf of its owner; other users get `NotFound`
    pub async fn update_owned_shop(
        &self,
        owner_id: Uuid,
        shop_id: Uuid,
        patch: ShopUpdate,
    ) -> ShopResult<ShopWithOwner> {
        self.repo
            .find_owned_shop(shop_id, owner_id)
            .await?
            .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;

        self.update_shop(shop_id, patch).await
    }

    pub async fn delete_owned_shop(&self, owner_id: Uuid, shop_id: Uuid) -> ShopResult<()> {
        self.repo
            .find_owned_shop(shop_id, owner_id)
            .await?
            .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;

        if !self.repo.soft_delete_shop(shop_id).await? {
            return Err(ShopError::NotFound("Shop not found".to_string()));
        }

        tracing::info!("Shop {} soft-deleted by owner {}", shop_id, owner_id);
        Ok(())
    }

    /// Bring back a soft-deleted shop. Its slug is kept when still free,
    /// otherwise the next free suffix is assigned.
    pub async fn restore_owned_shop(
        &self,
        owner_id: Uuid,
        shop_id: Uuid,
    ) -> ShopResult<ShopWithOwner> {
        let shop = self
            .repo
            .find_deleted_owned_shop(shop_id, owner_id)
            .await?
            .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;

        let kept = if self.repo.active_slug_exists(&shop.slug, Some(shop_id)).await? {
            None
        } else {
            match self.repo.restore_shop(shop_id, &shop.slug).await {
                Err(RepositoryError::SlugTaken(_)) => None,
                result => Some(result?),
            }
        };

        let restored = match kept {
            Some(restored) => restored,
            None => {
                let base = fit_base_slug(&shop.slug);
                let repo = &self.repo;
                self.write_with_unique_slug(&base, Some(shop_id), move |slug| async move {
                    repo.restore_shop(shop_id, &slug).await
                })
                .await?
            }
        }
        .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;

        if restored.slug != shop.slug {
            tracing::warn!(
                "Shop {} restored under '{}' because '{}' is in use",
                shop_id,
                restored.slug,
                shop.slug
            );
        }
        self.with_owner(restored).await
    }

    /// Resolve the public aggregate of an active shop.
    ///
    /// The slug is trimmed and lowercased first. `Ok(None)` means no active
    /// shop answers to it.
    pub async fn get_shop_by_slug(&self, slug: &str) -> ShopResult<Option<ShopAggregate>> {
        let normalized = slug.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ShopError::InvalidInput("Slug is required".to_string()));
        }
        if !is_valid_slug(&normalized) {
            return Ok(None);
        }

        let Some(shop) = self.repo.find_shop_by_slug(&normalized).await? else {
            return Ok(None);
        };

        let ShopWithOwner { shop, owner } = self.with_owner(shop).await?;
        let (services, _) = self
            .repo
            .list_shop_services(shop.id, &ServiceFilter::default(), None)
            .await?;
        let (products, _) = self
            .repo
            .list_shop_products(shop.id, &ProductFilter::default(), None)
            .await?;
        let (reviews, _) = self.repo.list_shop_reviews(shop.id, None).await?;
        let address = self.repo.find_address(shop.id).await?;
        let design = match shop.design_id {
            Some(design_id) => self.repo.find_design(design_id).await?,
            None => None,
        };

        Ok(Some(ShopAggregate {
            shop,
            owner,
            services,
            products,
            reviews,
            address,
            design,
        }))
    }

    async fn require_shop_by_slug(&self, slug: &str) -> ShopResult<Shop> {
        let normalized = slug.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ShopError::InvalidInput("Slug is required".to_string()));
        }
        let shop = if is_valid_slug(&normalized) {
            self.repo.find_shop_by_slug(&normalized).await?
        } else {
            None
        };
        shop.ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))
    }

    pub async fn list_services(
        &self,
        slug: &str,
        filter: ServiceFilter,
        page: PageRequest,
    ) -> ShopResult<(Vec<ServiceDetail>, Meta)> {
        let shop = self.require_shop_by_slug(slug).await?;
        let (services, total) = self
            .repo
            .list_shop_services(shop.id, &filter, Some(page))
            .await?;
        Ok((services, page.meta(total)))
    }

    pub async fn list_products(
        &self,
        slug: &str,
        filter: ProductFilter,
        page: PageRequest,
    ) -> ShopResult<(Vec<ProductDetail>, Meta)> {
        let shop = self.require_shop_by_slug(slug).await?;
        let (products, total) = self
            .repo
            .list_shop_products(shop.id, &filter, Some(page))
            .await?;
        Ok((products, page.meta(total)))
    }

    pub async fn list_reviews(&self, slug: &str, page: PageRequest) -> ShopResult<ShopReviews> {
        let shop = self.require_shop_by_slug(slug).await?;
        let (reviews, total) = self.repo.list_shop_reviews(shop.id, Some(page)).await?;
        let distribution = self.repo.rating_distribution(shop.id).await?;
        let rating_total: i64 = distribution.iter().map(|b| b.rating as i64 * b.count).sum();

        Ok(ShopReviews {
            reviews,
            meta: page.meta(total),
            total_reviews: total,
            average_rating: average_rating(rating_total, total),
            distribution,
        })
    }

    /// The owner's active shops, newest first
    pub async fn list_provider_shops(
        &self,
        owner_id: Uuid,
        filter: OwnerShopFilter,
        page: PageRequest,
    ) -> ShopResult<(Vec<ShopSummary>, Meta)> {
        let (shops, total) = self
            .repo
            .list_owner_shops(owner_id, &filter, Some(page))
            .await?;
        Ok((shops, page.meta(total)))
    }

    pub async fn list_my_shops(&self, owner_id: Uuid) -> ShopResult<Vec<ShopSummary>> {
        let (shops, _) = self
            .repo
            .list_owner_shops(owner_id, &OwnerShopFilter::default(), None)
            .await?;
        Ok(shops)
    }

    pub async fn search_shops(
        &self,
        search: ShopSearch,
        page: PageRequest,
    ) -> ShopResult<(Vec<ShopSearchHit>, Meta)> {
        if search.is_empty() {
            return Err(ShopError::InvalidInput(
                "At least one search parameter is required".to_string(),
            ));
        }
        let (hits, total) = self.repo.search_shops(&search, page).await?;
        Ok((hits, page.meta(total)))
    }

    pub async fn create_review(
        &self,
        author_id: Uuid,
        shop_id: Uuid,
        rating: i64,
        comment: Option<String>,
    ) -> ShopResult<ReviewWithAuthor> {
        if !(1..=5).contains(&rating) {
            return Err(ShopError::InvalidInput(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        self.repo
            .find_shop(shop_id)
            .await?
            .ok_or_else(|| ShopError::NotFound("Shop not found".to_string()))?;

        let duplicate = || ShopError::Conflict("You have already reviewed this shop".to_string());
        if self.repo.review_exists(author_id, shop_id).await? {
            return Err(duplicate());
        }

        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let review = self
            .repo
            .insert_review(NewReview {
                author_id,
                shop_id,
                rating: rating as i16,
                comment,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::DuplicateReview => duplicate(),
                other => ShopError::from(other),
            })?;

        tracing::info!("Review {} added to shop {}", review.id, shop_id);
        Ok(review)
    }
}
