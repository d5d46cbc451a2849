use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::features::shops::models::{
    AvailabilityWindow, Category, Design, NewReview, NewShop, OwnerProfile, OwnerShopFilter,
    OwnerSnippet, ProductDetail, ProductFilter, RatingBucket, ReviewWithAuthor, ServiceDetail,
    ServiceFilter, ServicePreview, ServiceTranslation, Shop, ShopAddress, ShopSearch,
    ShopSearchHit, ShopSummary, SubCategory, Tag,
};
use crate::features::shops::repositories::{
    RepositoryError, RepositoryResult, ShopChanges, ShopRepository,
};
use crate::shared::constants::SEARCH_SERVICE_PREVIEW;
use crate::shared::types::PageRequest;

/// Partial unique index guarding slugs of active shops
const SLUG_CONSTRAINT: &str = "shops_slug_active_key";

/// Unique index allowing one review per (author, shop)
const REVIEW_CONSTRAINT: &str = "reviews_author_shop_key";

macro_rules! shop_columns {
    () => {
        "s.id, s.owner_id, s.design_id, s.name, s.slug, s.description, s.phone, s.email, \
         s.website, s.city, s.location_lat, s.location_lon, s.cover_image, s.logo_image, \
         s.is_active, s.is_verified, s.created_at, s.updated_at, s.deleted_at"
    };
}

macro_rules! shop_counts {
    () => {
        "(SELECT COUNT(*) FROM services sv WHERE sv.shop_id = s.id AND sv.deleted_at IS NULL) AS service_count, \
         (SELECT COUNT(*) FROM products p WHERE p.shop_id = s.id AND p.deleted_at IS NULL) AS product_count, \
         (SELECT COUNT(*) FROM reviews r WHERE r.shop_id = s.id) AS review_count, \
         (SELECT COALESCE(SUM(r.rating), 0)::BIGINT FROM reviews r WHERE r.shop_id = s.id) AS rating_total"
    };
}

macro_rules! review_columns {
    () => {
        "r.id, r.author_id, r.shop_id, r.service_id, r.product_id, r.rating, r.comment, \
         r.created_at, u.name, u.profile_pic"
    };
}

macro_rules! service_filter {
    () => {
        "FROM services sv \
         LEFT JOIN service_translations t ON t.service_id = sv.id \
         WHERE sv.shop_id = $1 AND sv.available = TRUE AND sv.deleted_at IS NULL \
           AND ($2::TEXT IS NULL OR EXISTS ( \
                SELECT 1 FROM service_categories sc \
                JOIN categories c ON c.id = sc.category_id \
                WHERE sc.service_id = sv.id AND c.slug = $2)) \
           AND ($3::TEXT IS NULL OR t.name_en ILIKE $3 OR t.name_ar ILIKE $3 \
                OR t.description_en ILIKE $3 OR t.description_ar ILIKE $3)"
    };
}

macro_rules! product_filter {
    () => {
        "FROM products p \
         WHERE p.shop_id = $1 AND p.is_active = TRUE AND p.deleted_at IS NULL \
           AND ($2::TEXT IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2) \
           AND ($3::BOOLEAN = FALSE OR p.stock > 0)"
    };
}

macro_rules! owner_shop_filter {
    () => {
        "FROM shops s \
         WHERE s.owner_id = $1 AND s.deleted_at IS NULL \
           AND ($2::TEXT IS NULL OR s.name ILIKE $2 OR s.description ILIKE $2) \
           AND ($3::BOOLEAN IS NULL OR s.is_active = $3)"
    };
}

macro_rules! search_filter {
    () => {
        "FROM shops s \
         JOIN users u ON u.id = s.owner_id \
         WHERE s.deleted_at IS NULL \
           AND ($1::TEXT IS NULL OR s.name ILIKE $1 OR s.description ILIKE $1) \
           AND ($2::TEXT IS NULL OR s.city ILIKE $2) \
           AND ($3::TEXT IS NULL OR EXISTS ( \
                SELECT 1 FROM services sv \
                JOIN service_categories sc ON sc.service_id = sv.id \
                JOIN categories c ON c.id = sc.category_id \
                WHERE sv.shop_id = s.id AND sv.deleted_at IS NULL AND c.slug = $3))"
    };
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: Uuid,
    shop_id: Uuid,
    sub_category_id: Option<Uuid>,
    design_id: Option<Uuid>,
    price: Option<Decimal>,
    available: bool,
    city: Option<String>,
    created_at: DateTime<Utc>,
    has_translation: bool,
    name_en: Option<String>,
    name_ar: Option<String>,
    description_en: Option<String>,
    description_ar: Option<String>,
}

impl ServiceRow {
    fn translation(&self) -> Option<ServiceTranslation> {
        self.has_translation.then(|| ServiceTranslation {
            name_en: self.name_en.clone(),
            name_ar: self.name_ar.clone(),
            description_en: self.description_en.clone(),
            description_ar: self.description_ar.clone(),
        })
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    shop_id: Uuid,
    design_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CategoryLinkRow {
    owner_id: Uuid,
    #[sqlx(flatten)]
    category: Category,
}

#[derive(Debug, FromRow)]
struct TagLinkRow {
    owner_id: Uuid,
    #[sqlx(flatten)]
    tag: Tag,
}

#[derive(Debug, FromRow)]
struct AvailabilityRow {
    service_id: Uuid,
    id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Debug, FromRow)]
struct SearchRow {
    #[sqlx(flatten)]
    summary: ShopSummary,
    owner_name: String,
    owner_profile_pic: Option<String>,
    owner_is_verified: bool,
    owner_verified_badge: Option<String>,
}

/// PostgreSQL implementation of [`ShopRepository`]
pub struct PgShopRepository {
    pool: PgPool,
}

impl PgShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_categories(
        &self,
        service_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<Category>>> {
        let rows = sqlx::query_as::<_, CategoryLinkRow>(
            r#"
            SELECT sc.service_id AS owner_id, c.id, c.name, c.slug
            FROM service_categories sc
            JOIN categories c ON c.id = sc.category_id
            WHERE sc.service_id = ANY($1)
            ORDER BY c.name
            "#,
        )
        .bind(service_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load service categories"))?;

        Ok(group_by(rows.into_iter().map(|r| (r.owner_id, r.category))))
    }

    async fn load_sub_categories(
        &self,
        ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, SubCategory>> {
        let rows = sqlx::query_as::<_, SubCategory>(
            "SELECT id, category_id, name, slug FROM sub_categories WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load sub categories"))?;

        Ok(rows.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn load_designs(&self, ids: &[Uuid]) -> RepositoryResult<HashMap<Uuid, Design>> {
        let rows = sqlx::query_as::<_, Design>(
            "SELECT id, name, slug, description FROM designs WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load designs"))?;

        Ok(rows.into_iter().map(|d| (d.id, d)).collect())
    }

    async fn load_tags(
        &self,
        link_table: TagLink,
        owner_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<Tag>>> {
        let sql = match link_table {
            TagLink::Service => {
                "SELECT l.service_id AS owner_id, t.id, t.name \
                 FROM service_tags l JOIN tags t ON t.id = l.tag_id \
                 WHERE l.service_id = ANY($1) ORDER BY t.name"
            }
            TagLink::Product => {
                "SELECT l.product_id AS owner_id, t.id, t.name \
                 FROM product_tags l JOIN tags t ON t.id = l.tag_id \
                 WHERE l.product_id = ANY($1) ORDER BY t.name"
            }
        };

        let rows = sqlx::query_as::<_, TagLinkRow>(sql)
            .bind(owner_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("load tags"))?;

        Ok(group_by(rows.into_iter().map(|r| (r.owner_id, r.tag))))
    }

    async fn load_availability(
        &self,
        service_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<AvailabilityWindow>>> {
        let rows = sqlx::query_as::<_, AvailabilityRow>(
            r#"
            SELECT service_id, id, day_of_week, start_time, end_time
            FROM service_availability
            WHERE service_id = ANY($1)
            ORDER BY day_of_week, start_time
            "#,
        )
        .bind(service_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load service availability"))?;

        Ok(group_by(rows.into_iter().map(|r| {
            (
                r.service_id,
                AvailabilityWindow {
                    id: r.id,
                    day_of_week: r.day_of_week,
                    start_time: r.start_time,
                    end_time: r.end_time,
                },
            )
        })))
    }

    async fn load_service_reviews(
        &self,
        service_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<ReviewWithAuthor>>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthor>(concat!(
            "SELECT ",
            review_columns!(),
            " FROM reviews r JOIN users u ON u.id = r.author_id \
             WHERE r.service_id = ANY($1) ORDER BY r.created_at DESC"
        ))
        .bind(service_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load service reviews"))?;

        Ok(group_by(
            rows.into_iter()
                .filter_map(|r| r.service_id.map(|id| (id, r))),
        ))
    }

    async fn load_product_reviews(
        &self,
        product_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<ReviewWithAuthor>>> {
        let rows = sqlx::query_as::<_, ReviewWithAuthor>(concat!(
            "SELECT ",
            review_columns!(),
            " FROM reviews r JOIN users u ON u.id = r.author_id \
             WHERE r.product_id = ANY($1) ORDER BY r.created_at DESC"
        ))
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load product reviews"))?;

        Ok(group_by(
            rows.into_iter()
                .filter_map(|r| r.product_id.map(|id| (id, r))),
        ))
    }

    async fn assemble_services(&self, rows: Vec<ServiceRow>) -> RepositoryResult<Vec<ServiceDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let sub_category_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.sub_category_id).collect();
        let design_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.design_id).collect();

        let mut categories = self.load_categories(&ids).await?;
        let sub_categories = self.load_sub_categories(&sub_category_ids).await?;
        let designs = self.load_designs(&design_ids).await?;
        let mut tags = self.load_tags(TagLink::Service, &ids).await?;
        let mut availability = self.load_availability(&ids).await?;
        let mut reviews = self.load_service_reviews(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| ServiceDetail {
                translation: row.translation(),
                categories: categories.remove(&row.id).unwrap_or_default(),
                sub_category: row
                    .sub_category_id
                    .and_then(|id| sub_categories.get(&id).cloned()),
                tags: tags.remove(&row.id).unwrap_or_default(),
                design: row.design_id.and_then(|id| designs.get(&id).cloned()),
                availability: availability.remove(&row.id).unwrap_or_default(),
                reviews: reviews.remove(&row.id).unwrap_or_default(),
                id: row.id,
                shop_id: row.shop_id,
                price: row.price,
                available: row.available,
                city: row.city,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn assemble_products(&self, rows: Vec<ProductRow>) -> RepositoryResult<Vec<ProductDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let design_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.design_id).collect();

        let designs = self.load_designs(&design_ids).await?;
        let mut tags = self.load_tags(TagLink::Product, &ids).await?;
        let mut reviews = self.load_product_reviews(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductDetail {
                tags: tags.remove(&row.id).unwrap_or_default(),
                design: row.design_id.and_then(|id| designs.get(&id).cloned()),
                reviews: reviews.remove(&row.id).unwrap_or_default(),
                id: row.id,
                shop_id: row.shop_id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                is_active: row.is_active,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn load_service_previews(
        &self,
        shop_ids: &[Uuid],
    ) -> RepositoryResult<HashMap<Uuid, Vec<ServicePreview>>> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, shop_id, sub_category_id, design_id, price, available, city, created_at,
                   has_translation, name_en, name_ar, description_en, description_ar
            FROM (
                SELECT sv.id, sv.shop_id, sv.sub_category_id, sv.design_id, sv.price,
                       sv.available, sv.city, sv.created_at,
                       (t.service_id IS NOT NULL) AS has_translation,
                       t.name_en, t.name_ar, t.description_en, t.description_ar,
                       ROW_NUMBER() OVER (PARTITION BY sv.shop_id ORDER BY sv.created_at DESC) AS rn
                FROM services sv
                LEFT JOIN service_translations t ON t.service_id = sv.id
                WHERE sv.shop_id = ANY($1) AND sv.available = TRUE AND sv.deleted_at IS NULL
            ) ranked
            WHERE rn <= $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(shop_ids)
        .bind(SEARCH_SERVICE_PREVIEW)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load service previews"))?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut categories = self.load_categories(&ids).await?;

        Ok(group_by(rows.into_iter().map(|row| {
            let preview = ServicePreview {
                translation: row.translation(),
                categories: categories.remove(&row.id).unwrap_or_default(),
                id: row.id,
                price: row.price,
            };
            (row.shop_id, preview)
        })))
    }
}

#[derive(Debug, Clone, Copy)]
enum TagLink {
    Service,
    Product,
}

#[async_trait]
impl ShopRepository for PgShopRepository {
    async fn active_slug_exists(
        &self,
        slug: &str,
        exclude_id: Option<Uuid>,
    ) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM shops
                WHERE slug = $1 AND deleted_at IS NULL
                  AND ($2::UUID IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("check slug availability"))
    }

    async fn insert_shop(&self, shop: NewShop) -> RepositoryResult<Shop> {
        sqlx::query_as::<_, Shop>(concat!(
            "INSERT INTO shops AS s (owner_id, design_id, name, slug, description, phone, email, \
             website, city, location_lat, location_lon, cover_image, logo_image, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING ",
            shop_columns!()
        ))
        .bind(shop.owner_id)
        .bind(shop.design_id)
        .bind(&shop.name)
        .bind(&shop.slug)
        .bind(&shop.description)
        .bind(&shop.phone)
        .bind(&shop.email)
        .bind(&shop.website)
        .bind(&shop.city)
        .bind(shop.location_lat)
        .bind(shop.location_lon)
        .bind(&shop.cover_image)
        .bind(&shop.logo_image)
        .bind(shop.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &shop.slug, "insert shop"))
    }

    async fn find_shop(&self, id: Uuid) -> RepositoryResult<Option<Shop>> {
        sqlx::query_as::<_, Shop>(concat!(
            "SELECT ",
            shop_columns!(),
            " FROM shops s WHERE s.id = $1 AND s.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find shop"))
    }

    async fn find_owned_shop(&self, id: Uuid, owner_id: Uuid) -> RepositoryResult<Option<Shop>> {
        sqlx::query_as::<_, Shop>(concat!(
            "SELECT ",
            shop_columns!(),
            " FROM shops s WHERE s.id = $1 AND s.owner_id = $2 AND s.deleted_at IS NULL"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find owned shop"))
    }

    async fn find_deleted_owned_shop(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> RepositoryResult<Option<Shop>> {
        sqlx::query_as::<_, Shop>(concat!(
            "SELECT ",
            shop_columns!(),
            " FROM shops s WHERE s.id = $1 AND s.owner_id = $2 AND s.deleted_at IS NOT NULL"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find deleted shop"))
    }

    async fn update_shop(&self, id: Uuid, changes: ShopChanges) -> RepositoryResult<Option<Shop>> {
        let fields = changes.fields;
        let (set_description, description) = clearable(fields.description);
        let (set_phone, phone) = clearable(fields.phone);
        let (set_email, email) = clearable(fields.email);
        let (set_website, website) = clearable(fields.website);
        let (set_cover, cover_image) = clearable(fields.cover_image);
        let (set_logo, logo_image) = clearable(fields.logo_image);
        let slug = changes.slug;

        sqlx::query_as::<_, Shop>(concat!(
            "UPDATE shops AS s SET \
                name = COALESCE($2, s.name), \
                slug = COALESCE($3, s.slug), \
                description = CASE WHEN $4 THEN $5 ELSE s.description END, \
                city = COALESCE($6, s.city), \
                phone = CASE WHEN $7 THEN $8 ELSE s.phone END, \
                email = CASE WHEN $9 THEN $10 ELSE s.email END, \
                website = CASE WHEN $11 THEN $12 ELSE s.website END, \
                cover_image = CASE WHEN $13 THEN $14 ELSE s.cover_image END, \
                logo_image = CASE WHEN $15 THEN $16 ELSE s.logo_image END, \
                is_active = COALESCE($17, s.is_active), \
                updated_at = NOW() \
             WHERE s.id = $1 AND s.deleted_at IS NULL \
             RETURNING ",
            shop_columns!()
        ))
        .bind(id)
        .bind(fields.name)
        .bind(&slug)
        .bind(set_description)
        .bind(description)
        .bind(fields.city)
        .bind(set_phone)
        .bind(phone)
        .bind(set_email)
        .bind(email)
        .bind(set_website)
        .bind(website)
        .bind(set_cover)
        .bind(cover_image)
        .bind(set_logo)
        .bind(logo_image)
        .bind(fields.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, slug.as_deref().unwrap_or_default(), "update shop"))
    }

    async fn soft_delete_shop(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE shops SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("soft delete shop"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn restore_shop(&self, id: Uuid, slug: &str) -> RepositoryResult<Option<Shop>> {
        sqlx::query_as::<_, Shop>(concat!(
            "UPDATE shops AS s SET deleted_at = NULL, slug = $2, updated_at = NOW() \
             WHERE s.id = $1 AND s.deleted_at IS NOT NULL \
             RETURNING ",
            shop_columns!()
        ))
        .bind(id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, slug, "restore shop"))
    }

    async fn find_shop_by_slug(&self, slug: &str) -> RepositoryResult<Option<Shop>> {
        sqlx::query_as::<_, Shop>(concat!(
            "SELECT ",
            shop_columns!(),
            " FROM shops s WHERE s.slug = $1 AND s.deleted_at IS NULL"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find shop by slug"))
    }

    async fn find_owner(&self, owner_id: Uuid) -> RepositoryResult<Option<OwnerProfile>> {
        sqlx::query_as::<_, OwnerProfile>(
            r#"
            SELECT id, name, email, phone, profile_pic, bio, is_verified, verified_badge, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find shop owner"))
    }

    async fn find_address(&self, shop_id: Uuid) -> RepositoryResult<Option<ShopAddress>> {
        sqlx::query_as::<_, ShopAddress>(
            r#"
            SELECT id, shop_id, street, city, region, postal_code, country
            FROM shop_addresses
            WHERE shop_id = $1
            "#,
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("find shop address"))
    }

    async fn find_design(&self, design_id: Uuid) -> RepositoryResult<Option<Design>> {
        sqlx::query_as::<_, Design>("SELECT id, name, slug, description FROM designs WHERE id = $1")
            .bind(design_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("find design"))
    }

    async fn list_shop_services(
        &self,
        shop_id: Uuid,
        filter: &ServiceFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ServiceDetail>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, ServiceRow>(concat!(
            "SELECT sv.id, sv.shop_id, sv.sub_category_id, sv.design_id, sv.price, sv.available, \
             sv.city, sv.created_at, (t.service_id IS NOT NULL) AS has_translation, \
             t.name_en, t.name_ar, t.description_en, t.description_ar ",
            service_filter!(),
            " ORDER BY sv.created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(shop_id)
        .bind(&filter.category)
        .bind(&pattern)
        .bind(page.map(|p| p.limit))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list shop services"))?;

        let total = match page {
            Some(_) => sqlx::query_scalar::<_, i64>(concat!("SELECT COUNT(*) ", service_filter!()))
                .bind(shop_id)
                .bind(&filter.category)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("count shop services"))?,
            None => rows.len() as i64,
        };

        Ok((self.assemble_services(rows).await?, total))
    }

    async fn list_shop_products(
        &self,
        shop_id: Uuid,
        filter: &ProductFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ProductDetail>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT p.id, p.shop_id, p.design_id, p.name, p.description, p.price, p.stock, \
             p.is_active, p.created_at ",
            product_filter!(),
            " ORDER BY p.created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(shop_id)
        .bind(&pattern)
        .bind(filter.in_stock)
        .bind(page.map(|p| p.limit))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list shop products"))?;

        let total = match page {
            Some(_) => sqlx::query_scalar::<_, i64>(concat!("SELECT COUNT(*) ", product_filter!()))
                .bind(shop_id)
                .bind(&pattern)
                .bind(filter.in_stock)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("count shop products"))?,
            None => rows.len() as i64,
        };

        Ok((self.assemble_products(rows).await?, total))
    }

    async fn list_shop_reviews(
        &self,
        shop_id: Uuid,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ReviewWithAuthor>, i64)> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(concat!(
            "SELECT ",
            review_columns!(),
            " FROM reviews r JOIN users u ON u.id = r.author_id \
             WHERE r.shop_id = $1 \
             ORDER BY r.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(shop_id)
        .bind(page.map(|p| p.limit))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list shop reviews"))?;

        let total = match page {
            Some(_) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE shop_id = $1")
                .bind(shop_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err("count shop reviews"))?,
            None => reviews.len() as i64,
        };

        Ok((reviews, total))
    }

    async fn rating_distribution(&self, shop_id: Uuid) -> RepositoryResult<Vec<RatingBucket>> {
        sqlx::query_as::<_, RatingBucket>(
            r#"
            SELECT rating, COUNT(*) AS count
            FROM reviews
            WHERE shop_id = $1
            GROUP BY rating
            ORDER BY rating DESC
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load rating distribution"))
    }

    async fn list_owner_shops(
        &self,
        owner_id: Uuid,
        filter: &OwnerShopFilter,
        page: Option<PageRequest>,
    ) -> RepositoryResult<(Vec<ShopSummary>, i64)> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let is_active = filter.status.is_active();

        let shops = sqlx::query_as::<_, ShopSummary>(concat!(
            "SELECT ",
            shop_columns!(),
            ", ",
            shop_counts!(),
            " ",
            owner_shop_filter!(),
            " ORDER BY s.created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(owner_id)
        .bind(&pattern)
        .bind(is_active)
        .bind(page.map(|p| p.limit))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list owner shops"))?;

        let total = match page {
            Some(_) => {
                sqlx::query_scalar::<_, i64>(concat!("SELECT COUNT(*) ", owner_shop_filter!()))
                    .bind(owner_id)
                    .bind(&pattern)
                    .bind(is_active)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_err("count owner shops"))?
            }
            None => shops.len() as i64,
        };

        Ok((shops, total))
    }

    async fn search_shops(
        &self,
        search: &ShopSearch,
        page: PageRequest,
    ) -> RepositoryResult<(Vec<ShopSearchHit>, i64)> {
        let text = search.text.as_deref().map(like_pattern);
        let city = search.city.as_deref().map(like_pattern);

        let rows = sqlx::query_as::<_, SearchRow>(concat!(
            "SELECT ",
            shop_columns!(),
            ", ",
            shop_counts!(),
            ", u.name AS owner_name, u.profile_pic AS owner_profile_pic, \
             u.is_verified AS owner_is_verified, u.verified_badge AS owner_verified_badge ",
            search_filter!(),
            " ORDER BY s.is_verified DESC, s.created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(&text)
        .bind(&city)
        .bind(&search.category)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("search shops"))?;

        let total = sqlx::query_scalar::<_, i64>(concat!("SELECT COUNT(*) ", search_filter!()))
            .bind(&text)
            .bind(&city)
            .bind(&search.category)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("count search results"))?;

        let shop_ids: Vec<Uuid> = rows.iter().map(|r| r.summary.shop.id).collect();
        let mut previews = if shop_ids.is_empty() {
            HashMap::new()
        } else {
            self.load_service_previews(&shop_ids).await?
        };

        let hits = rows
            .into_iter()
            .map(|row| ShopSearchHit {
                services: previews.remove(&row.summary.shop.id).unwrap_or_default(),
                owner: OwnerSnippet {
                    name: row.owner_name,
                    profile_pic: row.owner_profile_pic,
                    is_verified: row.owner_is_verified,
                    verified_badge: row.owner_verified_badge,
                },
                summary: row.summary,
            })
            .collect();

        Ok((hits, total))
    }

    async fn review_exists(&self, author_id: Uuid, shop_id: Uuid) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE author_id = $1 AND shop_id = $2)",
        )
        .bind(author_id)
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("check existing review"))
    }

    async fn insert_review(&self, review: NewReview) -> RepositoryResult<ReviewWithAuthor> {
        let result = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            WITH r AS (
                INSERT INTO reviews (author_id, shop_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                RETURNING id, author_id, shop_id, service_id, product_id, rating, comment, created_at
            )
            SELECT r.id, r.author_id, r.shop_id, r.service_id, r.product_id, r.rating, r.comment,
                   r.created_at, u.name, u.profile_pic
            FROM r
            JOIN users u ON u.id = r.author_id
            "#,
        )
        .bind(review.author_id)
        .bind(review.shop_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "", "insert review"))?;

        result.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "review author {} has no user record",
                review.author_id
            ))
        })
    }
}

fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        RepositoryError::Database(e)
    }
}

/// Translate unique violations on the known indexes into domain conflicts
fn map_write_error(e: sqlx::Error, slug: &str, context: &'static str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(SLUG_CONSTRAINT) => {
                    tracing::warn!("Slug '{}' taken by a concurrent writer", slug);
                    return RepositoryError::SlugTaken(slug.to_string());
                }
                Some(REVIEW_CONSTRAINT) => return RepositoryError::DuplicateReview,
                _ => {}
            }
        }
    }

    tracing::error!("Failed to {}: {:?}", context, e);
    RepositoryError::Database(e)
}

/// `(apply, value)` pair for a nullable column update
fn clearable(value: Option<Option<String>>) -> (bool, Option<String>) {
    match value {
        Some(v) => (true, v),
        None => (false, None),
    }
}

/// Case-insensitive substring pattern with LIKE wildcards escaped
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn group_by<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> HashMap<K, Vec<V>>
where
    K: Eq + Hash,
{
    let mut grouped: HashMap<K, Vec<V>> = HashMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().push(value);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("pizza"), "%pizza%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_clearable_distinguishes_skip_from_clear() {
        assert_eq!(clearable(None), (false, None));
        assert_eq!(clearable(Some(None)), (true, None));
        assert_eq!(
            clearable(Some(Some("x".to_string()))),
            (true, Some("x".to_string()))
        );
    }

    #[test]
    fn test_group_by_keeps_order_within_key() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let grouped = group_by(vec![(a, 1), (b, 2), (a, 3)]);
        assert_eq!(grouped[&a], vec![1, 3]);
        assert_eq!(grouped[&b], vec![2]);
    }
}
