/// Default page size for public shop listings (services, products, reviews, search)
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Default page size for the provider's own shop list
pub const PROVIDER_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number accepted; keeps `(page - 1) * limit` within `i64`
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

// =============================================================================
// SLUG CONSTANTS
// =============================================================================

/// Shortest slug accepted for lookups and uniqueness checks
pub const MIN_SLUG_LEN: usize = 2;

/// Longest slug accepted for lookups
pub const MAX_SLUG_LEN: usize = 100;

/// Candidates tried by the uniqueness search (`base`, `base-1` .. `base-999`)
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Longest derived base slug; leaves room for the `-999` suffix
pub const MAX_BASE_SLUG_LEN: usize = MAX_SLUG_LEN - 4;

/// Writes retried when the store rejects a slug that another writer just took
pub const MAX_SLUG_WRITE_ATTEMPTS: u32 = 5;

// =============================================================================
// SHOP PRESENTATION
// =============================================================================

/// Reviews embedded in the public shop page
pub const PUBLIC_REVIEW_PREVIEW: usize = 10;

/// Services embedded in each search hit
pub const SEARCH_SERVICE_PREVIEW: i64 = 3;
