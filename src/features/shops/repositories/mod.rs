mod pg_shop_repository;
mod shop_repository;

#[cfg(test)]
pub mod memory_shop_repository;

pub use pg_shop_repository::PgShopRepository;
pub use shop_repository::{RepositoryError, RepositoryResult, ShopChanges, ShopRepository};
