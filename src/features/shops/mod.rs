//! Shop directory
//!
//! Shops are addressed publicly by a slug derived from their name. Slugs are
//! unique among shops that are not soft-deleted.
//!
//! | Method | Path                                   | Auth   |
//! |--------|----------------------------------------|--------|
//! | POST   | `/api/shops`                           | bearer |
//! | PUT    | `/api/shops/{id}`                      | owner  |
//! | DELETE | `/api/shops/{id}`                      | owner  |
//! | POST   | `/api/shops/{id}/restore`              | owner  |
//! | POST   | `/api/shops/{id}/reviews`              | bearer |
//! | GET    | `/api/shops/provider`                  | bearer |
//! | GET    | `/api/shops/my-shops`                  | bearer |
//! | GET    | `/api/shops/search`                    | none   |
//! | GET    | `/api/shops/public/{slug}`             | none   |
//! | GET    | `/api/shops/public/{slug}/services`    | none   |
//! | GET    | `/api/shops/public/{slug}/products`    | none   |
//! | GET    | `/api/shops/public/{slug}/reviews`     | none   |
//!
//! Requests from anyone but the owner are answered with 404, never 403.

pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use error::{ShopError, ShopResult};
pub use repositories::{PgShopRepository, ShopRepository};
pub use services::ShopService;
