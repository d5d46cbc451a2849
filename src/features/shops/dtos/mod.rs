mod review_dto;
mod shop_dto;

pub use review_dto::*;
pub use shop_dto::*;
