mod public_handler;
mod review_handler;
mod shop_handler;

pub use public_handler::*;
pub use review_handler::*;
pub use shop_handler::*;
