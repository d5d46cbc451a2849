pub mod auth;
pub mod shops;
