use thiserror::Error;

use crate::features::shops::repositories::RepositoryError;

/// Errors raised by the shop directory, independent of any transport
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Every candidate from `base` to `base-{attempts - 1}` is taken
    #[error("No free slug for '{base}' after {attempts} attempts")]
    SlugExhausted { base: String, attempts: u32 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ShopResult<T> = std::result::Result<T, ShopError>;
