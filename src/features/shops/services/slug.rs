use crate::features::shops::error::{ShopError, ShopResult};
use crate::shared::constants::{MAX_BASE_SLUG_LEN, MAX_SLUG_LEN, MIN_SLUG_LEN};
use crate::shared::validation::{SLUG_REGEX, SLUG_SEPARATOR_REGEX, SLUG_STRIP_REGEX};

/// Derive a URL slug from a display name.
///
/// Only ASCII letters, digits, whitespace, `_` and `-` survive; accented and
/// non-Latin letters are dropped. The result may be empty when the name has
/// no ASCII word characters.
pub fn derive_slug(name: &str) -> ShopResult<String> {
    if name.is_empty() {
        return Err(ShopError::InvalidInput(
            "Name is required to generate a slug".to_string(),
        ));
    }

    let lowered = name.to_lowercase();
    let stripped = SLUG_STRIP_REGEX.replace_all(lowered.trim(), "");
    let joined = SLUG_SEPARATOR_REGEX.replace_all(&stripped, "-");

    Ok(joined.trim_matches('-').to_string())
}

pub fn is_valid_slug(slug: &str) -> bool {
    (MIN_SLUG_LEN..=MAX_SLUG_LEN).contains(&slug.len()) && SLUG_REGEX.is_match(slug)
}

/// Shorten a slug so any `-NNN` suffix keeps it within the maximum length
pub fn fit_base_slug(slug: &str) -> String {
    let mut base = slug.to_string();
    if base.len() > MAX_BASE_SLUG_LEN {
        // derived slugs are ASCII, so any byte index is a char boundary
        base.truncate(MAX_BASE_SLUG_LEN);
    }
    base.trim_end_matches('-').to_string()
}

/// Base slug for a shop name, rejecting names that leave too little to work with
pub fn base_slug_for_name(name: &str) -> ShopResult<String> {
    let base = fit_base_slug(&derive_slug(name)?);
    if base.len() < MIN_SLUG_LEN {
        return Err(ShopError::InvalidInput(format!(
            "Shop name '{}' must contain at least {} latin letters or digits",
            name, MIN_SLUG_LEN
        )));
    }
    Ok(base)
}
