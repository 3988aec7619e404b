use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DrtvError, DrtvResult};

static DRTV_URL_REGEXP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.dr\.dk/drtv/(se|episode|saeson|serie|program)/[a-zA-Z0-9\-_]+_\d+$")
        .unwrap()
});

/// Checks that a URL points at a DR TV title, season or series page.
pub fn is_valid_drtv_url(url: &str) -> bool {
    DRTV_URL_REGEXP.is_match(url)
}

/// Splits the trailing `{display_id}_{item_id}` path segment of a DR TV URL.
pub fn extract_ids(url: &str) -> DrtvResult<(String, String)> {
    let last_segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    let (display_id, item_id) = last_segment
        .rsplit_once('_')
        .ok_or_else(|| DrtvError::InvalidUrl(url.to_string()))?;
    log::debug!("Extracted display_id: {display_id}, item_id: {item_id}");
    Ok((display_id.to_string(), item_id.to_string()))
}
