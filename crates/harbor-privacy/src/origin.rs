//! Origin derivation

use url::Url;

use crate::error::PrivacyError;
use crate::Result;

/// Serialized origin (`scheme://host[:port]`) of a page URL. Passing an
/// origin returns it in canonical form.
pub fn origin_of(page_url: &str) -> Result<String> {
    let parsed =
        Url::parse(page_url.trim()).map_err(|_| PrivacyError::InvalidOrigin(page_url.to_string()))?;

    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(PrivacyError::InvalidOrigin(page_url.to_string()));
    }

    Ok(origin.ascii_serialization())
}
