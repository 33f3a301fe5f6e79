use url::Url;

use crate::ItemId;

/// Derive the stable identity of a thread from its URL.
///
/// Forum thread URLs end in a slug whose last dash-separated token is the
/// thread number (`/some-deal-title-2654321/`). Query and fragment are
/// ignored, so `?sd=d` style variants map to the same identity.
pub fn item_id_from_url(url: &str) -> Option<ItemId> {
    let parsed = parse_lenient(url.trim())?;
    let segment = parsed
        .path_segments()?
        .rfind(|segment| !segment.is_empty())?;
    let id = segment.rsplit('-').next().unwrap_or(segment);
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Page number encoded as trailing `<digits>/` in a listing URL.
pub fn page_number_from_url(url: &str) -> Option<u32> {
    let without_slash = url.strip_suffix('/')?;
    let digits_start = without_slash
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .len();
    let digits = &without_slash[digits_start..];
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn parse_lenient(url: &str) -> Option<Url> {
    if url.is_empty() {
        return None;
    }
    match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse("http://localhost/").ok()?;
            base.join(url).ok()
        }
        Err(_) => None,
    }
}
