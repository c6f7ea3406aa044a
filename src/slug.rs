use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

pub const PLANT_ROUTE_PREFIX: &str = "/plant/";

/// Public slug for a plant name: lowercase, every whitespace run becomes one `-`.
///
/// The whole string is not trimmed, so `"  Neem   Tree "` gives `"-neem-tree-"`.
/// Links, QR payloads and the resolver fallback scan must all go through here.
pub fn slugify(name: &str) -> String {
    WHITESPACE_RUN_RE
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

/// Percent-decode a requested slug; a segment that does not decode to UTF-8
/// is used raw.
pub fn decode_slug(requested: &str) -> String {
    urlencoding::decode(requested)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| requested.to_string())
}

/// Turn a requested slug back into a name guess for the direct lookup.
pub fn candidate_name(requested: &str) -> String {
    HYPHEN_RUN_RE
        .replace_all(&decode_slug(requested), " ")
        .into_owned()
}

/// Site-relative detail path for a plant name.
pub fn plant_path(name: &str) -> String {
    format!("{}{}", PLANT_ROUTE_PREFIX, slugify(name))
}

/// Value encoded into a plant's QR code.
pub fn qr_payload(base_origin: &str, name: &str) -> String {
    format!("{}{}", base_origin.trim_end_matches('/'), plant_path(name))
}
