use crate::slug::PLANT_ROUTE_PREFIX;

/// Public pages of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Listing,
    Plant(String),
    Unknown(String),
}

impl Route {
    /// Match a site path such as `/` or `/plant/holy-basil`.
    ///
    /// Any single segment after `/plant/` is accepted as a slug, canonical or not.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if path.is_empty() || path == "/" {
            return Route::Listing;
        }
        match path.strip_prefix(PLANT_ROUTE_PREFIX) {
            Some(slug) if !slug.is_empty() && !slug.contains('/') => Route::Plant(slug.to_string()),
            _ => Route::Unknown(path.to_string()),
        }
    }

    /// Like [`Route::parse`], also accepting absolute URLs on `base_origin`
    /// (for instance a scanned QR payload).
    pub fn from_target(base_origin: &str, target: &str) -> Route {
        let origin = base_origin.trim_end_matches('/');
        match target.strip_prefix(origin) {
            Some(rest) if !origin.is_empty() => Route::parse(rest),
            _ => Route::parse(target),
        }
    }
}
