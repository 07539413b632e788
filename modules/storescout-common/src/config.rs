use std::env;

/// How a stage schedules its per-item fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// One fetch at a time. The safe mode for hosts that rate-limit.
    Sequential,
    /// Bounded worker pool of the given size.
    Pool(usize),
}

/// CSS selectors for every site-specific extraction point.
///
/// These bind to third-party markup and break whenever the sites change;
/// they live here as configuration so stage logic never hardcodes them.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// One listing row per shop.
    pub listing_row: String,
    /// Shop name, relative to a listing row (text).
    pub listing_name: String,
    /// Review count, relative to a listing row (text).
    pub listing_reviews: String,
    /// Detail-page link, relative to a listing row (`href`).
    pub listing_detail_href: String,
    /// "Next page" link on a listing page (`href`).
    pub listing_next_href: String,
    /// Storefront link on a detail page (text).
    pub detail_site_link: String,
    /// Overall rating on a detail page (text).
    pub detail_rating: String,
    /// Positive review counter on a detail page (`data-count`).
    pub detail_positive: String,
    /// Negative review counter on a detail page (`data-count`).
    pub detail_negative: String,
    /// Anchors on a storefront page that may point at the social platform (`href`).
    pub site_social_anchor: String,
    /// Script node on a profile page holding the embedded data payload.
    pub profile_script: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing_row: "table tr".into(),
            listing_name: "th a".into(),
            listing_reviews: "td:nth-of-type(4) a ul li:nth-of-type(2)".into(),
            listing_detail_href: "td:nth-of-type(4) a".into(),
            listing_next_href: "a[rel=next]".into(),
            detail_site_link: "dd.c-pair-list__value a[href*='exit']".into(),
            detail_rating: "span.c-shop-detail-stats__value".into(),
            detail_positive: "#filtr nav ul li:nth-of-type(2) a".into(),
            detail_negative: "#filtr nav ul li:nth-of-type(3) a".into(),
            site_social_anchor: "a[href*='instag']".into(),
            profile_script: "body > script".into(),
        }
    }
}

/// Pipeline configuration with per-stage concurrency modes.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// First directory listing page.
    pub directory_root: String,
    /// Shops per listing page; drives the page budget for a requested count.
    pub shops_per_page: usize,
    /// Prefix the social account id is appended to, e.g. `https://www.instagram.com/`.
    pub profile_url_base: String,
    /// Marker substring identifying social-platform links on storefront pages.
    pub social_link_marker: String,
    /// Body substring identifying a "profile does not exist" page.
    pub profile_not_found_marker: String,
    /// Detail pages hit the same host as the listing; sequential unless opted in.
    pub detail_concurrency: Concurrency,
    /// Storefront sites are independent hosts; pooled by default.
    pub site_concurrency: Concurrency,
    /// The social platform blocks aggressively; sequential unless opted in.
    pub profile_concurrency: Concurrency,
    pub selectors: Selectors,
}

/// Default pool size for detail-page fetches when pooling is opted in.
pub const DETAIL_POOL_SIZE: usize = 10;
/// Default pool size for storefront and profile fetches.
pub const SITE_POOL_SIZE: usize = 30;

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            directory_root: "https://obchody.heureka.cz/".into(),
            shops_per_page: 20,
            profile_url_base: "https://www.instagram.com/".into(),
            social_link_marker: "instag".into(),
            profile_not_found_marker: "Sorry, this page".into(),
            detail_concurrency: Concurrency::Sequential,
            site_concurrency: Concurrency::Pool(SITE_POOL_SIZE),
            profile_concurrency: Concurrency::Sequential,
            selectors: Selectors::default(),
        }
    }
}

impl ScrapeConfig {
    /// Defaults with optional environment overrides for the site endpoints.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(root) = env::var("STORESCOUT_DIRECTORY_ROOT") {
            cfg.directory_root = root;
        }
        if let Ok(base) = env::var("STORESCOUT_PROFILE_URL_BASE") {
            cfg.profile_url_base = base;
        }
        cfg
    }
}
