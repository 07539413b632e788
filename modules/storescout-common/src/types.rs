use serde::{Deserialize, Serialize};

/// Lightweight per-shop record extracted from a directory listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopSummary {
    pub name: String,
    pub review_count: u64,
    /// Absolute URL of the shop's directory detail page. Unique within a run.
    pub detail_url: String,
}

/// A summary extended with the fields from the shop's directory detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopDetail {
    pub name: String,
    pub review_count: u64,
    pub detail_url: String,
    /// The shop's own storefront website, as advertised on the detail page.
    pub site_url: String,
    pub rating: f64,
    pub positive_reviews: u64,
    pub negative_reviews: u64,
}

/// Outcome of scanning one storefront site for a social account.
/// The account is a candidate resolution, not guaranteed correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResolution {
    pub site_url: String,
    pub account: Option<String>,
}

/// Engagement data for one social account. `metrics` is None when the
/// profile does not exist or its embedded payload could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialProfile {
    pub account: String,
    pub metrics: Option<ProfileMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMetrics {
    pub followers: u64,
    pub posts: u64,
    /// Mean like count over however many recent posts the profile payload
    /// exposes. Small, unstable sample; None when no posts are visible.
    pub average_likes: Option<f64>,
    /// Post accessibility captions with boilerplate stripped, joined by `;`.
    pub captions: String,
    /// Full embedded profile object, kept as a backup.
    pub raw: serde_json::Value,
}

/// One row of the final merged relation. The directory side is always
/// present; social fields are None when the join chain did not resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopRecord {
    pub name: String,
    pub review_count: u64,
    pub detail_url: String,
    pub site_url: String,
    pub rating: f64,
    pub positive_reviews: u64,
    pub negative_reviews: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_likes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_raw: Option<serde_json::Value>,
}
