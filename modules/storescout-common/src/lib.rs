pub mod config;
pub mod error;
pub mod types;

pub use config::{Concurrency, ScrapeConfig, Selectors, DETAIL_POOL_SIZE, SITE_POOL_SIZE};
pub use error::ParseError;
pub use types::{
    ProfileMetrics, ShopDetail, ShopRecord, ShopSummary, SiteResolution, SocialProfile,
};
