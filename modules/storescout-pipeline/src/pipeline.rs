use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

use storescout_common::{ScrapeConfig, ShopRecord};
use storescout_fetch::PageFetcher;

use crate::detail::DetailEnricher;
use crate::listing::DirectoryCrawler;
use crate::merge::merge;
use crate::social::ProfileFetcher;
use crate::stats::RunStats;
use crate::storefront::AccountResolver;

/// Records and counters from one full run.
pub struct RunOutput {
    pub records: Vec<ShopRecord>,
    pub stats: RunStats,
}

/// The composed listing, detail, storefront, profile, and merge run.
///
/// Stages run strictly in sequence, each consuming the previous stage's
/// output; all concurrency lives inside a stage. Every stage fetches
/// through one shared access layer, so overlapping URLs across stages hit
/// the network once.
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self { fetcher, config }
    }

    /// Scrape `shop_count` shops end to end. Fails only when the directory
    /// listing itself is unreachable; every later stage tolerates per-item
    /// failures and reports them through the stats.
    pub async fn run(&self, shop_count: usize) -> Result<RunOutput> {
        let mut stats = RunStats::default();

        let started = Instant::now();
        let crawler = DirectoryCrawler::new(self.fetcher.clone(), self.config.clone());
        let summaries = crawler.list_shops(shop_count, &mut stats).await?;
        stats.shops_listed = summaries.len() as u32;
        stats.listing_time = started.elapsed();
        info!(
            shops = summaries.len(),
            elapsed_s = stats.listing_time.as_secs_f64(),
            "listing stage complete"
        );

        let started = Instant::now();
        let enricher = DetailEnricher::new(self.fetcher.clone(), self.config.clone());
        let details = enricher.enrich(summaries, &mut stats).await;
        stats.detail_time = started.elapsed();
        info!(
            details = details.len(),
            failed = stats.details_failed,
            elapsed_s = stats.detail_time.as_secs_f64(),
            "detail stage complete"
        );

        let started = Instant::now();
        let resolver = AccountResolver::new(self.fetcher.clone(), self.config.clone());
        let site_urls: Vec<String> = details.iter().map(|d| d.site_url.clone()).collect();
        let resolutions = resolver.resolve(site_urls, &mut stats).await;
        stats.site_time = started.elapsed();
        info!(
            resolved = stats.sites_with_account,
            elapsed_s = stats.site_time.as_secs_f64(),
            "storefront stage complete"
        );

        let started = Instant::now();
        let profile_fetcher = ProfileFetcher::new(self.fetcher.clone(), self.config.clone());
        let accounts: Vec<String> = resolutions
            .iter()
            .filter_map(|r| r.account.clone())
            .collect();
        let profiles = profile_fetcher.fetch_profiles(accounts, &mut stats).await;
        stats.profile_time = started.elapsed();
        info!(
            profiles = profiles.len(),
            missing = stats.profiles_missing,
            elapsed_s = stats.profile_time.as_secs_f64(),
            "social profile stage complete"
        );

        let records = merge(details, &resolutions, &profiles);
        Ok(RunOutput { records, stats })
    }
}
