use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use storescout_common::{ScrapeConfig, SiteResolution};
use storescout_fetch::{Document, HtmlDocument, PageFetcher};

use crate::pool;
use crate::stats::RunStats;

/// Account-id segment after the platform domain: an alphanumeric/dot token
/// of at least three characters, e.g. `shopx` in `instagram.com/shopx/about`.
const ACCOUNT_PATTERN: &str = r"(?:instagram\.com|instagr\.am)/(?P<id>[\w.]{3,})";

/// Scans each shop's own storefront site for a social account handle.
///
/// Storefronts are independent hosts, so this stage pools by default.
pub struct AccountResolver {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
    pattern: Regex,
}

impl AccountResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self {
            fetcher,
            config,
            pattern: Regex::new(ACCOUNT_PATTERN).expect("valid account pattern"),
        }
    }

    /// Exactly one result per input URL. Unreachable sites and pages
    /// without a platform link both resolve to `account: None`; this
    /// stage never fails a batch.
    pub async fn resolve(
        &self,
        site_urls: Vec<String>,
        stats: &mut RunStats,
    ) -> Vec<SiteResolution> {
        let results = pool::map_items(site_urls, self.config.site_concurrency, |site_url| {
            async move {
                let account = self.resolve_one(&site_url).await;
                SiteResolution { site_url, account }
            }
        })
        .await;

        for resolution in &results {
            if resolution.account.is_some() {
                stats.sites_with_account += 1;
            } else {
                stats.sites_without_account += 1;
            }
        }
        results
    }

    async fn resolve_one(&self, site_url: &str) -> Option<String> {
        let page = match self.fetcher.fetch(site_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(site_url, error = %e, "storefront unreachable");
                return None;
            }
        };

        let doc = HtmlDocument::parse(&page.body);
        let hrefs = doc.query_attr_all(&self.config.selectors.site_social_anchor, "href");
        let candidates: Vec<String> = hrefs
            .iter()
            .filter_map(|href| self.pattern.captures(href).map(|c| c["id"].to_string()))
            .collect();

        majority_vote(candidates)
    }
}

/// Most frequent candidate wins; ties break by first-seen order. A page
/// usually links its own profile several times and unrelated accounts
/// once, so frequency favors the page's own handle.
fn majority_vote(candidates: Vec<String>) -> Option<String> {
    let mut tally: Vec<(String, usize)> = Vec::new();
    for candidate in candidates {
        match tally.iter_mut().find(|(id, _)| *id == candidate) {
            Some((_, n)) => *n += 1,
            None => tally.push((candidate, 1)),
        }
    }

    // Replace only on a strictly higher count: with the tally in
    // first-seen order, the earliest of tied candidates wins.
    let mut best: Option<(String, usize)> = None;
    for (id, n) in tally {
        match &best {
            Some((_, best_n)) if *best_n >= n => {}
            _ => best = Some((id, n)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{storefront_html, StaticWeb};

    fn to_strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn majority_wins() {
        assert_eq!(
            majority_vote(to_strings(&["foo", "bar", "foo"])),
            Some("foo".to_string())
        );
    }

    #[test]
    fn tie_breaks_by_first_seen() {
        assert_eq!(
            majority_vote(to_strings(&["foo", "bar"])),
            Some("foo".to_string())
        );
        assert_eq!(
            majority_vote(to_strings(&["bar", "foo", "foo", "bar"])),
            Some("bar".to_string())
        );
    }

    #[test]
    fn no_candidates_resolve_to_none() {
        assert_eq!(majority_vote(Vec::new()), None);
    }

    #[tokio::test]
    async fn resolves_repeated_self_link_over_mentions() {
        let web = Arc::new(StaticWeb::new().page(
            "https://shop-b.example",
            &storefront_html(&[
                "https://www.instagram.com/shopx/",
                "https://www.instagram.com/somecelebrity/",
                "https://instagram.com/shopx?utm=footer",
            ]),
        ));

        let mut stats = RunStats::default();
        let resolver = AccountResolver::new(web, ScrapeConfig::default());
        let results = resolver
            .resolve(vec!["https://shop-b.example".to_string()], &mut stats)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].account.as_deref(), Some("shopx"));
        assert_eq!(stats.sites_with_account, 1);
    }

    #[tokio::test]
    async fn short_ids_and_foreign_links_do_not_match() {
        let web = Arc::new(StaticWeb::new().page(
            "https://shop-a.example",
            &storefront_html(&[
                // Token after the domain is too short to be a handle.
                "https://www.instagram.com/p/",
                "https://myinstagallery.example/shopx",
            ]),
        ));

        let mut stats = RunStats::default();
        let resolver = AccountResolver::new(web, ScrapeConfig::default());
        let results = resolver
            .resolve(vec!["https://shop-a.example".to_string()], &mut stats)
            .await;

        assert_eq!(results[0].account, None);
        assert_eq!(stats.sites_without_account, 1);
    }

    #[tokio::test]
    async fn unreachable_site_yields_empty_resolution() {
        let web = Arc::new(StaticWeb::new());
        let mut stats = RunStats::default();
        let resolver = AccountResolver::new(web, ScrapeConfig::default());
        let results = resolver
            .resolve(vec!["https://gone.example".to_string()], &mut stats)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].site_url, "https://gone.example");
        assert_eq!(results[0].account, None);
    }
}
