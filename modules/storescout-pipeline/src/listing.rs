use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

use storescout_common::{ParseError, ScrapeConfig, Selectors, ShopSummary};
use storescout_fetch::{Document, HtmlDocument, PageFetcher};

use crate::stats::RunStats;
use crate::util::parse_count;

/// Walks the directory's paginated listing and collects per-shop summaries.
pub struct DirectoryCrawler {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
}

impl DirectoryCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self { fetcher, config }
    }

    /// Collect `count` shop summaries. Pages are over-fetched to a budget
    /// of `count / shops_per_page + 1` and the result truncated, so the
    /// last page's surplus rows never leak downstream. An unreachable
    /// listing page is fatal: without the listing there is no run.
    pub async fn list_shops(&self, count: usize, stats: &mut RunStats) -> Result<Vec<ShopSummary>> {
        let budget = count / self.config.shops_per_page + 1;
        let mut summaries: Vec<ShopSummary> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut next =
            Url::parse(&self.config.directory_root).context("invalid directory root URL")?;

        info!(root = %next, budget, "walking directory listing");

        for _ in 0..budget {
            let page = self
                .fetcher
                .fetch(next.as_str())
                .await
                .with_context(|| format!("listing page {next} unreachable"))?;
            let doc = HtmlDocument::parse(&page.body);

            let (rows, skipped) = parse_listing_page(&doc, &next, &self.config.selectors);
            stats.listing_pages += 1;
            stats.listing_rows_skipped += skipped;
            // Detail URL is the summary key; a row repeated across page
            // boundaries keeps its first occurrence.
            for row in rows {
                if seen.insert(row.detail_url.clone()) {
                    summaries.push(row);
                }
            }

            match doc.query_attr(&self.config.selectors.listing_next_href, "href") {
                Some(href) => match next.join(&href) {
                    Ok(url) => next = url,
                    Err(e) => {
                        warn!(href, error = %e, "unresolvable next link, stopping pagination");
                        break;
                    }
                },
                None => break,
            }
        }

        summaries.truncate(count);
        info!(
            shops = summaries.len(),
            pages = stats.listing_pages,
            "directory listing complete"
        );
        Ok(summaries)
    }
}

/// Extract every shop row from one listing page. Malformed rows are
/// skipped and counted, never fatal.
fn parse_listing_page(
    doc: &dyn Document,
    base: &Url,
    selectors: &Selectors,
) -> (Vec<ShopSummary>, u32) {
    let mut rows = Vec::new();
    let mut skipped = 0;
    for fragment in doc.fragments(&selectors.listing_row) {
        match parse_listing_row(fragment.as_ref(), base, selectors) {
            Ok(summary) => rows.push(summary),
            Err(e) => {
                warn!(error = %e, "skipping malformed listing row");
                skipped += 1;
            }
        }
    }
    (rows, skipped)
}

fn parse_listing_row(
    row: &dyn Document,
    base: &Url,
    selectors: &Selectors,
) -> std::result::Result<ShopSummary, ParseError> {
    let name = row
        .query(&selectors.listing_name)
        .ok_or(ParseError::MissingField("name"))?;
    let reviews_raw = row
        .query(&selectors.listing_reviews)
        .ok_or(ParseError::MissingField("review count"))?;
    let href = row
        .query_attr(&selectors.listing_detail_href, "href")
        .ok_or(ParseError::MissingField("detail link"))?;
    let detail_url = base
        .join(&href)
        .map_err(|_| ParseError::MissingField("detail link"))?;

    Ok(ShopSummary {
        name,
        review_count: parse_count("review count", &reviews_raw)?,
        detail_url: detail_url.to_string(),
    })
}
