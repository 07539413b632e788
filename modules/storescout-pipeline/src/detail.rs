use std::sync::Arc;

use tracing::warn;

use storescout_common::{ParseError, ScrapeConfig, Selectors, ShopDetail, ShopSummary};
use storescout_fetch::{Document, HtmlDocument, PageFetcher};

use crate::pool;
use crate::stats::RunStats;
use crate::util::{parse_count, parse_decimal};

/// Extends listing summaries with the fields of each shop's detail page.
///
/// Detail pages live on the directory host, so this stage defaults to
/// sequential fetching; `Concurrency::Pool` is available for runs where
/// rate limiting is not a concern.
pub struct DetailEnricher {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
}

impl DetailEnricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self { fetcher, config }
    }

    /// One fetch per summary. A failed enrichment drops that shop from the
    /// output, logged and counted; the batch always completes.
    pub async fn enrich(
        &self,
        summaries: Vec<ShopSummary>,
        stats: &mut RunStats,
    ) -> Vec<ShopDetail> {
        let results = pool::map_items(summaries, self.config.detail_concurrency, |summary| {
            async move {
                let outcome = self.enrich_one(&summary).await;
                (summary, outcome)
            }
        })
        .await;

        let mut details = Vec::with_capacity(results.len());
        for (summary, outcome) in results {
            match outcome {
                Ok(detail) => details.push(detail),
                Err(e) => {
                    warn!(
                        shop = %summary.name,
                        url = %summary.detail_url,
                        error = %e,
                        "detail enrichment failed"
                    );
                    stats.details_failed += 1;
                }
            }
        }
        stats.details_enriched = details.len() as u32;
        details
    }

    async fn enrich_one(&self, summary: &ShopSummary) -> anyhow::Result<ShopDetail> {
        let page = self.fetcher.fetch(&summary.detail_url).await?;
        let doc = HtmlDocument::parse(&page.body);
        let fields = parse_detail_page(&doc, &self.config.selectors)?;

        Ok(ShopDetail {
            name: summary.name.clone(),
            review_count: summary.review_count,
            detail_url: summary.detail_url.clone(),
            site_url: fields.site_url,
            rating: fields.rating,
            positive_reviews: fields.positive,
            negative_reviews: fields.negative,
        })
    }
}

struct DetailFields {
    site_url: String,
    rating: f64,
    positive: u64,
    negative: u64,
}

fn parse_detail_page(
    doc: &dyn Document,
    selectors: &Selectors,
) -> std::result::Result<DetailFields, ParseError> {
    let site_url = doc
        .query(&selectors.detail_site_link)
        .ok_or(ParseError::MissingField("site link"))?;
    let rating_raw = doc
        .query(&selectors.detail_rating)
        .ok_or(ParseError::MissingField("rating"))?;
    let positive_raw = doc
        .query_attr(&selectors.detail_positive, "data-count")
        .ok_or(ParseError::MissingField("positive reviews"))?;
    let negative_raw = doc
        .query_attr(&selectors.detail_negative, "data-count")
        .ok_or(ParseError::MissingField("negative reviews"))?;

    Ok(DetailFields {
        site_url: site_url.trim().to_string(),
        rating: parse_decimal("rating", &rating_raw)?,
        positive: parse_count("positive reviews", &positive_raw)?,
        negative: parse_count("negative reviews", &negative_raw)?,
    })
}
