use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use storescout_common::{ParseError, ProfileMetrics, ScrapeConfig, SocialProfile};
use storescout_fetch::{Document, HtmlDocument, PageFetcher};

use crate::pool;
use crate::stats::RunStats;

/// Nested location of the profile object inside the embedded payload.
const PROFILE_PAYLOAD_PATH: &str = "/entry_data/ProfilePage/0/graphql/user";

/// Boilerplate the platform prepends to post accessibility captions.
const CAPTION_BOILERPLATE: &str = r"^Image may contain:\s+|No photo description available\.";

/// Fetches each resolved account's profile page and derives engagement
/// metrics from the embedded data payload.
///
/// The platform blocks aggressive clients, so this stage defaults to
/// sequential fetching; `Concurrency::Pool` is available when the risk
/// is acceptable.
pub struct ProfileFetcher {
    fetcher: Arc<dyn PageFetcher>,
    config: ScrapeConfig,
    boilerplate: Regex,
}

impl ProfileFetcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ScrapeConfig) -> Self {
        Self {
            fetcher,
            config,
            boilerplate: Regex::new(CAPTION_BOILERPLATE).expect("valid boilerplate pattern"),
        }
    }

    /// One profile per account id. Nonexistent accounts and unreadable
    /// payloads both yield `metrics: None`; the batch always completes.
    pub async fn fetch_profiles(
        &self,
        accounts: Vec<String>,
        stats: &mut RunStats,
    ) -> Vec<SocialProfile> {
        let results = pool::map_items(accounts, self.config.profile_concurrency, |account| {
            async move {
                let outcome = self.fetch_one(&account).await;
                (account, outcome)
            }
        })
        .await;

        let mut profiles = Vec::with_capacity(results.len());
        for (account, outcome) in results {
            let metrics = match outcome {
                Ok(Some(metrics)) => {
                    stats.profiles_fetched += 1;
                    Some(metrics)
                }
                Ok(None) => {
                    stats.profiles_missing += 1;
                    None
                }
                Err(e) => {
                    warn!(account, error = %e, "profile unreadable");
                    stats.profiles_failed += 1;
                    None
                }
            };
            profiles.push(SocialProfile { account, metrics });
        }
        profiles
    }

    fn profile_url(&self, account: &str) -> String {
        format!("{}{}/", self.config.profile_url_base, account)
    }

    /// `Ok(None)` is the platform's explicit "no such account" page; any
    /// other page without a readable payload is an error for this account.
    async fn fetch_one(&self, account: &str) -> anyhow::Result<Option<ProfileMetrics>> {
        let page = self.fetcher.fetch(&self.profile_url(account)).await?;
        if page.body.contains(&self.config.profile_not_found_marker) {
            return Ok(None);
        }

        let doc = HtmlDocument::parse(&page.body);
        let script = doc
            .query(&self.config.selectors.profile_script)
            .ok_or(ParseError::PayloadMissing)?;
        let user = extract_payload(&script)?;
        Ok(Some(derive_metrics(&self.boilerplate, user)?))
    }
}

/// The payload sits inside wrapper JS; bound it by the first `{` and the
/// last `}` of the script text and parse the span between.
fn extract_payload(script: &str) -> Result<Value, ParseError> {
    let start = script.find('{').ok_or(ParseError::PayloadMissing)?;
    let end = script.rfind('}').ok_or(ParseError::PayloadMissing)?;
    if end < start {
        return Err(ParseError::PayloadMissing);
    }
    let object: Value = serde_json::from_str(&script[start..=end])
        .map_err(|e| ParseError::PayloadJson(e.to_string()))?;
    object
        .pointer(PROFILE_PAYLOAD_PATH)
        .cloned()
        .ok_or(ParseError::PayloadMissing)
}

fn derive_metrics(boilerplate: &Regex, user: Value) -> Result<ProfileMetrics, ParseError> {
    let followers = user
        .pointer("/edge_followed_by/count")
        .and_then(Value::as_u64)
        .ok_or(ParseError::MissingField("followers"))?;
    let posts = user
        .pointer("/edge_owner_to_timeline_media/count")
        .and_then(Value::as_u64)
        .ok_or(ParseError::MissingField("post count"))?;

    let edges = user
        .pointer("/edge_owner_to_timeline_media/edges")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    // Mean over however many recent posts the payload exposes; a small,
    // unstable sample, and None when nothing is visible.
    let likes: Vec<u64> = edges
        .iter()
        .filter_map(|edge| edge.pointer("/node/edge_liked_by/count").and_then(Value::as_u64))
        .collect();
    let average_likes = if likes.is_empty() {
        None
    } else {
        Some(likes.iter().sum::<u64>() as f64 / likes.len() as f64)
    };

    let captions = edges
        .iter()
        .filter_map(|edge| edge.pointer("/node/accessibility_caption").and_then(Value::as_str))
        .map(|caption| boilerplate.replace_all(caption, "").trim().to_string())
        .filter(|caption| !caption.is_empty())
        .collect::<Vec<_>>()
        .join(";");

    Ok(ProfileMetrics {
        followers,
        posts,
        average_likes,
        captions,
        raw: user,
    })
}
