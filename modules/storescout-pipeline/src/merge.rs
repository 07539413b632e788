use std::collections::HashMap;

use storescout_common::{ShopDetail, ShopRecord, SiteResolution, SocialProfile};

/// Join the three stage outputs into the final relation.
///
/// Inner join of details to resolutions on site URL, then a left outer
/// join to profiles on account id. Left-preserving: every detail row appears in
/// the output exactly once, with None social fields wherever the chain
/// broke. Rows are ordered by site URL, so concurrent completion order
/// never shows through.
pub fn merge(
    details: Vec<ShopDetail>,
    resolutions: &[SiteResolution],
    profiles: &[SocialProfile],
) -> Vec<ShopRecord> {
    let resolution_by_site: HashMap<&str, &SiteResolution> = resolutions
        .iter()
        .map(|r| (r.site_url.as_str(), r))
        .collect();
    let profile_by_account: HashMap<&str, &SocialProfile> =
        profiles.iter().map(|p| (p.account.as_str(), p)).collect();

    let mut records: Vec<ShopRecord> = details
        .into_iter()
        .map(|detail| {
            let account = resolution_by_site
                .get(detail.site_url.as_str())
                .and_then(|r| r.account.clone());
            let metrics = account
                .as_deref()
                .and_then(|a| profile_by_account.get(a))
                .and_then(|p| p.metrics.as_ref());

            ShopRecord {
                name: detail.name,
                review_count: detail.review_count,
                detail_url: detail.detail_url,
                site_url: detail.site_url,
                rating: detail.rating,
                positive_reviews: detail.positive_reviews,
                negative_reviews: detail.negative_reviews,
                account,
                followers: metrics.map(|m| m.followers),
                posts: metrics.map(|m| m.posts),
                average_likes: metrics.and_then(|m| m.average_likes),
                captions: metrics.map(|m| m.captions.clone()),
                profile_raw: metrics.map(|m| m.raw.clone()),
            }
        })
        .collect();

    records.sort_by(|a, b| a.site_url.cmp(&b.site_url));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use storescout_common::ProfileMetrics;

    fn detail(name: &str, site_url: &str) -> ShopDetail {
        ShopDetail {
            name: name.to_string(),
            review_count: 10,
            detail_url: format!("https://directory.example/shop/{name}"),
            site_url: site_url.to_string(),
            rating: 8.5,
            positive_reviews: 9,
            negative_reviews: 1,
        }
    }

    fn resolution(site_url: &str, account: Option<&str>) -> SiteResolution {
        SiteResolution {
            site_url: site_url.to_string(),
            account: account.map(str::to_string),
        }
    }

    fn profile(account: &str, followers: u64) -> SocialProfile {
        SocialProfile {
            account: account.to_string(),
            metrics: Some(ProfileMetrics {
                followers,
                posts: 12,
                average_likes: Some(3.5),
                captions: "a dog".to_string(),
                raw: serde_json::json!({"id": account}),
            }),
        }
    }

    #[test]
    fn every_detail_row_survives() {
        let details = vec![
            detail("a", "https://a.example"),
            detail("b", "https://b.example"),
            detail("c", "https://c.example"),
        ];
        // Only b resolves; only b's profile exists.
        let resolutions = vec![
            resolution("https://a.example", None),
            resolution("https://b.example", Some("shopb")),
        ];
        let profiles = vec![profile("shopb", 777)];

        let records = merge(details, &resolutions, &profiles);

        assert_eq!(records.len(), 3);
        let b = records.iter().find(|r| r.name == "b").unwrap();
        assert_eq!(b.account.as_deref(), Some("shopb"));
        assert_eq!(b.followers, Some(777));
        for name in ["a", "c"] {
            let r = records.iter().find(|r| r.name == name).unwrap();
            assert_eq!(r.account, None);
            assert_eq!(r.followers, None);
            assert_eq!(r.captions, None);
        }
    }

    #[test]
    fn resolved_account_without_profile_keeps_null_metrics() {
        let details = vec![detail("a", "https://a.example")];
        let resolutions = vec![resolution("https://a.example", Some("ghost"))];
        let profiles = vec![SocialProfile {
            account: "ghost".to_string(),
            metrics: None,
        }];

        let records = merge(details, &resolutions, &profiles);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].account.as_deref(), Some("ghost"));
        assert_eq!(records[0].followers, None);
        assert_eq!(records[0].average_likes, None);
    }

    #[test]
    fn output_is_ordered_by_site_url() {
        let details = vec![
            detail("z", "https://z.example"),
            detail("a", "https://a.example"),
            detail("m", "https://m.example"),
        ];
        let records = merge(details, &[], &[]);
        let sites: Vec<&str> = records.iter().map(|r| r.site_url.as_str()).collect();
        assert_eq!(
            sites,
            vec!["https://a.example", "https://m.example", "https://z.example"]
        );
    }
}
