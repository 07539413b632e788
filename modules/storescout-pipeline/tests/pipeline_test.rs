//! End-to-end runs over an in-memory web.

use std::sync::Arc;

use storescout_common::ScrapeConfig;
use storescout_pipeline::testing::{
    detail_page_html, listing_page_html, profile_not_found_html, profile_page_html,
    profile_payload, storefront_html, StaticWeb,
};
use storescout_pipeline::Pipeline;

fn config() -> ScrapeConfig {
    ScrapeConfig {
        directory_root: "https://directory.example/".to_string(),
        ..ScrapeConfig::default()
    }
}

#[tokio::test]
async fn run_with_broken_social_chain_keeps_every_shop() {
    // One listing page with two shops. Shop A's storefront has no social
    // links; Shop B's resolves to "shopx", whose profile turns out not to
    // exist. Both shops must still come out of the merge.
    let web = StaticWeb::new()
        .page(
            "https://directory.example/",
            &listing_page_html(
                &[("Shop A", "/shop/a", "150"), ("Shop B", "/shop/b", "80")],
                None,
            ),
        )
        .page(
            "https://directory.example/shop/a",
            &detail_page_html("https://shop-a.example", "4,7", "120", "5"),
        )
        .page(
            "https://directory.example/shop/b",
            &detail_page_html("https://shop-b.example", "9,1", "44", "2"),
        )
        .page("https://shop-a.example", &storefront_html(&[]))
        .page(
            "https://shop-b.example",
            &storefront_html(&["https://www.instagram.com/shopx/"]),
        )
        .page_with_status(
            "https://www.instagram.com/shopx/",
            404,
            &profile_not_found_html(),
        );

    let pipeline = Pipeline::new(Arc::new(web), config());
    let output = pipeline.run(2).await.unwrap();

    assert_eq!(output.records.len(), 2);

    let a = output.records.iter().find(|r| r.name == "Shop A").unwrap();
    assert_eq!(a.rating, 4.7);
    assert_eq!(a.account, None);
    assert_eq!(a.followers, None);

    let b = output.records.iter().find(|r| r.name == "Shop B").unwrap();
    assert_eq!(b.account.as_deref(), Some("shopx"));
    assert_eq!(b.followers, None);
    assert_eq!(b.average_likes, None);

    assert_eq!(output.stats.shops_listed, 2);
    assert_eq!(output.stats.sites_with_account, 1);
    assert_eq!(output.stats.profiles_missing, 1);
}

#[tokio::test]
async fn run_with_live_profile_carries_metrics_through_merge() {
    let web = StaticWeb::new()
        .page(
            "https://directory.example/",
            &listing_page_html(&[("Shop B", "/shop/b", "80")], None),
        )
        .page(
            "https://directory.example/shop/b",
            &detail_page_html("https://shop-b.example", "9,1", "44", "2"),
        )
        .page(
            "https://shop-b.example",
            &storefront_html(&[
                "https://www.instagram.com/shopx/",
                "https://www.instagram.com/influencer.we.once.mentioned/",
                "https://instagram.com/shopx",
            ]),
        )
        .page(
            "https://www.instagram.com/shopx/",
            &profile_page_html(&profile_payload(
                2500,
                40,
                &[10, 30],
                &["Image may contain: candles", "a shelf of mugs"],
            )),
        );

    let pipeline = Pipeline::new(Arc::new(web), config());
    let output = pipeline.run(1).await.unwrap();

    assert_eq!(output.records.len(), 1);
    let record = &output.records[0];
    assert_eq!(record.account.as_deref(), Some("shopx"));
    assert_eq!(record.followers, Some(2500));
    assert_eq!(record.posts, Some(40));
    assert_eq!(record.average_likes, Some(20.0));
    assert_eq!(record.captions.as_deref(), Some("candles;a shelf of mugs"));
    assert!(record.profile_raw.is_some());
}

#[tokio::test]
async fn shared_access_layer_would_deduplicate_overlapping_urls() {
    // Two shops pointing at the same storefront: the storefront stage asks
    // for that URL twice. With the real client the cache collapses this to
    // one network fetch; the fake web records both requests, which is what
    // the left-preserving merge still has to cope with.
    let web = Arc::new(
        StaticWeb::new()
            .page(
                "https://directory.example/",
                &listing_page_html(
                    &[("Shop A", "/shop/a", "10"), ("Shop B", "/shop/b", "20")],
                    None,
                ),
            )
            .page(
                "https://directory.example/shop/a",
                &detail_page_html("https://shared.example", "7,0", "1", "0"),
            )
            .page(
                "https://directory.example/shop/b",
                &detail_page_html("https://shared.example", "7,5", "2", "0"),
            )
            .page("https://shared.example", &storefront_html(&[])),
    );

    let pipeline = Pipeline::new(web.clone(), config());
    let output = pipeline.run(2).await.unwrap();

    // Both detail rows share a site URL; the merge still emits one row per
    // detail row.
    assert_eq!(output.records.len(), 2);
    assert_eq!(web.hits("https://shared.example"), 2);
}
