//! In-memory web for tests: canned pages keyed by URL, plus builders for
//! the directory/storefront/profile fixture markup the default selectors
//! expect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use storescout_fetch::{FetchError, FetchedPage, PageFetcher, Result};

/// Stand-in for the live web. Unknown URLs fail the way an unreachable
/// host eventually does, so stages' failure paths are exercisable.
#[derive(Default)]
pub struct StaticWeb {
    pages: HashMap<String, (u16, String)>,
    hits: Mutex<HashMap<String, u32>>,
}

impl StaticWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), (200, body.to_string()));
        self
    }

    pub fn page_with_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// How many times `url` was requested.
    pub fn hits(&self, url: &str) -> u32 {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for StaticWeb {
    async fn fetch(&self, url: &str) -> Result<Arc<FetchedPage>> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        match self.pages.get(url) {
            Some((status, body)) => Ok(Arc::new(FetchedPage {
                url: url.to_string(),
                status: *status,
                body: body.clone(),
            })),
            None => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts: 1,
                message: "no route to host".to_string(),
            }),
        }
    }
}

/// One listing page: `(name, detail_href, review_text)` rows plus an
/// optional next link. Includes a header row, which real listings have
/// and the crawler must skip.
pub fn listing_page_html(rows: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut rows_html = String::from("<tr><th>Shop</th><th>Reviews</th></tr>");
    for (name, detail_href, reviews) in rows {
        rows_html.push_str(&format!(
            "<tr>\
               <th><a href=\"{detail_href}\">{name}</a></th>\
               <td>certified</td><td>4.5</td><td>98%</td>\
               <td><a href=\"{detail_href}\"><ul><li>rating</li><li>{reviews}</li></ul></a></td>\
             </tr>"
        ));
    }
    let next_html = next
        .map(|href| format!("<a rel=\"next\" href=\"{href}\">Next</a>"))
        .unwrap_or_default();
    format!(
        "<html><body><div><table>{rows_html}</table></div><nav><ol>{next_html}</ol></nav></body></html>"
    )
}

/// A shop detail page carrying the storefront link, rating, and the two
/// labeled review counters.
pub fn detail_page_html(site_url: &str, rating: &str, positive: &str, negative: &str) -> String {
    format!(
        "<html><body>\
         <aside><dl><dt>Website</dt><dd class=\"c-pair-list__value\">\
           <a href=\"https://directory.example/exit?url={site_url}\">{site_url}</a>\
         </dd></dl>\
         <section><span class=\"c-shop-detail-stats__value\">{rating}</span></section></aside>\
         <div id=\"filtr\"><div><nav><ul>\
           <li><a href=\"#\" data-count=\"999\">All</a></li>\
           <li><a href=\"#\" data-count=\"{positive}\">Positive</a></li>\
           <li><a href=\"#\" data-count=\"{negative}\">Negative</a></li>\
         </ul></nav></div></div>\
         </body></html>"
    )
}

/// A storefront page with the given anchors somewhere in its body.
pub fn storefront_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">Follow us</a>"))
        .collect();
    format!("<html><body><main><p>Welcome to our shop.</p>{anchors}</main></body></html>")
}

/// A profile page embedding `payload_json` the way the platform does:
/// inside a script node, wrapped in non-JSON assignment code.
pub fn profile_page_html(payload_json: &str) -> String {
    format!("<html><body><script>window._sharedData = {payload_json};</script></body></html>")
}

/// The platform's "no such account" page.
pub fn profile_not_found_html() -> String {
    "<html><body><h2>Sorry, this page isn't available.</h2></body></html>".to_string()
}

/// Embedded profile payload with the nested shape the social stage
/// navigates. `captions` align with `post_likes` by index.
pub fn profile_payload(followers: u64, posts: u64, post_likes: &[u64], captions: &[&str]) -> String {
    let edges: Vec<serde_json::Value> = post_likes
        .iter()
        .enumerate()
        .map(|(i, likes)| {
            serde_json::json!({
                "node": {
                    "edge_liked_by": {"count": likes},
                    "accessibility_caption": captions.get(i).copied().unwrap_or(""),
                }
            })
        })
        .collect();

    serde_json::json!({
        "entry_data": {
            "ProfilePage": [{
                "graphql": {
                    "user": {
                        "edge_followed_by": {"count": followers},
                        "edge_owner_to_timeline_media": {"count": posts, "edges": edges},
                    }
                }
            }]
        }
    })
    .to_string()
}
