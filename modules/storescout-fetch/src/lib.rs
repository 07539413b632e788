pub mod cache;
pub mod document;
pub mod error;

pub use cache::PageCache;
pub use document::{Document, HtmlDocument};
pub use error::{FetchError, Result};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use tracing::{debug, warn};

/// One successfully transported response. Non-2xx statuses are not errors
/// at this layer: downstream stages may need the body of an error page
/// (the social platform serves its "page not found" marker with a 404).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// The pipeline's view of the access layer. Stages fetch through this
/// seam; tests substitute an in-memory web.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Arc<FetchedPage>>;
}

/// Access-layer knobs. `Default` matches the production scrape profile.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request deadline.
    pub timeout: Duration,
    /// Attempt budget per URL.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Verify the TLS trust chain. Disable only when debugging through proxies.
    pub verify_tls: bool,
    /// Upstream proxies, one chosen uniformly at random per attempt.
    pub proxies: Vec<String>,
    /// Suppress the per-attempt debug notification.
    pub quiet: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 5,
            retry_delay: Duration::from_secs(10),
            verify_tls: true,
            proxies: Vec::new(),
            quiet: false,
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/73.0.3683.86 Safari/537.36",
        ),
    );
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,\
             image/apng,*/*;q=0.8,application/signed-exchange;v=b3",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en,cs;q=0.9,sk;q=0.8,en-GB;q=0.7,en-US;q=0.6"),
    );
    headers
}

/// Retrying, memoizing HTTP client with a browser-mimicking header set.
///
/// Every stage of a run shares one instance, so a URL requested by two
/// stages is fetched from the network exactly once.
pub struct FetchClient {
    /// One client per proxy; a single direct client when no proxies are set.
    /// reqwest binds proxies at build time, so rotation pre-builds the pool.
    clients: Vec<reqwest::Client>,
    config: FetchConfig,
    cache: PageCache,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Self {
        let build = |proxy: Option<&str>| {
            let mut builder = reqwest::Client::builder()
                .timeout(config.timeout)
                .default_headers(browser_headers())
                .danger_accept_invalid_certs(!config.verify_tls);
            if let Some(proxy) = proxy {
                builder = builder.proxy(reqwest::Proxy::all(proxy).expect("valid proxy url"));
            }
            builder.build().expect("Failed to build HTTP client")
        };

        let clients = if config.proxies.is_empty() {
            vec![build(None)]
        } else {
            config.proxies.iter().map(|p| build(Some(p.as_str()))).collect()
        };

        Self {
            clients,
            config,
            cache: PageCache::new(),
        }
    }

    fn pick_client(&self) -> &reqwest::Client {
        if self.clients.len() == 1 {
            return &self.clients[0];
        }
        &self.clients[rand::rng().random_range(0..self.clients.len())]
    }

    async fn attempt(&self, url: &str) -> std::result::Result<FetchedPage, reqwest::Error> {
        let resp = self.pick_client().get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchedPage {
            url: url.to_string(),
            status,
            body,
        })
    }

    async fn fetch_with_retries(&self, url: &str) -> Result<Arc<FetchedPage>> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if !self.config.quiet {
                debug!(url, attempt, "fetching");
            }
            match self.attempt(url).await {
                Ok(page) => return Ok(Arc::new(page)),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < attempts {
                        warn!(url, attempt, error = %last_error, "fetch attempt failed, backing off");
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            message: last_error,
        })
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch(&self, url: &str) -> Result<Arc<FetchedPage>> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.cache
            .get_or_fetch(url, || self.fetch_with_retries(url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_ok(stream: &mut tokio::net::TcpStream, body: &str) {
        let mut buf = [0u8; 2048];
        let _ = stream.read(&mut buf).await;
        let resp = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(resp.as_bytes()).await.unwrap();
    }

    fn test_config(max_retries: u32) -> FetchConfig {
        FetchConfig {
            max_retries,
            retry_delay: Duration::from_millis(10),
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn retry_recovers_after_transient_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // Two connections dropped before a response, then a real one.
            for _ in 0..2 {
                let (stream, _) = listener.accept().await.unwrap();
                drop(stream);
            }
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_ok(&mut stream, "<html><body>recovered</body></html>").await;
        });

        let client = FetchClient::new(test_config(3));
        let page = client.fetch(&format!("http://{addr}/")).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.body.contains("recovered"));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                drop(stream);
            }
        });

        let client = FetchClient::new(test_config(2));
        let err = client.fetch(&format!("http://{addr}/")).await.unwrap_err();
        match err {
            FetchError::Exhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_returns_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            let body = "<html><body>Sorry, this page isn't available.</body></html>";
            let resp = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(resp.as_bytes()).await.unwrap();
        });

        let client = FetchClient::new(test_config(1));
        let page = client.fetch(&format!("http://{addr}/")).await.unwrap();
        assert_eq!(page.status, 404);
        assert!(page.body.contains("Sorry, this page"));
    }

    #[tokio::test]
    async fn repeat_fetch_is_served_from_cache() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // A single-shot server: any second network fetch would hang or fail.
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_ok(&mut stream, "<html><body>once</body></html>").await;
        });

        let client = FetchClient::new(test_config(1));
        let url = format!("http://{addr}/");
        let first = client.fetch(&url).await.unwrap();
        let second = client.fetch(&url).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_up_front() {
        let client = FetchClient::new(test_config(1));
        let err = client.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
