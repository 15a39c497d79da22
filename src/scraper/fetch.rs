//! HTTP fetch layer.
//!
//! [`PoliteFetcher`] wraps any [`Transport`] with the domain group table: hosts
//! outside the allow-list fail closed, every request waits on its group's
//! limiter and carries the group's headers. Nothing is retried.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::FetchError;
use crate::scraper::politeness::{GroupLimiter, PolitenessTable};

/// Raw page download
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &[(&'static str, &'static str)]) -> Result<String, FetchError>;
}

const MAX_REDIRECTS: usize = 10;

/// reqwest-backed transport with a browser User-Agent and a fixed timeout.
/// Redirects are only followed to hosts the politeness table allows.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration, table: &PolitenessTable) -> anyhow::Result<Self> {
        let client = client_builder(user_agent, timeout, table).build()?;
        Ok(Self { client })
    }
}

fn client_builder(user_agent: &str, timeout: Duration, table: &PolitenessTable) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .redirect(redirect_policy(table.clone()))
}

fn redirect_policy(table: PolitenessTable) -> Policy {
    Policy::custom(move |attempt| {
        let allowed = attempt
            .url()
            .host_str()
            .is_some_and(|host| table.group_for(host).is_some());

        if !allowed {
            let reason = format!("redirect to {} is not allowed", attempt.url());
            attempt.error(reason)
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            // Hands back the 3xx, reported as a status error
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, headers: &[(&'static str, &'static str)]) -> Result<String, FetchError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

fn transport_error(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_redirect() {
        // Raised by the redirect policy for a hop off the allow-list
        warn!(url = %url, "Refused redirect: {}", err);
        FetchError::Disallowed {
            url: url.to_string(),
        }
    } else if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: Box::new(err),
        }
    }
}

/// Transport wrapper enforcing the allow-list and per group politeness
pub struct PoliteFetcher<T: Transport> {
    transport: T,
    table: PolitenessTable,
    limiters: HashMap<&'static str, GroupLimiter>,
}

impl<T: Transport> PoliteFetcher<T> {
    pub fn new(transport: T, table: PolitenessTable) -> Self {
        let limiters = table
            .groups()
            .iter()
            .map(|group| (group.name, GroupLimiter::new(group)))
            .collect();

        Self {
            transport,
            table,
            limiters,
        }
    }

    /// Concurrency cap of the named domain group, 1 when unknown
    pub fn max_concurrent(&self, group: &str) -> usize {
        self.table.group(group).map_or(1, |g| g.max_concurrent.max(1))
    }

    /// Name of the domain group serving this URL, if it is allowed at all
    pub fn group_of(&self, url: &str) -> Option<&'static str> {
        let parsed = Url::parse(url).ok()?;
        self.table.group_for(parsed.host_str()?).map(|g| g.name)
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch a page body. Failures are logged here with URL and status.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let result = self.fetch_inner(url).await;
        if let Err(ref e) = result {
            match e.status() {
                Some(status) => warn!(url, status, "Error scraping {}: {}", url, e),
                None => warn!(url, "Error scraping {}: {}", url, e),
            }
        }
        result
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }
        let host = parsed.host_str().ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        let (group, limiter) = self
            .table
            .group_for(host)
            .and_then(|group| self.limiters.get(group.name).map(|limiter| (group, limiter)))
            .ok_or_else(|| FetchError::Disallowed {
                url: url.to_string(),
            })?;

        let permit = limiter.acquire().await.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: Box::new(e),
        })?;

        info!(group = group.name, "Visiting: {}", parsed);
        let result = self.transport.get(&parsed, &group.headers.pairs()).await;

        // The group's delay runs after the response, failed or not
        permit.release().await;
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{GroupOverride, ScraperConfig};
    use crate::scraper::politeness::{DomainGroup, SiteHeaders};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    /// Serves canned pages and records concurrency and headers
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub pages: HashMap<String, Result<String, u16>>,
        pub calls: AtomicUsize,
        active: AtomicUsize,
        pub max_active: AtomicUsize,
        pub seen_headers: Mutex<Vec<(String, Vec<(&'static str, &'static str)>)>>,
        /// Response time; 50ms when unset
        pub latency: Option<Duration>,
        /// (start, end) of every request
        pub timings: Mutex<Vec<(Instant, Instant)>>,
    }

    impl FakeTransport {
        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn with_status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &Url, headers: &[(&'static str, &'static str)]) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            self.seen_headers
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec()));

            let start = Instant::now();
            tokio::time::sleep(self.latency.unwrap_or(Duration::from_millis(50))).await;
            self.timings.lock().unwrap().push((start, Instant::now()));
            self.active.fetch_sub(1, Ordering::SeqCst);

            match self.pages.get(url.as_str()) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Ok(String::from("<html><body></body></html>")),
            }
        }
    }

    /// Table with no delay or jitter so tests only observe concurrency
    pub(crate) fn fast_table() -> PolitenessTable {
        let mut config = ScraperConfig {
            delay_ms: 0,
            ..Default::default()
        };
        for name in ["seek", "linkedin", "indeed"] {
            config.groups.insert(
                name.to_string(),
                GroupOverride {
                    jitter_ms: Some(0),
                    ..Default::default()
                },
            );
        }
        PolitenessTable::from_config(&config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_one() {
        let fetcher = PoliteFetcher::new(FakeTransport::default(), fast_table());

        let urls: Vec<String> = (0..6)
            .map(|i| format!("https://www.linkedin.com/jobs/search/?start={}", i * 25))
            .collect();
        let results = futures::future::join_all(urls.iter().map(|u| fetcher.fetch(u))).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 6);
        assert_eq!(fetcher.transport.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_two() {
        let fetcher = PoliteFetcher::new(FakeTransport::default(), fast_table());

        let urls: Vec<String> = (1..=6)
            .map(|page| format!("https://www.seek.com.au/jobs?page={}", page))
            .collect();
        futures::future::join_all(urls.iter().map(|u| fetcher.fetch(u))).await;

        let max = fetcher.transport.max_active.load(Ordering::SeqCst);
        assert!(max <= 2, "observed {} concurrent requests", max);
    }

    #[tokio::test]
    async fn test_disallowed_domain_is_never_fetched() {
        let fetcher = PoliteFetcher::new(FakeTransport::default(), fast_table());

        let err = fetcher.fetch("https://www.example.com/jobs").await.unwrap_err();
        assert!(matches!(err, FetchError::Disallowed { .. }));

        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));

        let err = fetcher.fetch("ftp://www.seek.com.au/jobs").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));

        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_status_error_passes_through() {
        let url = "https://au.indeed.com/jobs?q=rust";
        let transport = FakeTransport::default().with_status(url, 403);
        let fetcher = PoliteFetcher::new(transport, fast_table());

        let err = fetcher.fetch(url).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(fetcher.transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_site_headers_attached() {
        let fetcher = PoliteFetcher::new(FakeTransport::default(), fast_table());
        fetcher.fetch("https://www.seek.com.au/jobs").await.unwrap();
        fetcher.fetch("https://au.indeed.com/jobs").await.unwrap();

        let seen = fetcher.transport.seen_headers.lock().unwrap();
        assert!(seen[0].1.contains(&("Referer", "https://www.seek.com.au/")));
        assert!(seen[0].1.contains(&("Accept-Language", "en-AU,en;q=0.9")));
        assert!(seen[1].1.contains(&("Origin", "https://au.indeed.com")));
        assert!(seen[1].1.contains(&("Accept-Language", "en-US,en;q=0.9")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_follows_slow_response() {
        let config = ScraperConfig {
            delay_ms: 2000,
            groups: [(
                "linkedin".to_string(),
                GroupOverride {
                    jitter_ms: Some(0),
                    ..Default::default()
                },
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let transport = FakeTransport::default().with_latency(Duration::from_millis(3000));
        let fetcher = PoliteFetcher::new(transport, PolitenessTable::from_config(&config));

        let (a, b) = tokio::join!(
            fetcher.fetch("https://www.linkedin.com/jobs/search/?start=0"),
            fetcher.fetch("https://www.linkedin.com/jobs/search/?start=25"),
        );
        assert!(a.is_ok() && b.is_ok());

        let timings = fetcher.transport.timings.lock().unwrap();
        assert_eq!(timings.len(), 2);
        let gap = timings[1].0 - timings[0].1;
        assert!(gap >= Duration::from_millis(2000), "gap was {:?}", gap);
    }

    #[test]
    fn test_group_of() {
        let fetcher = PoliteFetcher::new(FakeTransport::default(), fast_table());
        assert_eq!(fetcher.group_of("https://au.indeed.com/jobs?q=rust"), Some("indeed"));
        assert_eq!(fetcher.group_of("https://www.seek.com.au/jobs"), Some("seek"));
        assert_eq!(fetcher.group_of("https://www.example.com/jobs"), None);
        assert_eq!(fetcher.group_of("not a url"), None);
    }

    /// Table allowing only the loopback address
    fn loopback_table() -> PolitenessTable {
        PolitenessTable::new(
            vec!["127.0.0.1"],
            vec![DomainGroup {
                name: "loopback",
                domain_glob: "127.0.0.1",
                delay: Duration::ZERO,
                jitter: Duration::ZERO,
                max_concurrent: 1,
                headers: SiteHeaders {
                    referer: "http://127.0.0.1/",
                    origin: "http://127.0.0.1",
                    accept: "text/html",
                    accept_language: "en-AU",
                },
            }],
        )
    }

    /// Minimal HTTP server: `/off-list` redirects to localhost, `/on-list`
    /// redirects back to 127.0.0.1, anything else answers 200.
    async fn serve_redirects(listener: TcpListener, port: u16, paths: Arc<Mutex<Vec<String>>>) {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
            paths.lock().unwrap().push(path.clone());

            let response = match path.as_str() {
                "/off-list" => format!(
                    "HTTP/1.1 302 Found\r\nLocation: http://localhost:{}/x\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    port
                ),
                "/on-list" => format!(
                    "HTTP/1.1 302 Found\r\nLocation: http://127.0.0.1:{}/landing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    port
                ),
                _ => "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 7\r\nConnection: close\r\n\r\nlanding"
                    .to_string(),
            };
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_redirect_off_allow_list_is_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let paths = Arc::new(Mutex::new(Vec::new()));
        tokio::spawn(serve_redirects(listener, port, paths.clone()));

        let table = loopback_table();
        assert!(table.group_for("localhost").is_none());
        let client = client_builder("jobseeker-test", Duration::from_secs(5), &table)
            .no_proxy()
            .build()
            .unwrap();
        let fetcher = PoliteFetcher::new(HttpTransport { client }, table);

        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{}/off-list", port))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Disallowed { .. }));

        let body = fetcher
            .fetch(&format!("http://127.0.0.1:{}/on-list", port))
            .await
            .unwrap();
        assert_eq!(body, "landing");

        let paths = paths.lock().unwrap();
        assert!(!paths.iter().any(|p| p == "/x"), "off-list hop was requested: {:?}", paths);
        assert!(paths.iter().any(|p| p == "/landing"));
    }
}
