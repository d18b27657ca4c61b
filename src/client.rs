//! HTTP client for the image builder API.

use crate::config::TestConfig;
use crate::error::{LoadTestError, LoadTestResult};
use crate::stats::EndpointKey;
use crate::workload::{self, ComposeRequest, Distribution};
use std::time::{Duration, Instant};

/// Result of a single HTTP request.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Statistics bucket the request belongs to.
    pub key: EndpointKey,
    /// Response time including the full body read.
    pub latency: Duration,
    /// HTTP status code, 0 when the request never completed.
    pub status: u16,
    /// Whether the request counts as a success.
    pub success: bool,
    /// Transport or task-level error, if any.
    pub error: Option<String>,
}

/// Typed client for the image builder endpoints under test.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from the run configuration. When a forward proxy is
    /// configured it is applied to both HTTP and HTTPS traffic, so every
    /// virtual user's requests route through it.
    pub fn new(config: &TestConfig) -> LoadTestResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(config.users as usize);

        if let Some(proxy) = &config.proxy {
            let http_proxy =
                reqwest::Proxy::http(proxy).map_err(|source| LoadTestError::InvalidProxy {
                    url: proxy.clone(),
                    source,
                })?;
            let https_proxy =
                reqwest::Proxy::https(proxy).map_err(|source| LoadTestError::InvalidProxy {
                    url: proxy.clone(),
                    source,
                })?;
            builder = builder.proxy(http_proxy).proxy(https_proxy);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST a compose request.
    pub async fn compose(&self, body: &ComposeRequest) -> Sample {
        let request = self.http.post(self.url("/compose")).json(body);
        self.execute(workload::COMPOSE, request).await.0
    }

    /// Search packages with the fixed query parameters.
    pub async fn search_packages(&self) -> Sample {
        let request = self
            .http
            .get(self.url("/packages"))
            .query(&workload::PACKAGE_SEARCH_QUERY[..]);
        self.execute(workload::PACKAGES, request).await.0
    }

    /// List distributions. A well-formed 2xx response yields the parsed
    /// records; a malformed body downgrades the sample to a failure.
    pub async fn distributions(&self) -> (Sample, Option<Vec<Distribution>>) {
        let request = self.http.get(self.url("/distributions"));
        let (mut sample, body) = self.execute(workload::DISTRIBUTIONS, request).await;
        if !sample.success {
            return (sample, None);
        }
        match workload::parse_distributions(&body) {
            Ok(distributions) => (sample, Some(distributions)),
            Err(err) => {
                sample.success = false;
                sample.error = Some(err.to_string());
                (sample, None)
            }
        }
    }

    /// Fetch architectures for one distribution.
    pub async fn architectures(&self, distribution: &str) -> Sample {
        let request = self.http.get(self.url(&format!("/architectures/{distribution}")));
        self.execute(workload::ARCHITECTURES, request).await.0
    }

    /// Fetch the service version.
    pub async fn version(&self) -> Sample {
        let request = self.http.get(self.url("/version"));
        self.execute(workload::VERSION, request).await.0
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        key: EndpointKey,
        request: reqwest::RequestBuilder,
    ) -> (Sample, Vec<u8>) {
        let start = Instant::now();

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .bytes()
                    .await
                    .map(|bytes| bytes.to_vec())
                    .unwrap_or_default();

                (
                    Sample {
                        key,
                        latency: start.elapsed(),
                        status: status.as_u16(),
                        success: status.is_success(),
                        error: None,
                    },
                    body,
                )
            }
            Err(err) => (
                Sample {
                    key,
                    latency: start.elapsed(),
                    status: 0,
                    success: false,
                    error: Some(err.to_string()),
                },
                Vec::new(),
            ),
        }
    }
}
