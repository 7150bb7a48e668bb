//! Live HTTP testing of redirects.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url, header::LOCATION, redirect::Policy};
use serde::Serialize;
use tracing::debug;

use crate::application::services::DispatchService;
use crate::utils::path_normalizer::is_absolute_url;

/// Hops followed before a chain check gives up.
pub const MAX_HOPS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TesterError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Result of probing a single URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub url: String,
    pub status_code: u16,
    /// True iff the status is 3xx and a `Location` header is present.
    pub redirected: bool,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainHop {
    pub from: String,
    pub to: String,
    pub status: u16,
    /// `internal` for a rule from the store, `http` for a network hop.
    pub source: &'static str,
}

/// Result of following a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub redirected: bool,
    pub status_code: Option<u16>,
    pub final_url: String,
    pub chain: Vec<ChainHop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Issues non-following requests against the site.
///
/// No retries: a probe reports what the server answered at that moment.
pub struct TesterService {
    client: Client,
    site_url: String,
    dispatcher: Arc<DispatchService>,
}

impl TesterService {
    /// Creates a new tester.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        site_url: String,
        timeout: Duration,
        dispatcher: Arc<DispatchService>,
    ) -> Result<Self, TesterError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(concat!("redirect-manager/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            site_url,
            dispatcher,
        })
    }

    /// Probes `SITE_URL + path` once. Only site-relative paths are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::InvalidUrl`] for an absolute URL or a malformed
    /// path, and [`TesterError`] if the request fails.
    pub async fn test_url(&self, path: &str) -> Result<TestOutcome, TesterError> {
        let url = self.site_path(path)?;
        let (status, location) = self.probe(url.clone()).await?;

        Ok(TestOutcome {
            url: url.to_string(),
            status_code: status.as_u16(),
            redirected: location.is_some(),
            location,
        })
    }

    /// Follows a redirect chain starting at `url`.
    ///
    /// A matching rule in the store short-circuits the check with a single
    /// `internal` hop and no network call; no hit is counted. Otherwise up to
    /// [`MAX_HOPS`] requests are made. A transport error ends the chain and is
    /// recorded in the report.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::InvalidUrl`] if `url` cannot be parsed.
    pub async fn check_redirect_chain(&self, url: &str) -> Result<ChainReport, TesterError> {
        let start = self.absolute(url)?;

        if let Some(hop) = self.internal_hop(&start).await {
            return Ok(ChainReport {
                redirected: true,
                status_code: Some(hop.status),
                final_url: hop.to.clone(),
                chain: vec![hop],
                error: None,
            });
        }

        let mut current = start;
        let mut chain = Vec::new();
        let mut status_code = None;
        let mut error = None;

        for _ in 0..MAX_HOPS {
            let (status, location) = match self.probe(current.clone()).await {
                Ok(answer) => answer,
                Err(e) => {
                    error = Some(e.to_string());
                    break;
                }
            };
            status_code = Some(status.as_u16());

            let Some(location) = location else {
                break;
            };

            let next = match current.join(&location) {
                Ok(next) => next,
                Err(e) => {
                    error = Some(format!("invalid Location '{}': {}", location, e));
                    break;
                }
            };

            debug!(from = %current, to = %next, status = status.as_u16(), "Redirect hop");
            chain.push(ChainHop {
                from: current.to_string(),
                to: next.to_string(),
                status: status.as_u16(),
                source: "http",
            });
            current = next;
        }

        Ok(ChainReport {
            redirected: !chain.is_empty(),
            status_code,
            final_url: current.to_string(),
            chain,
            error,
        })
    }

    async fn internal_hop(&self, url: &Url) -> Option<ChainHop> {
        let site = Url::parse(&self.site_url).ok()?;
        if url.origin() != site.origin() {
            return None;
        }

        let raw_uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let decision = self.dispatcher.resolve(&raw_uri).await.ok()??;

        Some(ChainHop {
            from: url.to_string(),
            to: decision.location,
            status: decision.status.code(),
            source: "internal",
        })
    }

    /// HEAD request, repeated as GET when the server rejects HEAD.
    async fn probe(&self, url: Url) -> Result<(StatusCode, Option<String>), TesterError> {
        let mut response = self.client.request(Method::HEAD, url.clone()).send().await?;

        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            response = self.client.request(Method::GET, url).send().await?;
        }

        let status = response.status();
        let location = status
            .is_redirection()
            .then(|| response.headers().get(LOCATION))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok((status, location))
    }

    fn site_path(&self, path: &str) -> Result<Url, TesterError> {
        let path = path.trim();
        if is_absolute_url(path) {
            return Err(TesterError::InvalidUrl(format!(
                "{}: expected a site-relative path",
                path
            )));
        }

        let raw = format!(
            "{}/{}",
            self.site_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        parse_url(&raw)
    }

    fn absolute(&self, value: &str) -> Result<Url, TesterError> {
        let value = value.trim();
        if is_absolute_url(value) {
            parse_url(value)
        } else {
            self.site_path(value)
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, TesterError> {
    Url::parse(raw).map_err(|e| TesterError::InvalidUrl(format!("{}: {}", raw, e)))
}
