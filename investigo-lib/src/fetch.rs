//! HTTP fetching for probes.
//!
//! The engine only sees the `Fetcher` trait. `HttpFetcher` is the real
//! implementation on top of `reqwest`, optionally routed through a SOCKS
//! proxy; tests plug in their own fetchers.

use crate::error::InvestigoError;
use crate::types::ProbeConfig;
use async_trait::async_trait;
use std::time::Duration;

/// One request issued by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Fully substituted URL to GET
    pub url: String,
    /// Route the connection through the proxy
    pub use_proxy: bool,
    /// Upper bound for the whole request, body included
    pub timeout: Duration,
    /// Read and decode the response body
    pub read_body: bool,
}

/// What the classifier gets to see of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code of the final response
    pub status: u16,
    /// URL after following redirects
    pub final_url: String,
    /// Decoded body, present only when the request asked for it
    pub body: Option<String>,
}

impl FetchResponse {
    /// Response with a status and final URL but no body.
    pub fn new<U: Into<String>>(status: u16, final_url: U) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: None,
        }
    }

    /// Attach a body.
    pub fn with_body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Transport abstraction used by the probing engine.
///
/// Any failure to obtain a response (DNS, connect, TLS, timeout, proxy)
/// must be returned as an error; the engine turns it into a per-site
/// transport error result.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, InvestigoError>;
}

/// `reqwest`-backed fetcher.
#[derive(Clone)]
pub struct HttpFetcher {
    /// Client for direct connections
    direct: reqwest::Client,
    /// Client routed through the SOCKS proxy, if one is configured
    proxied: Option<reqwest::Client>,
}

impl HttpFetcher {
    /// Build clients from a run configuration.
    ///
    /// A malformed proxy endpoint is only fatal when the configuration asks
    /// for the proxy to be used.
    pub fn new(config: &ProbeConfig) -> Result<Self, InvestigoError> {
        let direct = Self::client_builder(config).build().map_err(|e| {
            InvestigoError::config(format!("Failed to create HTTP client: {}", e))
        })?;

        let proxied = match Self::build_proxied(config) {
            Ok(client) => client,
            Err(e) if config.use_proxy => return Err(e),
            Err(e) => {
                tracing::warn!("ignoring proxy configuration: {}", e);
                None
            }
        };

        Ok(Self { direct, proxied })
    }

    fn client_builder(config: &ProbeConfig) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
    }

    fn build_proxied(config: &ProbeConfig) -> Result<Option<reqwest::Client>, InvestigoError> {
        let endpoint = config.proxy.trim();
        if endpoint.is_empty() {
            return Ok(None);
        }

        let proxy = reqwest::Proxy::all(remote_dns_endpoint(endpoint)).map_err(|e| {
            InvestigoError::config(format!("Invalid proxy '{}': {}", endpoint, e))
        })?;

        let client = Self::client_builder(config)
            .proxy(proxy)
            .build()
            .map_err(|e| {
                InvestigoError::config(format!("Failed to create proxied HTTP client: {}", e))
            })?;

        Ok(Some(client))
    }

    /// Whether requests can be routed through the proxy.
    pub fn has_proxy(&self) -> bool {
        self.proxied.is_some()
    }
}

/// Resolve hostnames through the proxy instead of locally.
fn remote_dns_endpoint(endpoint: &str) -> String {
    match endpoint.strip_prefix("socks5://") {
        Some(rest) => format!("socks5h://{}", rest),
        None => endpoint.to_string(),
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, InvestigoError> {
        let client = if request.use_proxy {
            self.proxied.as_ref().ok_or_else(|| {
                InvestigoError::transport(&request.url, "proxy requested but none is configured")
            })?
        } else {
            &self.direct
        };

        let response = client
            .get(&request.url)
            .timeout(request.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = if request.read_body {
            Some(response.text().await?)
        } else {
            None
        };

        Ok(FetchResponse {
            status,
            final_url,
            body,
        })
    }
}
