//! Core data types for probing handles.
//!
//! This module defines the site definitions read from the catalog, the
//! per-site results handed to consumers, and the run configuration shared
//! read-only by every probe task.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User agent sent with every probe.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.87 Safari/537.36";

/// SOCKS endpoint of a locally running Tor client.
pub const DEFAULT_PROXY: &str = "socks5://127.0.0.1:9050";

/// Default number of probes allowed in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How a site signals that a profile does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorStrategy {
    /// Missing profiles answer with an error status code
    StatusCode,

    /// Missing profiles render a page containing one of these texts
    MessageContains(Vec<String>),

    /// Missing profiles redirect away from the profile URL
    ResponseUrl,

    /// A strategy name this version does not implement
    Unsupported(String),
}

impl ErrorStrategy {
    /// Parse the catalog's `errorType` name.
    ///
    /// `messages` is only consulted for the `message` strategy. Without any
    /// message the empty string is used, which every body contains, so such
    /// a site never reports a profile.
    pub fn from_catalog(error_type: &str, mut messages: Vec<String>) -> Self {
        match error_type {
            "status_code" => Self::StatusCode,
            "message" => {
                if messages.is_empty() {
                    messages.push(String::new());
                }
                Self::MessageContains(messages)
            }
            "response_url" => Self::ResponseUrl,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Convenience constructor for a single error message.
    pub fn message<M: Into<String>>(text: M) -> Self {
        Self::MessageContains(vec![text.into()])
    }

    /// Whether the classifier needs the response body for this strategy.
    pub fn needs_body(&self) -> bool {
        matches!(self, Self::MessageContains(_))
    }
}

impl std::fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorStrategy::StatusCode => write!(f, "status_code"),
            ErrorStrategy::MessageContains(_) => write!(f, "message"),
            ErrorStrategy::ResponseUrl => write!(f, "response_url"),
            ErrorStrategy::Unsupported(name) => write!(f, "{}", name),
        }
    }
}

/// Probe definition for one site in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProbe {
    /// Unique site name (e.g., "GitHub")
    pub name: String,

    /// Profile URL template shown to the user, with a `{}` placeholder
    pub display_url: String,

    /// URL template actually fetched, when it differs from `display_url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    /// Rule used to decide existence from the response
    pub strategy: ErrorStrategy,

    /// Home page of the site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_url: Option<String>,

    /// Page a missing profile redirects to, when the site documents one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_url: Option<String>,

    /// A handle known to exist on the site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_claimed: Option<String>,

    /// A handle known not to exist on the site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_unclaimed: Option<String>,
}

impl SiteProbe {
    /// Create a site with the given name, display template and strategy.
    pub fn new<N: Into<String>, U: Into<String>>(
        name: N,
        display_url: U,
        strategy: ErrorStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            display_url: display_url.into(),
            probe_url: None,
            strategy,
            main_url: None,
            error_url: None,
            username_claimed: None,
            username_unclaimed: None,
        }
    }

    /// Set a separate URL template to fetch.
    pub fn with_probe_url<U: Into<String>>(mut self, probe_url: U) -> Self {
        self.probe_url = Some(probe_url.into());
        self
    }

    /// Set the site's home page.
    pub fn with_main_url<U: Into<String>>(mut self, main_url: U) -> Self {
        self.main_url = Some(main_url.into());
        self
    }

    /// Set the claimed/unclaimed handles used for self-validation.
    pub fn with_test_handles<C: Into<String>, U: Into<String>>(
        mut self,
        claimed: C,
        unclaimed: U,
    ) -> Self {
        self.username_claimed = Some(claimed.into());
        self.username_unclaimed = Some(unclaimed.into());
        self
    }
}

/// Outcome of probing one site for one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The handle is registered; `link` is the profile URL
    Found { link: String },

    /// The site reports no such handle
    NotFound,

    /// The request never produced a response
    TransportError { detail: String },

    /// The site's error-detection strategy is not implemented
    UnsupportedStrategy { name: String },
}

/// Result of one probe, delivered to the consumer exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The handle that was investigated
    pub handle: String,

    /// Site name from the catalog
    pub site: String,

    /// Display URL template of the site
    pub url: String,

    /// Probe URL template, when the site has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,

    /// What the probe concluded
    pub outcome: ProbeOutcome,

    /// Whether the request went through the proxy
    pub via_proxy: bool,

    /// How long the probe took, including waiting for a slot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_duration: Option<Duration>,
}

impl ProbeResult {
    /// Whether the handle exists on the site.
    pub fn exists(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Found { .. })
    }

    /// Whether the probe failed rather than reaching a verdict.
    pub fn is_error(&self) -> bool {
        matches!(
            self.outcome,
            ProbeOutcome::TransportError { .. } | ProbeOutcome::UnsupportedStrategy { .. }
        )
    }

    /// Profile link, populated only when the handle exists.
    pub fn link(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Found { link } => Some(link),
            _ => None,
        }
    }

    /// Error description, populated only when the probe failed.
    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            ProbeOutcome::TransportError { detail } => Some(detail.clone()),
            ProbeOutcome::UnsupportedStrategy { name } => {
                Some(format!("Unsupported error type `{}`", name))
            }
            _ => None,
        }
    }
}

/// Run context for a probing pass.
///
/// Cloned into an `Arc` when a pass starts and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Maximum number of probes in flight
    /// Default: 8, Range: 1-100
    pub concurrency: usize,

    /// Timeout for each individual request
    /// Default: 120 seconds
    pub timeout: Duration,

    /// Route every probe through `proxy`
    pub use_proxy: bool,

    /// SOCKS proxy endpoint
    pub proxy: String,

    /// User agent header sent with every probe
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            use_proxy: false,
            proxy: DEFAULT_PROXY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Set the concurrency cap, clamped to 1-100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable routing through the proxy.
    pub fn with_proxy_enabled(mut self, enabled: bool) -> Self {
        self.use_proxy = enabled;
        self
    }

    /// Set the proxy endpoint.
    pub fn with_proxy<P: Into<String>>(mut self, proxy: P) -> Self {
        self.proxy = proxy.into();
        self
    }

    /// Set the user agent.
    pub fn with_user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Counts for one completed probing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub errors: usize,
    pub duration: Duration,
}

impl ProbeSummary {
    /// Account for one result.
    pub fn record(&mut self, result: &ProbeResult) {
        self.total += 1;
        match result.outcome {
            ProbeOutcome::Found { .. } => self.found += 1,
            ProbeOutcome::NotFound => self.not_found += 1,
            ProbeOutcome::TransportError { .. } | ProbeOutcome::UnsupportedStrategy { .. } => {
                self.errors += 1
            }
        }
    }
}

/// Self-validation verdict for one catalog entry.
#[derive(Debug, Clone)]
pub struct SiteValidation {
    /// Site name from the catalog
    pub site: String,

    /// Probe of the claimed handle; `None` when the site has no test handles
    pub claimed: Option<ProbeResult>,

    /// Probe of the unclaimed handle; `None` when the site has no test handles
    pub unclaimed: Option<ProbeResult>,
}

impl SiteValidation {
    /// Whether the site lacked test handles and was not probed.
    pub fn is_skipped(&self) -> bool {
        self.claimed.is_none() || self.unclaimed.is_none()
    }

    /// Whether the site's rule tells the claimed handle from the unclaimed one.
    pub fn works(&self) -> bool {
        match (&self.claimed, &self.unclaimed) {
            (Some(claimed), Some(unclaimed)) => claimed.exists() && !unclaimed.exists(),
            _ => false,
        }
    }

    /// Errors of both probes, each wrapped in brackets.
    pub fn error_summary(&self) -> String {
        [&self.claimed, &self.unclaimed]
            .into_iter()
            .flatten()
            .filter_map(|r| r.error_message())
            .map(|msg| format!("[{}]", msg))
            .collect()
    }
}
