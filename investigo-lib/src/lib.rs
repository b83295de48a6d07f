//! # Investigo Library
//!
//! A fast library for finding which websites have a profile for a username.
//!
//! Every site of a catalog is probed concurrently. A shared limiter caps the
//! number of requests in flight, each site's rule decides presence from the
//! response, and results are delivered as soon as each probe completes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use investigo_lib::{Catalog, Investigator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Catalog::load_file("data.json")?.with_bundled_sites();
//!     let investigator = Investigator::new()?;
//!
//!     for result in investigator.probe_all("alice", &catalog).await? {
//!         if let Some(link) = result.link() {
//!             println!("{}: {}", result.site, link);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded Concurrency**: One task per site, at most N fetches in flight
//! - **Streaming Results**: Results are yielded in completion order
//! - **Site Rules**: Status code, error message and response URL detection
//! - **SOCKS Proxy**: Optional routing through Tor or any SOCKS5 proxy
//! - **Catalog Validation**: Self-test using each site's known handles

// Re-export main public API types and functions
// This makes them available as investigo_lib::TypeName
pub use catalog::{bundled_sites, Catalog};
pub use checker::{Investigator, ProbeStream, ResultSink};
pub use classifier::{classify, status_indicates_presence};
pub use concurrent::{ProbeLimiter, SlotPermit};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::InvestigoError;
pub use fetch::{FetchRequest, FetchResponse, Fetcher, HttpFetcher};
pub use types::{
    ErrorStrategy, ProbeConfig, ProbeOutcome, ProbeResult, ProbeSummary, SiteProbe,
    SiteValidation, DEFAULT_CONCURRENCY, DEFAULT_PROXY, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use utils::{expand_handle_inputs, substitute_handle, validate_handle};

// Internal modules - these are not part of the public API
mod catalog;
mod checker;
mod classifier;
mod concurrent;
mod config;
mod error;
mod fetch;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, InvestigoError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
