//! Site catalog loading.
//!
//! The catalog is an immutable map from site name to `SiteProbe`. It is read
//! from a Sherlock-style `data.json` file:
//!
//! ```json
//! {
//!   "GitHub": {
//!     "errorType": "status_code",
//!     "url": "https://www.github.com/{}",
//!     "urlMain": "https://www.github.com/",
//!     "username_claimed": "blue",
//!     "username_unclaimed": "noonewouldeverusethis7"
//!   }
//! }
//! ```
//!
//! Individual malformed entries are skipped with a warning so that one bad
//! site never makes the whole catalog unusable.

use crate::error::InvestigoError;
use crate::types::{ErrorStrategy, SiteProbe};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Immutable mapping of site name to probe definition.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sites: BTreeMap<String, Arc<SiteProbe>>,
}

/// `errorMsg` is either a single string or a list of alternatives.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessages {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessages {
    fn into_vec(self) -> Vec<String> {
        match self {
            ErrorMessages::One(message) => vec![message],
            ErrorMessages::Many(messages) => messages,
        }
    }
}

/// One entry as it appears in the JSON file.
#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(rename = "errorType")]
    error_type: Option<serde_json::Value>,
    #[serde(rename = "errorMsg")]
    error_msg: Option<ErrorMessages>,
    url: Option<String>,
    #[serde(rename = "urlMain")]
    url_main: Option<String>,
    #[serde(rename = "urlProbe")]
    url_probe: Option<String>,
    #[serde(rename = "errorUrl")]
    error_url: Option<String>,
    username_claimed: Option<String>,
    username_unclaimed: Option<String>,
}

impl RawSite {
    fn into_probe(self, name: &str) -> Option<SiteProbe> {
        let display_url = self.url.filter(|u| !u.trim().is_empty())?;
        let messages = self.error_msg.map(ErrorMessages::into_vec).unwrap_or_default();

        let strategy = match self.error_type {
            Some(serde_json::Value::String(kind)) => ErrorStrategy::from_catalog(&kind, messages),
            Some(other) => ErrorStrategy::Unsupported(other.to_string()),
            None => ErrorStrategy::Unsupported(String::new()),
        };

        Some(SiteProbe {
            name: name.to_string(),
            display_url,
            probe_url: self.url_probe.filter(|u| !u.trim().is_empty()),
            strategy,
            main_url: self.url_main,
            error_url: self.error_url,
            username_claimed: self.username_claimed,
            username_unclaimed: self.username_unclaimed,
        })
    }
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from site definitions. Later duplicates replace earlier ones.
    pub fn from_sites<I: IntoIterator<Item = SiteProbe>>(sites: I) -> Self {
        let mut catalog = Self::new();
        for site in sites {
            catalog.insert(site);
        }
        catalog
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, InvestigoError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Parse a catalog from an already decoded JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, InvestigoError> {
        let serde_json::Value::Object(entries) = value else {
            return Err(InvestigoError::catalog(
                "Catalog must be a JSON object keyed by site name",
            ));
        };

        let mut catalog = Self::new();
        for (name, entry) in entries {
            if name.starts_with('$') || !entry.is_object() {
                continue;
            }

            let raw = match serde_json::from_value::<RawSite>(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(site = %name, "skipping malformed catalog entry: {}", e);
                    continue;
                }
            };

            match raw.into_probe(&name) {
                Some(site) => catalog.insert(site),
                None => tracing::warn!(site = %name, "skipping catalog entry without url"),
            }
        }

        Ok(catalog)
    }

    /// Load a catalog file from disk.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, InvestigoError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            InvestigoError::file_error(
                path.to_string_lossy(),
                format!("Failed to read catalog: {}", e),
            )
        })?;

        let catalog = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), sites = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    /// Add the sites that are missing from the upstream database.
    ///
    /// Entries already present are kept as they are.
    pub fn with_bundled_sites(mut self) -> Self {
        for site in bundled_sites() {
            if !self.sites.contains_key(&site.name) {
                self.insert(site);
            }
        }
        self
    }

    /// Keep only the named sites (case-insensitive).
    pub fn filter(&self, names: &[String]) -> Self {
        let wanted: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        let sites = self
            .sites
            .iter()
            .filter(|(name, _)| wanted.contains(&name.to_lowercase()))
            .map(|(name, site)| (name.clone(), site.clone()))
            .collect();
        Self { sites }
    }

    /// Add or replace a site.
    pub fn insert(&mut self, site: SiteProbe) {
        self.sites.insert(site.name.clone(), Arc::new(site));
    }

    /// Look up a site by exact name.
    pub fn get(&self, name: &str) -> Option<&Arc<SiteProbe>> {
        self.sites.get(name)
    }

    /// Sites in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SiteProbe>> {
        self.sites.values()
    }

    /// Site names in order.
    pub fn names(&self) -> Vec<&str> {
        self.sites.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Sites not covered by the upstream Sherlock database.
pub fn bundled_sites() -> Vec<SiteProbe> {
    vec![
        SiteProbe::new(
            "Pornhub",
            "https://www.pornhub.com/users/{}",
            ErrorStrategy::StatusCode,
        )
        .with_main_url("https://www.pornhub.com/"),
        SiteProbe::new(
            "NAVER",
            "https://blog.naver.com/{}",
            ErrorStrategy::StatusCode,
        )
        .with_main_url("https://www.naver.com/"),
        SiteProbe::new(
            "xvideos",
            "https://xvideos.com/profiles/{}",
            ErrorStrategy::StatusCode,
        )
        .with_main_url("https://xvideos.com/"),
    ]
}
