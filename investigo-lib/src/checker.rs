//! Main probing engine.
//!
//! This module provides the `Investigator`, which probes every site of a
//! catalog for one handle. Each site runs as its own task; a shared
//! `ProbeLimiter` caps how many fetches are in flight, and results are
//! delivered in completion order as soon as each task finishes.

use crate::catalog::Catalog;
use crate::classifier::classify;
use crate::concurrent::ProbeLimiter;
use crate::error::InvestigoError;
use crate::fetch::{FetchRequest, Fetcher, HttpFetcher};
use crate::types::{
    ErrorStrategy, ProbeConfig, ProbeOutcome, ProbeResult, ProbeSummary, SiteProbe,
    SiteValidation,
};
use crate::utils::substitute_handle;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Stream of per-site items produced by a probing pass.
pub type ProbeStream<T> = Pin<Box<dyn Stream<Item = Result<T, InvestigoError>> + Send>>;

/// Consumer of probe results.
///
/// `on_result` is called once per completed probe, as soon as it completes.
pub trait ResultSink {
    fn on_result(&mut self, result: ProbeResult);
}

impl<F: FnMut(ProbeResult)> ResultSink for F {
    fn on_result(&mut self, result: ProbeResult) {
        self(result)
    }
}

/// Probing engine that checks a handle against every site of a catalog.
///
/// # Example
///
/// ```rust,no_run
/// use investigo_lib::{Catalog, Investigator};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let catalog = Catalog::load_file("data.json")?;
///     let investigator = Investigator::new()?;
///
///     investigator
///         .probe_all_with_sink("alice", &catalog, &mut |result: investigo_lib::ProbeResult| {
///             if let Some(link) = result.link() {
///                 println!("[+] {}: {}", result.site, link);
///             }
///         })
///         .await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Investigator {
    /// Run context, shared read-only by every task
    config: Arc<ProbeConfig>,
    /// Transport used for every probe
    fetcher: Arc<dyn Fetcher>,
    /// Slots bounding in-flight fetches
    limiter: Arc<ProbeLimiter>,
}

impl Investigator {
    /// Create an investigator with default configuration and the HTTP fetcher.
    pub fn new() -> Result<Self, InvestigoError> {
        Self::with_config(ProbeConfig::default())
    }

    /// Create an investigator with custom configuration and the HTTP fetcher.
    ///
    /// # Example
    ///
    /// ```rust
    /// use investigo_lib::{Investigator, ProbeConfig};
    /// use std::time::Duration;
    ///
    /// let config = ProbeConfig::default()
    ///     .with_concurrency(4)
    ///     .with_timeout(Duration::from_secs(30));
    ///
    /// let investigator = Investigator::with_config(config).unwrap();
    /// assert_eq!(investigator.limiter().capacity(), 4);
    /// ```
    pub fn with_config(config: ProbeConfig) -> Result<Self, InvestigoError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create an investigator over an arbitrary fetcher.
    ///
    /// The limiter is sized from `config.concurrency`.
    pub fn with_fetcher(config: ProbeConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let limiter = Arc::new(ProbeLimiter::new(config.concurrency));
        Self {
            config: Arc::new(config),
            fetcher,
            limiter,
        }
    }

    /// Use a limiter shared with other investigators.
    pub fn with_limiter(mut self, limiter: Arc<ProbeLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Get the run configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Get the limiter bounding this investigator's fetches.
    pub fn limiter(&self) -> &Arc<ProbeLimiter> {
        &self.limiter
    }

    /// Probe one site for `handle`.
    ///
    /// Never fails: transport problems and unsupported strategies are
    /// reported in the result's outcome.
    pub async fn probe_site(&self, handle: &str, site: &SiteProbe) -> ProbeResult {
        let start = Instant::now();
        let link = substitute_handle(&site.display_url, handle);

        let outcome = match &site.strategy {
            ErrorStrategy::Unsupported(name) => ProbeOutcome::UnsupportedStrategy {
                name: name.clone(),
            },
            _ => self.fetch_and_classify(handle, site, link).await,
        };

        tracing::debug!(
            site = %site.name,
            handle,
            ?outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "probe finished"
        );

        ProbeResult {
            handle: handle.to_string(),
            site: site.name.clone(),
            url: site.display_url.clone(),
            probe_url: site.probe_url.clone(),
            outcome,
            via_proxy: self.config.use_proxy,
            check_duration: Some(start.elapsed()),
        }
    }

    async fn fetch_and_classify(
        &self,
        handle: &str,
        site: &SiteProbe,
        link: String,
    ) -> ProbeOutcome {
        let target = match &site.probe_url {
            Some(template) => substitute_handle(template, handle),
            None => link.clone(),
        };

        let slot = match self.limiter.acquire().await {
            Ok(slot) => slot,
            Err(e) => {
                return ProbeOutcome::TransportError {
                    detail: e.to_string(),
                }
            }
        };

        let request = FetchRequest {
            url: target,
            use_proxy: self.config.use_proxy,
            timeout: self.config.timeout,
            read_body: site.strategy.needs_body(),
        };
        tracing::debug!(site = %site.name, url = %request.url, "probe started");

        let fetched = match tokio::time::timeout(self.config.timeout, self.fetcher.fetch(&request))
            .await
        {
            Ok(fetched) => fetched,
            Err(_) => Err(InvestigoError::timeout(&request.url, self.config.timeout)),
        };

        let outcome = match fetched {
            Ok(response) => match classify(site, handle, &response) {
                Ok(true) => ProbeOutcome::Found { link },
                Ok(false) => ProbeOutcome::NotFound,
                Err(InvestigoError::UnsupportedStrategy { name }) => {
                    ProbeOutcome::UnsupportedStrategy { name }
                }
                Err(e) => ProbeOutcome::TransportError {
                    detail: e.to_string(),
                },
            },
            Err(e) => ProbeOutcome::TransportError {
                detail: e.to_string(),
            },
        };

        slot.release();
        outcome
    }

    /// Probe every site of `catalog` for `handle`, yielding results as they complete.
    ///
    /// The stream yields exactly one item per catalog entry and ends only
    /// after every task has finished. `Err` items are reserved for tasks that
    /// died without a result (a panic). Dropping the stream aborts the
    /// remaining probes and frees their slots.
    pub fn probe_all_stream(&self, handle: &str, catalog: &Catalog) -> ProbeStream<ProbeResult> {
        let investigator = self.clone();
        let handle = handle.to_string();

        spawn_per_site(catalog, move |site| {
            let investigator = investigator.clone();
            let handle = handle.clone();
            async move { investigator.probe_site(&handle, &site).await }
        })
    }

    /// Probe every site and collect all results.
    ///
    /// Results are in completion order.
    pub async fn probe_all(
        &self,
        handle: &str,
        catalog: &Catalog,
    ) -> Result<Vec<ProbeResult>, InvestigoError> {
        let mut results = Vec::with_capacity(catalog.len());
        self.probe_all_with_sink(handle, catalog, &mut |result: ProbeResult| results.push(result))
            .await?;
        Ok(results)
    }

    /// Probe every site, pushing each result into `sink` as soon as it completes.
    ///
    /// Every result that was produced reaches the sink. If a task failed
    /// without producing one, the first such failure is returned once all
    /// other tasks have finished.
    pub async fn probe_all_with_sink<S: ResultSink + ?Sized>(
        &self,
        handle: &str,
        catalog: &Catalog,
        sink: &mut S,
    ) -> Result<ProbeSummary, InvestigoError> {
        let start = Instant::now();
        let mut summary = ProbeSummary::default();
        let mut first_failure = None;

        let mut stream = self.probe_all_stream(handle, catalog);
        while let Some(item) = stream.next().await {
            match item {
                Ok(result) => {
                    summary.record(&result);
                    sink.on_result(result);
                }
                Err(e) => {
                    tracing::warn!(handle, "probe task failed: {}", e);
                    first_failure.get_or_insert(e);
                }
            }
        }

        summary.duration = start.elapsed();
        match first_failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Check that each site's rule tells its claimed handle from its unclaimed one.
    ///
    /// Sites without both test handles are yielded as skipped without probing.
    pub fn validate_catalog(&self, catalog: &Catalog) -> ProbeStream<SiteValidation> {
        let investigator = self.clone();

        spawn_per_site(catalog, move |site| {
            let investigator = investigator.clone();
            async move {
                let (claimed, unclaimed) =
                    match (&site.username_claimed, &site.username_unclaimed) {
                        (Some(claimed), Some(unclaimed)) => {
                            let (claimed, unclaimed) = tokio::join!(
                                investigator.probe_site(claimed, &site),
                                investigator.probe_site(unclaimed, &site)
                            );
                            (Some(claimed), Some(unclaimed))
                        }
                        _ => (None, None),
                    };

                SiteValidation {
                    site: site.name.clone(),
                    claimed,
                    unclaimed,
                }
            }
        })
    }
}

/// Spawn one task per catalog entry and stream their outputs in completion order.
///
/// Tasks are spawned on the first poll, so the stream can be built outside
/// a runtime. The join set is owned by the stream: dropping it aborts
/// whatever is still running.
fn spawn_per_site<T, F, Fut>(catalog: &Catalog, task: F) -> ProbeStream<T>
where
    T: Send + 'static,
    F: Fn(Arc<SiteProbe>) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let sites: Vec<Arc<SiteProbe>> = catalog.iter().cloned().collect();
    let pending = Some((sites, task));

    Box::pin(stream::unfold(
        (pending, JoinSet::new()),
        |(pending, mut tasks)| async move {
            if let Some((sites, task)) = pending {
                for site in sites {
                    tasks.spawn(task(site));
                }
            }

            let joined = tasks.join_next().await?;
            Some((joined.map_err(InvestigoError::from), (None, tasks)))
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use async_trait::async_trait;

    /// Answers 200 for URLs ending in "/alice" and 404 otherwise.
    struct AliceOnly;

    #[async_trait]
    impl Fetcher for AliceOnly {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, InvestigoError> {
            let status = if request.url.ends_with("/alice") { 200 } else { 404 };
            Ok(FetchResponse::new(status, request.url.clone()))
        }
    }

    fn investigator() -> Investigator {
        Investigator::with_fetcher(ProbeConfig::default(), Arc::new(AliceOnly))
    }

    #[tokio::test]
    async fn test_probe_site_found_has_link() {
        let site = SiteProbe::new("Example", "https://example.com/{}", ErrorStrategy::StatusCode);
        let result = investigator().probe_site("alice", &site).await;
        assert!(result.exists());
        assert_eq!(result.link(), Some("https://example.com/alice"));
        assert!(!result.via_proxy);
        assert!(result.check_duration.is_some());
    }

    #[tokio::test]
    async fn test_probe_site_not_found_has_no_link() {
        let site = SiteProbe::new("Example", "https://example.com/{}", ErrorStrategy::StatusCode);
        let result = investigator().probe_site("bob", &site).await;
        assert_eq!(result.outcome, ProbeOutcome::NotFound);
        assert_eq!(result.link(), None);
    }

    #[tokio::test]
    async fn test_probe_url_is_fetched_but_display_url_is_linked() {
        let site = SiteProbe::new("Example", "https://example.com/u/{}", ErrorStrategy::StatusCode)
            .with_probe_url("https://api.example.com/users/{}");
        let result = investigator().probe_site("alice", &site).await;
        assert_eq!(result.link(), Some("https://example.com/u/alice"));
    }

    #[tokio::test]
    async fn test_unsupported_strategy_is_reported_without_fetching() {
        let site = SiteProbe::new(
            "Example",
            "https://example.com/{}",
            ErrorStrategy::Unsupported("regex".to_string()),
        );
        let result = investigator().probe_site("alice", &site).await;
        assert_eq!(
            result.outcome,
            ProbeOutcome::UnsupportedStrategy {
                name: "regex".to_string()
            }
        );
        assert!(result.check_duration.is_some());
    }

    #[tokio::test]
    async fn test_proxy_flag_is_recorded() {
        let config = ProbeConfig::default().with_proxy_enabled(true);
        let investigator = Investigator::with_fetcher(config, Arc::new(AliceOnly));
        let site = SiteProbe::new("Example", "https://example.com/{}", ErrorStrategy::StatusCode);
        assert!(investigator.probe_site("alice", &site).await.via_proxy);
    }

    #[tokio::test]
    async fn test_closure_sink_receives_every_result() {
        let catalog = Catalog::from_sites(vec![
            SiteProbe::new("A", "https://a.example.com/{}", ErrorStrategy::StatusCode),
            SiteProbe::new("B", "https://b.example.com/{}", ErrorStrategy::StatusCode),
        ]);
        let mut sites = Vec::new();
        let summary = investigator()
            .probe_all_with_sink("alice", &catalog, &mut |r: ProbeResult| sites.push(r.site))
            .await
            .unwrap();
        sites.sort();
        assert_eq!(sites, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.found, 2);
    }

    #[test]
    fn test_stream_can_be_built_outside_a_runtime() {
        let catalog = Catalog::from_sites(vec![SiteProbe::new(
            "A",
            "https://a.example.com/{}",
            ErrorStrategy::StatusCode,
        )]);
        let stream = investigator().probe_all_stream("alice", &catalog);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let results: Vec<_> = rt.block_on(stream.collect());
        assert_eq!(results.len(), 1);
    }
}
