//! Classification of fetched responses.
//!
//! Everything here is a pure function of data that has already been fetched,
//! so each site rule can be tested without a network.

use crate::error::InvestigoError;
use crate::fetch::FetchResponse;
use crate::types::{ErrorStrategy, SiteProbe};
use crate::utils::substitute_handle;

/// Status codes that count as "profile present" for status-based rules.
///
/// Anything that is not a client or server error qualifies, so redirects
/// that were not followed (e.g. a bare 301) count as present. This includes
/// 302-399, which older Investigo releases reported as absent.
pub fn status_indicates_presence(status: u16) -> bool {
    status < 400
}

/// Decide whether `handle` exists on `site` given the fetched `response`.
///
/// # Errors
///
/// Returns `InvestigoError::UnsupportedStrategy` naming the strategy when the
/// site uses a rule this classifier does not implement.
pub fn classify(
    site: &SiteProbe,
    handle: &str,
    response: &FetchResponse,
) -> Result<bool, InvestigoError> {
    match &site.strategy {
        ErrorStrategy::StatusCode => Ok(status_indicates_presence(response.status)),
        ErrorStrategy::MessageContains(messages) => {
            let body = response.body.as_deref().unwrap_or_default();
            Ok(!messages.iter().any(|message| body.contains(message.as_str())))
        }
        ErrorStrategy::ResponseUrl => {
            let expected = substitute_handle(&site.display_url, handle);
            Ok(status_indicates_presence(response.status) && response.final_url == expected)
        }
        ErrorStrategy::Unsupported(name) => Err(InvestigoError::unsupported_strategy(name)),
    }
}
