use super::LOG_TARGET;
use super::client::{HttpClient, HttpResponse};
use crate::Result;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::{RecoveryInfo, ResilienceContext};
use std::sync::Arc;
use tick::Clock;
use url::Url;

/// Statuses worth another attempt.
const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Upper bound on any single wait between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,

    /// Seconds to wait before the first retry; doubled for every following retry.
    pub backoff_factor: f64,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Wait before the first retry, never above [`MAX_BACKOFF`].
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        if self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }

        Duration::try_from_secs_f64(self.backoff_factor).map_or(MAX_BACKOFF, |d| d.min(MAX_BACKOFF))
    }
}

/// Whether a status is considered transient.
#[must_use]
pub fn is_transient(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Whether `outcome` deserves another attempt.
fn recovery_for(outcome: &Result<HttpResponse>) -> RecoveryInfo {
    match outcome {
        Ok(response) if is_transient(response.status()) => {
            log::info!(target: LOG_TARGET, "Transient HTTP status {}, retryable", response.status());
            RecoveryInfo::retry()
        }
        Ok(_) => RecoveryInfo::never(),
        Err(e) => {
            log::info!(target: LOG_TARGET, "Request failed, retryable: {e:#}");
            RecoveryInfo::retry()
        }
    }
}

/// One outbound GET, owned so the retry layer can replay it.
#[derive(Debug, Clone)]
struct Request {
    url: Url,
    query: Vec<(String, String)>,
    timeout: Duration,
}

/// [`HttpClient`] decorator that retries transport errors and transient statuses through a `seatbelt`
/// retry layer.
///
/// Once the retries are exhausted the last outcome is handed back unchanged, so callers see the final
/// error status rather than a retry-specific error.
pub struct RetryingClient<C> {
    inner: Arc<C>,
    policy: RetryPolicy,
    clock: Clock,
}

impl<C: core::fmt::Debug> core::fmt::Debug for RetryingClient<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("inner", &self.inner)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<C> RetryingClient<C> {
    #[must_use]
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(inner),
            policy,
            clock: Clock::new_tokio(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: HttpClient + Send + Sync + 'static> HttpClient for RetryingClient<C> {
    async fn get(&self, url: &Url, query: &[(&str, &str)], timeout: Duration) -> Result<HttpResponse> {
        let context = ResilienceContext::new(&self.clock).name("github");
        let inner = Arc::clone(&self.inner);

        let stack = (
            Retry::layer("http_get", &context)
                .clone_input()
                .max_retry_attempts(self.policy.max_retries)
                .backoff(Backoff::Exponential)
                .base_delay(self.policy.base_delay())
                .max_delay(MAX_BACKOFF)
                .use_jitter(false)
                .recovery_with(|outcome: &Result<HttpResponse>, _| recovery_for(outcome)),
            Execute::new(move |request: Request| {
                let inner = Arc::clone(&inner);
                async move {
                    let query: Vec<(&str, &str)> = request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                    inner.get(&request.url, &query, request.timeout).await
                }
            }),
        );

        let request = Request {
            url: url.clone(),
            query: query.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect(),
            timeout,
        };

        stack.into_service().execute(request).await
    }
}
