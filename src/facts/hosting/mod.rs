//! GitHub statistics fact provider.

mod badge;
mod client;
mod provider;
mod remote_stats;
mod retry;

pub use client::{HttpClient, HttpResponse, ReqwestClient};
pub use provider::{Endpoints, Provider};
pub use remote_stats::RemoteStats;
pub use retry::{RetryPolicy, RetryingClient};

/// Log target for the hosting provider
pub(crate) const LOG_TARGET: &str = "hosting";
