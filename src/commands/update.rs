use super::host::Host;
use crate::Result;
use crate::config::Config;
use crate::facts::hosting::{HttpClient, Provider, ReqwestClient, RemoteStats, RetryingClient};
use crate::facts::{SlotMap, compute_uptime};
use crate::patch::{DocumentReport, patch_document};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use clap::Args;
use core::num::NonZeroU32;
use core::time::Duration;
use std::io::Write;

/// Log target for the update command
const LOG_TARGET: &str = "update";

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Path to the configuration file [default: profile-banner.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// GitHub account whose statistics are shown
    #[arg(long)]
    pub username: Option<String>,

    /// Start of the uptime counter (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub birth_date: Option<NaiveDate>,

    /// Assumed lifespan in days
    #[arg(long, value_name = "DAYS")]
    pub lifespan_days: Option<NonZeroU32>,

    /// Banner document to patch; may be repeated and replaces the configured list
    #[arg(long = "document", value_name = "PATH")]
    pub documents: Vec<Utf8PathBuf>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Extra attempts for transient HTTP failures
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Seconds before the first retry, doubled for every following retry
    #[arg(long)]
    pub backoff_factor: Option<f64>,

    /// Compute the uptime as of this date instead of today (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub today: Option<NaiveDate>,

    /// Report what would change without writing any document
    #[arg(long)]
    pub dry_run: bool,
}

/// How many of the configured documents were processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    AllDocuments,
    SomeDocuments,
    NoDocuments,
}

impl UpdateStatus {
    fn from_counts(succeeded: usize, total: usize) -> Self {
        if succeeded == 0 {
            Self::NoDocuments
        } else if succeeded == total {
            Self::AllDocuments
        } else {
            Self::SomeDocuments
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::AllDocuments => 0,
            Self::SomeDocuments => 1,
            Self::NoDocuments => 2,
        }
    }
}

/// Recompute every statistic and patch them into the configured documents.
///
/// Only configuration problems produce an error; fetch failures degrade individual slots and document
/// failures are reported per document and reflected in the returned status.
pub async fn process_update<H: Host>(host: &mut H, args: &UpdateArgs) -> Result<UpdateStatus> {
    let mut config = Config::load(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let uptime = compute_uptime(config.birth_date, today, config.lifespan_days);
    log::info!(target: LOG_TARGET, "Uptime as of {today}: {}", uptime.summary());

    let stats = fetch_remote_stats(ReqwestClient::new(), &config).await;

    let mut slots = uptime.slots();
    slots.merge(stats.slots());

    Ok(update_documents(host, &config.documents, &slots, args.dry_run))
}

/// Query the remote statistics, degrading every field when no HTTP client could be built.
async fn fetch_remote_stats<C>(client: Result<C>, config: &Config) -> RemoteStats
where
    C: HttpClient + Send + Sync + 'static,
{
    match client {
        Ok(client) => {
            let client = RetryingClient::new(client, config.retry_policy());
            Provider::new(&client, config.endpoints()).get_remote_stats(&config.username).await
        }
        Err(e) => {
            log::error!(target: LOG_TARGET, "Could not set up the HTTP client, all GitHub fields unavailable: {e:#}");
            RemoteStats::unavailable()
        }
    }
}

fn apply_overrides(config: &mut Config, args: &UpdateArgs) {
    if let Some(username) = &args.username {
        config.username.clone_from(username);
    }
    if let Some(birth_date) = args.birth_date {
        config.birth_date = birth_date;
    }
    if let Some(lifespan_days) = args.lifespan_days {
        config.lifespan_days = lifespan_days;
    }
    if !args.documents.is_empty() {
        config.documents.clone_from(&args.documents);
    }
    if let Some(timeout) = args.timeout {
        config.http_timeout = Duration::from_secs(timeout);
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(backoff_factor) = args.backoff_factor {
        config.backoff_factor = backoff_factor;
    }
}

/// Patch every document in turn; a failing document never stops the others.
fn update_documents<H: Host>(host: &mut H, documents: &[Utf8PathBuf], slots: &SlotMap, dry_run: bool) -> UpdateStatus {
    let mut succeeded = 0;

    for path in documents {
        match patch_document(path, slots, dry_run) {
            Ok(report) => {
                succeeded += 1;
                let _ = writeln!(host.output(), "{}", describe(&report));
            }
            Err(e) => {
                log::error!(target: LOG_TARGET, "Skipping '{path}': {e:#}");
                let _ = writeln!(host.error(), "failed {path}: {e:#}");
            }
        }
    }

    let status = UpdateStatus::from_counts(succeeded, documents.len());
    log::info!(target: LOG_TARGET, "Processed {succeeded} of {} document(s)", documents.len());
    status
}

fn describe(report: &DocumentReport) -> String {
    let path: &Utf8Path = &report.path;
    let mut line = if report.written {
        format!("updated {path} ({} slot(s) changed)", report.replaced)
    } else if report.changed {
        format!("would update {path} ({} slot(s) changed)", report.replaced)
    } else {
        format!("unchanged {path}")
    };

    if !report.unmatched.is_empty() {
        line.push_str(&format!(", missing slot(s): {}", report.unmatched.join(", ")));
    }

    line
}
