use super::LOG_TARGET;
use super::badge::{extract_text_node, truncate_percentage};
use super::client::HttpClient;
use super::remote_stats::RemoteStats;
use crate::Result;
use anyhow::{Context, anyhow, bail};
use core::time::Duration;
use serde::Deserialize;
use url::Url;

const REPOS_PER_PAGE: &str = "100";

/// Where and how the provider reaches the remote services.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Base URL of the GitHub REST API.
    pub api_url: Url,

    /// Badge service endpoint that renders statistic cards.
    pub badge_url: Url,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Upper bound on repository pages to walk when summing stars.
    pub max_repo_pages: u32,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    public_repos: Option<u64>,
    followers: Option<u64>,
    repos_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoSummary {
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Default)]
struct CommitCard {
    commits: Option<String>,
    contribs: Option<String>,
}

#[derive(Debug, Default)]
struct PullRequestCard {
    merged: Option<String>,
    merged_percentage: Option<String>,
}

/// Collects [`RemoteStats`] for a user through an injected [`HttpClient`].
#[derive(Debug)]
pub struct Provider<'a, C> {
    client: &'a C,
    endpoints: Endpoints,
}

impl<'a, C: HttpClient> Provider<'a, C> {
    #[must_use]
    pub const fn new(client: &'a C, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    /// Fetch every statistic for `username`.
    ///
    /// Never fails: a failed profile lookup yields [`RemoteStats::unavailable`], and any later failure only
    /// blanks the fields that depend on it.
    pub async fn get_remote_stats(&self, username: &str) -> RemoteStats {
        let start_time = std::time::Instant::now();
        log::info!(target: LOG_TARGET, "Querying GitHub statistics for '{username}'");

        let profile = match self.get_profile(username).await {
            Ok(profile) => profile,
            Err(e) => {
                log::error!(target: LOG_TARGET, "Could not fetch the GitHub profile of '{username}', all GitHub fields unavailable: {e:#}");
                return RemoteStats::unavailable();
            }
        };

        let star_total = match profile.repos_url.as_deref() {
            Some(repos_url) => self
                .get_star_total(repos_url)
                .await
                .inspect_err(|e| log::error!(target: LOG_TARGET, "Could not sum stars for '{username}': {e:#}"))
                .ok(),
            None => {
                log::error!(target: LOG_TARGET, "Profile of '{username}' has no repos_url, stars unavailable");
                None
            }
        };

        let commit_card = self
            .get_commit_card(username)
            .await
            .inspect_err(|e| log::error!(target: LOG_TARGET, "Could not fetch commit statistics for '{username}': {e:#}"))
            .unwrap_or_default();

        let pr_card = self
            .get_pull_request_card(username)
            .await
            .inspect_err(|e| log::error!(target: LOG_TARGET, "Could not fetch pull request statistics for '{username}': {e:#}"))
            .unwrap_or_default();

        let stats = RemoteStats {
            repo_count: profile.public_repos,
            follower_count: profile.followers,
            star_total,
            commit_count: commit_card.commits,
            contribution_count: commit_card.contribs,
            merged_prs: pr_card.merged,
            merged_pr_percent: pr_card.merged_percentage.as_deref().and_then(truncate_percentage),
        };

        log::debug!(
            target: LOG_TARGET,
            "Finished querying GitHub statistics for '{username}' in {:.3}s ({} field(s) unavailable)",
            start_time.elapsed().as_secs_f64(),
            stats.missing_fields()
        );

        stats
    }

    async fn get_profile(&self, username: &str) -> Result<UserProfile> {
        let url = user_url(&self.endpoints.api_url, username)?;
        let response = self
            .client
            .get(&url, &[], self.endpoints.timeout)
            .await?
            .error_for_status("GitHub user profile request")?;

        response.json().with_context(|| format!("decoding the GitHub profile of '{username}'"))
    }

    async fn get_star_total(&self, repos_url: &str) -> Result<u64> {
        let url = Url::parse(repos_url).with_context(|| format!("parsing repos_url '{repos_url}'"))?;
        let mut total: u64 = 0;

        for page in 1..=self.endpoints.max_repo_pages {
            let page_str = page.to_string();
            let response = self
                .client
                .get(&url, &[("page", page_str.as_str()), ("per_page", REPOS_PER_PAGE)], self.endpoints.timeout)
                .await?;

            if response.is_rate_limited() {
                bail!("rate limited by GitHub while reading repository page {page} (HTTP {})", response.status());
            }

            let repos: Vec<RepoSummary> = response
                .error_for_status("GitHub repository listing")?
                .json()
                .with_context(|| format!("decoding repository page {page}"))?;

            if repos.is_empty() {
                log::debug!(target: LOG_TARGET, "Repository listing ended after {} page(s)", page - 1);
                return Ok(total);
            }

            total = repos.iter().fold(total, |sum, repo| sum.saturating_add(repo.stargazers_count));
        }

        log::warn!(
            target: LOG_TARGET,
            "Stopped reading repositories after {} page(s), the star total may be incomplete",
            self.endpoints.max_repo_pages
        );

        Ok(total)
    }

    async fn get_commit_card(&self, username: &str) -> Result<CommitCard> {
        let svg = self
            .get_badge(&[("username", username), ("include_all_commits", "true")], "commit statistics card")
            .await?;

        Ok(CommitCard {
            commits: extract_field(&svg, "commits"),
            contribs: extract_field(&svg, "contribs"),
        })
    }

    async fn get_pull_request_card(&self, username: &str) -> Result<PullRequestCard> {
        let svg = self
            .get_badge(
                &[("username", username), ("show", "prs_merged,prs_merged_percentage")],
                "pull request statistics card",
            )
            .await?;

        Ok(PullRequestCard {
            merged: extract_field(&svg, "prs_merged"),
            merged_percentage: extract_field(&svg, "prs_merged_percentage"),
        })
    }

    async fn get_badge(&self, query: &[(&str, &str)], what: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoints.badge_url, query, self.endpoints.timeout)
            .await?
            .error_for_status(what)?;

        Ok(response.body().to_string())
    }
}

fn extract_field(svg: &str, test_id: &str) -> Option<String> {
    let value = extract_text_node(svg, test_id);
    if value.is_none() {
        log::warn!(target: LOG_TARGET, "Badge card has no text node tagged '{test_id}'");
    }
    value
}

/// `{api}/users/{username}`, with the username percent-encoded as a single path segment.
fn user_url(api_url: &Url, username: &str) -> Result<Url> {
    let mut url = api_url.clone();
    let _ = url
        .path_segments_mut()
        .map_err(|()| anyhow!("API URL '{api_url}' cannot be used as a base"))?
        .pop_if_empty()
        .extend(["users", username]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::hosting::HttpResponse;
    use std::sync::Mutex;

    type Handler = dyn Fn(&Url, &[(&str, &str)]) -> Result<HttpResponse> + Send + Sync;

    /// Routes requests to a closure and records every URL it was asked for.
    struct FakeClient {
        handler: Box<Handler>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn new(handler: impl Fn(&Url, &[(&str, &str)]) -> Result<HttpResponse> + Send + Sync + 'static) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl HttpClient for FakeClient {
        fn get(&self, url: &Url, query: &[(&str, &str)], _timeout: Duration) -> impl Future<Output = Result<HttpResponse>> + Send {
            let rendered = query.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
            self.requests.lock().unwrap().push(format!("{url}?{rendered}"));
            let result = (self.handler)(url, query);
            async move { result }
        }
    }

    fn param<'a>(query: &[(&'a str, &'a str)], name: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }

    fn endpoints() -> Endpoints {
        Endpoints {
            api_url: Url::parse("https://api.example.com").unwrap(),
            badge_url: Url::parse("https://badges.example.com/api").unwrap(),
            timeout: Duration::from_secs(1),
            max_repo_pages: 10,
        }
    }

    const PROFILE: &str = r#"{"public_repos": 50, "followers": 100, "repos_url": "https://api.example.com/users/octo/repos"}"#;
    const COMMITS_SVG: &str =
        r#"<svg><text data-testid="commits">1.2k</text><text data-testid="contribs">14</text></svg>"#;
    const PRS_SVG: &str =
        r#"<svg><text data-testid="prs_merged">40</text><text data-testid="prs_merged_percentage">95% merged</text></svg>"#;

    fn repo_page(stars: &[u64]) -> String {
        let items: Vec<String> = stars.iter().map(|s| format!(r#"{{"name": "r", "stargazers_count": {s}}}"#)).collect();
        format!("[{}]", items.join(","))
    }

    /// A well-behaved GitHub plus badge service; `overrides` may intercept any request first.
    fn service(
        overrides: impl Fn(&Url, &[(&str, &str)]) -> Option<Result<HttpResponse>> + Send + Sync + 'static,
    ) -> FakeClient {
        FakeClient::new(move |url, query| {
            if let Some(result) = overrides(url, query) {
                return result;
            }

            match (url.host_str(), url.path()) {
                (Some("api.example.com"), "/users/octo") => Ok(HttpResponse::new(200, PROFILE)),
                (Some("api.example.com"), "/users/octo/repos") => match param(query, "page") {
                    Some("1") => Ok(HttpResponse::new(200, repo_page(&[10, 20, 5]))),
                    _ => Ok(HttpResponse::new(200, "[]")),
                },
                (Some("badges.example.com"), "/api") if param(query, "include_all_commits").is_some() => {
                    Ok(HttpResponse::new(200, COMMITS_SVG))
                }
                (Some("badges.example.com"), "/api") if param(query, "show").is_some() => Ok(HttpResponse::new(200, PRS_SVG)),
                _ => Ok(HttpResponse::new(404, "")),
            }
        })
    }

    #[tokio::test]
    async fn test_all_sources_available() {
        let client = service(|_, _| None);
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(
            stats,
            RemoteStats {
                repo_count: Some(50),
                follower_count: Some(100),
                star_total: Some(35),
                commit_count: Some("1.2k".into()),
                contribution_count: Some("14".into()),
                merged_prs: Some("40".into()),
                merged_pr_percent: Some("95%".into()),
            }
        );

        // profile, two repository pages, two badge cards
        assert_eq!(client.request_count(), 5);
    }

    #[tokio::test]
    async fn test_requests_are_well_formed() {
        let client = service(|_, _| None);
        let _ = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        let requests = client.requests.lock().unwrap().clone();
        assert_eq!(requests[0], "https://api.example.com/users/octo?");
        assert_eq!(requests[1], "https://api.example.com/users/octo/repos?page=1&per_page=100");
        assert_eq!(requests[2], "https://api.example.com/users/octo/repos?page=2&per_page=100");
        assert_eq!(requests[3], "https://badges.example.com/api?username=octo&include_all_commits=true");
        assert_eq!(requests[4], "https://badges.example.com/api?username=octo&show=prs_merged,prs_merged_percentage");
    }

    #[tokio::test]
    async fn test_profile_failure_makes_everything_unavailable() {
        let client = service(|url, _| (url.path() == "/users/octo").then(|| Ok(HttpResponse::new(500, ""))));
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats, RemoteStats::unavailable());
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_profile_makes_everything_unavailable() {
        let client = service(|url, _| (url.path() == "/users/octo").then(|| Ok(HttpResponse::new(200, "<html>"))));
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;
        assert_eq!(stats, RemoteStats::unavailable());
    }

    #[tokio::test]
    async fn test_transport_error_on_profile() {
        let client = service(|url, _| (url.path() == "/users/octo").then(|| Err(anyhow!("connection refused"))));
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;
        assert_eq!(stats, RemoteStats::unavailable());
    }

    #[tokio::test]
    async fn test_pagination_failure_only_degrades_stars() {
        let client = service(|url, query| {
            (url.path() == "/users/octo/repos" && param(query, "page") == Some("2")).then(|| Ok(HttpResponse::new(502, "")))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.star_total, None);
        assert_eq!(stats.repo_count, Some(50));
        assert_eq!(stats.follower_count, Some(100));
        assert_eq!(stats.commit_count.as_deref(), Some("1.2k"));
        assert_eq!(stats.merged_prs.as_deref(), Some("40"));
    }

    #[tokio::test]
    async fn test_rate_limit_stops_pagination() {
        let client = service(|url, query| {
            (url.path() == "/users/octo/repos" && param(query, "page") == Some("2"))
                .then(|| Ok(HttpResponse::new(403, "").with_header("x-ratelimit-remaining", "0")))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.star_total, None);
        assert_eq!(stats.repo_count, Some(50));
        // profile, two repository pages, two badge cards; no page 3
        assert_eq!(client.request_count(), 5);
    }

    #[tokio::test]
    async fn test_page_limit_keeps_partial_total() {
        let client = service(|url, _| {
            (url.path() == "/users/octo/repos").then(|| Ok(HttpResponse::new(200, repo_page(&[1, 2]))))
        });
        let endpoints = Endpoints {
            max_repo_pages: 3,
            ..endpoints()
        };
        let stats = Provider::new(&client, endpoints).get_remote_stats("octo").await;

        assert_eq!(stats.star_total, Some(9));
        assert_eq!(client.request_count(), 6);
    }

    #[tokio::test]
    async fn test_missing_repos_url_only_degrades_stars() {
        let client = service(|url, _| {
            (url.path() == "/users/octo").then(|| Ok(HttpResponse::new(200, r#"{"public_repos": 3, "followers": 4}"#)))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.star_total, None);
        assert_eq!(stats.repo_count, Some(3));
        assert_eq!(stats.follower_count, Some(4));
        assert_eq!(stats.contribution_count.as_deref(), Some("14"));
    }

    #[tokio::test]
    async fn test_pull_request_card_failure_keeps_commit_fields() {
        let client = service(|url, query| {
            (url.path() == "/api" && param(query, "show").is_some()).then(|| Ok(HttpResponse::new(503, "")))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.merged_prs, None);
        assert_eq!(stats.merged_pr_percent, None);
        assert_eq!(stats.commit_count.as_deref(), Some("1.2k"));
        assert_eq!(stats.contribution_count.as_deref(), Some("14"));
        assert_eq!(stats.star_total, Some(35));
    }

    #[tokio::test]
    async fn test_commit_card_failure_keeps_pull_request_fields() {
        let client = service(|url, query| {
            (url.path() == "/api" && param(query, "include_all_commits").is_some()).then(|| Err(anyhow!("timed out")))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.commit_count, None);
        assert_eq!(stats.contribution_count, None);
        assert_eq!(stats.merged_prs.as_deref(), Some("40"));
        assert_eq!(stats.merged_pr_percent.as_deref(), Some("95%"));
    }

    #[tokio::test]
    async fn test_missing_text_node_only_degrades_that_field() {
        let client = service(|url, query| {
            (url.path() == "/api" && param(query, "show").is_some())
                .then(|| Ok(HttpResponse::new(200, r#"<svg><text data-testid="prs_merged">7</text></svg>"#)))
        });
        let stats = Provider::new(&client, endpoints()).get_remote_stats("octo").await;

        assert_eq!(stats.merged_prs.as_deref(), Some("7"));
        assert_eq!(stats.merged_pr_percent, None);
    }

    #[test]
    fn test_user_url() {
        let base = Url::parse("https://api.github.com").unwrap();
        assert_eq!(user_url(&base, "octo").unwrap().as_str(), "https://api.github.com/users/octo");

        let base = Url::parse("http://127.0.0.1:8080/github/").unwrap();
        assert_eq!(user_url(&base, "octo").unwrap().as_str(), "http://127.0.0.1:8080/github/users/octo");

        let base = Url::parse("https://api.github.com").unwrap();
        assert_eq!(user_url(&base, "a/b").unwrap().as_str(), "https://api.github.com/users/a%2Fb");

        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(user_url(&base, "octo").is_err());
    }
}
