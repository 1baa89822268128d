//! GitHub REST v3 implementation of [`IssueTracker`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TrackerError;
use crate::tracker::IssueTracker;
use crate::types::{Issue, LabelInfo, ListParams};

const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub API client for issue operations.
#[derive(Debug, Clone)]
pub struct GitHubTracker {
    client: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
}

/// GitHub issue as returned by the REST API.
#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    labels: Vec<GhLabel>,
    html_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Present when the "issue" is actually a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
    description: Option<String>,
}

/// PATCH body for label updates.
#[derive(Debug, Serialize)]
struct UpdateLabelsRequest<'a> {
    labels: &'a [String],
}

impl From<GhIssue> for Issue {
    fn from(gh: GhIssue) -> Self {
        Self {
            number: gh.number,
            title: gh.title,
            body: gh.body.unwrap_or_default(),
            labels: gh.labels.into_iter().map(|l| l.name).collect(),
            url: gh.html_url,
            created_at: gh.created_at,
            updated_at: gh.updated_at,
        }
    }
}

impl GitHubTracker {
    /// Create a new client for `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the
    /// repository slug is not `owner/repo`.
    pub fn new(token: &str, repo_slug: &str) -> Result<Self, TrackerError> {
        let (owner, repo) = repo_slug
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| {
                TrackerError::Parse(format!(
                    "invalid repository slug (expected owner/repo): {repo_slug}"
                ))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("dupscan/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{GITHUB_API_URL}/repos/{}/{}/issues",
            self.owner, self.repo
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Api { status, body })
    }
}

/// Build the query string for a listing request.
fn list_query(params: &ListParams) -> String {
    let mut query = format!(
        "state={}&sort={}&direction={}&per_page={}",
        params.state.as_str(),
        params.sort.as_str(),
        params.direction.as_str(),
        params.count.clamp(1, 100),
    );
    if let Some(since) = params.since {
        query.push_str("&since=");
        query.push_str(&urlencoding::encode(&since.to_rfc3339()));
    }
    if let Some(label) = &params.label {
        query.push_str("&labels=");
        query.push_str(&urlencoding::encode(label));
    }
    query
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn get_issue(&self, number: u64) -> Result<Option<Issue>, TrackerError> {
        let url = format!("{}/{number}", self.issues_url());
        debug!(owner = %self.owner, repo = %self.repo, number, "Fetching issue");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let gh: GhIssue = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Parse(format!("issue {number}: {e}")))?;

        if gh.pull_request.is_some() {
            warn!(number, "Requested number is a pull request, not an issue");
            return Ok(None);
        }
        Ok(Some(gh.into()))
    }

    async fn list_issues(&self, params: &ListParams) -> Result<Vec<Issue>, TrackerError> {
        let url = format!("{}?{}", self.issues_url(), list_query(params));
        debug!(owner = %self.owner, repo = %self.repo, url = %url, "Listing issues");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let issues: Vec<GhIssue> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Parse(format!("issue list: {e}")))?;

        // The issues endpoint interleaves pull requests; drop them.
        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect())
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>, TrackerError> {
        let url = format!(
            "{GITHUB_API_URL}/repos/{}/{}/labels?per_page=100",
            self.owner, self.repo
        );

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let labels: Vec<GhLabel> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Parse(format!("label list: {e}")))?;

        Ok(labels
            .into_iter()
            .map(|l| LabelInfo {
                name: l.name,
                description: l.description.unwrap_or_default(),
            })
            .collect())
    }

    async fn update_labels(&self, number: u64, labels: &[String]) -> Result<(), TrackerError> {
        let url = format!("{}/{number}", self.issues_url());
        debug!(number, ?labels, "Updating issue labels");

        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&UpdateLabelsRequest { labels })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, IssueState, SortKey};

    #[test]
    fn test_new_rejects_bad_slug() {
        assert!(GitHubTracker::new("t", "noslash").is_err());
        assert!(GitHubTracker::new("t", "a/b/c").is_err());
        assert!(GitHubTracker::new("t", "/repo").is_err());
        assert!(GitHubTracker::new("t", "owner/repo").is_ok());
    }

    #[test]
    fn test_list_query_basic() {
        let params = ListParams {
            state: IssueState::Open,
            sort: SortKey::Updated,
            direction: Direction::Desc,
            count: 30,
            since: None,
            label: None,
        };
        assert_eq!(
            list_query(&params),
            "state=open&sort=updated&direction=desc&per_page=30"
        );
    }

    #[test]
    fn test_list_query_encodes_label_and_since() {
        let params = ListParams {
            state: IssueState::All,
            sort: SortKey::Created,
            direction: Direction::Desc,
            count: 500,
            since: Some("2024-01-02T03:04:05Z".parse().unwrap()),
            label: Some("help wanted".to_string()),
        };
        let q = list_query(&params);
        // count is clamped to the API page-size limit
        assert!(q.contains("per_page=100"));
        assert!(q.contains("labels=help%20wanted"));
        assert!(q.contains("since=2024-01-02T03%3A04%3A05"));
    }
}
