use std::fmt;
use std::time::Duration;

use jsonify::{
    ContentStore, NewRepository, RemoteFile, RepositoryRef, Resolution, SyncError, SyncRequest,
    TRANSPORT_FAILURE_STATUS, UpsertOutcome, VersionToken,
};
use reqwest::{Method, StatusCode, Url};

use crate::content::{
    ContentResponse, CreateRepoRequest, CreateRepoResponse, PutContentRequest, encode_content,
};

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Upper bound on one HTTP exchange, connect through body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a GitHub content store.
#[derive(Clone)]
pub struct GitHubContentStoreConfig {
    pub token: String,
    pub api_base_url: Option<String>,
}

impl fmt::Debug for GitHubContentStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubContentStoreConfig")
            .field("token", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Errors constructing a [`GitHubContentStore`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Reads and writes repository files through GitHub's Contents API.
///
/// Each call is a single HTTP exchange; nothing is cached between calls.
#[derive(Debug)]
pub struct GitHubContentStore {
    config: GitHubContentStoreConfig,
    api_base: Url,
    client: reqwest::Client,
}

impl GitHubContentStore {
    pub fn new(config: GitHubContentStoreConfig) -> Result<Self, ConfigError> {
        Self::with_timeout(config, DEFAULT_REQUEST_TIMEOUT)
    }

    /// A stalled exchange fails as a transport error once `timeout` passes.
    pub fn with_timeout(
        config: GitHubContentStoreConfig,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let raw = config.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        let api_base = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        if api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: raw.to_owned(),
                reason: "URL cannot be used as a base".into(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            config,
            api_base,
            client,
        })
    }

    fn build_request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("User-Agent", "jsonify")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.config.token)
    }

    /// `{base}/{segments...}`, each segment percent-encoded on its own.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(segments.into_iter().filter(|s| !s.is_empty()));
        }
        url
    }

    fn contents_url(&self, target: &RemoteFile) -> Url {
        let repo = &target.repository;
        let fixed = ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"];
        self.endpoint(fixed.into_iter().chain(target.path.split('/')))
    }
}

/// Read a response body for an error report, without failing twice.
async fn body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

#[async_trait::async_trait]
impl ContentStore for GitHubContentStore {
    fn label(&self) -> &str {
        self.api_base.as_str()
    }

    async fn resolve_version(&self, target: &RemoteFile) -> Result<Resolution, SyncError> {
        let mut url = self.contents_url(target);
        url.query_pairs_mut().append_pair("ref", &target.branch);

        let fail = |status: u16, body: String| SyncError::Resolve {
            path: target.path.clone(),
            status,
            body,
        };

        let response = self
            .build_request(Method::GET, url)
            .send()
            .await
            .map_err(|e| fail(TRANSPORT_FAILURE_STATUS, e.to_string()))?;

        let status = response.status();
        tracing::debug!(method = "GET", path = %target.path, status = status.as_u16(), "contents lookup");

        if status == StatusCode::NOT_FOUND {
            return Ok(Resolution::Absent);
        }

        let body = body_text(response).await;

        if !status.is_success() {
            return Err(fail(status.as_u16(), body));
        }

        // Directories come back as arrays and fail here, which is what we want.
        match serde_json::from_str::<ContentResponse>(&body) {
            Ok(content) => Ok(Resolution::Found(VersionToken::new(content.sha))),
            Err(_) => Err(fail(status.as_u16(), body)),
        }
    }

    async fn upsert(&self, request: &SyncRequest) -> Result<UpsertOutcome, SyncError> {
        let target = &request.target;
        let url = self.contents_url(target);

        let payload = PutContentRequest {
            message: &request.message,
            content: encode_content(&request.content),
            branch: &target.branch,
            sha: request.version.as_ref().map(VersionToken::as_str),
        };

        let fail = |status: u16, body: String| SyncError::Write {
            path: target.path.clone(),
            status,
            body,
        };

        let response = self
            .build_request(Method::PUT, url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| fail(TRANSPORT_FAILURE_STATUS, e.to_string()))?;

        let status = response.status();
        tracing::debug!(
            method = "PUT",
            path = %target.path,
            update = payload.sha.is_some(),
            status = status.as_u16(),
            "contents write"
        );

        match status.as_u16() {
            201 => Ok(UpsertOutcome::Created),
            200 => Ok(UpsertOutcome::Updated),
            other => Err(fail(other, body_text(response).await)),
        }
    }

    async fn create_repository(&self, repository: &NewRepository) -> Result<RepositoryRef, SyncError> {
        let url = self.endpoint(["user", "repos"]);
        let payload = CreateRepoRequest {
            name: &repository.name,
            auto_init: true,
            private: repository.private,
        };

        let requested = repository.repository();
        let fail = |status: u16, body: String| SyncError::CreateRepository {
            repository: requested.to_string(),
            status,
            body,
        };

        let response = self
            .build_request(Method::POST, url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| fail(TRANSPORT_FAILURE_STATUS, e.to_string()))?;

        let status = response.status();
        tracing::debug!(method = "POST", repository = %requested, status = status.as_u16(), "create repository");

        let body = body_text(response).await;
        if status != StatusCode::CREATED {
            return Err(fail(status.as_u16(), body));
        }

        // GitHub creates under the authenticated user, which may differ from
        // the owner the operator typed.
        match serde_json::from_str::<CreateRepoResponse>(&body) {
            Ok(created) => Ok(RepositoryRef::new(created.owner.login, created.name)),
            Err(e) => {
                tracing::warn!(repository = %requested, error = %e, "unreadable create response, assuming requested owner");
                Ok(requested)
            }
        }
    }
}
