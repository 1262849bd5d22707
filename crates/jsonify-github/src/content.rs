use base64::Engine;
use serde::{Deserialize, Serialize};

/// Response from GitHub's Contents API for a single file.
/// `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}`
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub sha: String,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
///
/// `sha` is left out entirely when creating; GitHub treats a present
/// `sha` as "update this blob".
#[derive(Debug, Serialize)]
pub struct PutContentRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Serialize)]
pub struct CreateRepoRequest<'a> {
    pub name: &'a str,
    pub auto_init: bool,
    pub private: bool,
}

/// The parts of the created repository we care about.
#[derive(Debug, Deserialize)]
pub struct CreateRepoResponse {
    pub name: String,
    pub owner: RepoOwner,
}

#[derive(Debug, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Encode file bytes the way the Contents API expects them.
pub fn encode_content(content: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(content)
}
