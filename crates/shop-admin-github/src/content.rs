use serde::{Deserialize, Serialize};

/// A file entry from GitHub's Contents API.
/// `GET /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Deserialize)]
pub struct ContentResponse {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
}

/// `GET /repos/{owner}/{repo}/branches/{branch}`
#[derive(Debug, Deserialize)]
pub struct BranchResponse {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Serialize)]
pub struct PutContentRequest<'a> {
    pub message: &'a str,
    /// Base64 of the raw file bytes.
    pub content: String,
    pub branch: &'a str,
    /// Blob being replaced. GitHub rejects an overwrite without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct PutContentResponse {
    pub content: ContentResponse,
}

/// Error body GitHub returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}
