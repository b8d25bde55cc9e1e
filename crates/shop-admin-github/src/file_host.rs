use base64::Engine;
use reqwest::{Method, StatusCode, Url};
use tracing::debug;

use shop_admin::{FileHost, FileHostError, GitHubCredentials, PutFile, StoredFile};

use crate::content::{
    BranchResponse, ContentResponse, ErrorResponse, PutContentRequest, PutContentResponse,
};

const USER_AGENT: &str = "shop-admin";

/// Configuration for the GitHub file host.
#[derive(Debug, Clone, Default)]
pub struct GitHubFileHostConfig {
    pub api_base_url: Option<String>,
}

/// Stores files in a GitHub repository through the contents API.
///
/// Credentials are supplied per call, so one host serves whichever
/// repository the operator has configured.
pub struct GitHubFileHost {
    config: GitHubFileHostConfig,
    client: reqwest::Client,
}

impl Default for GitHubFileHost {
    fn default() -> Self {
        Self::new(GitHubFileHostConfig::default())
    }
}

impl GitHubFileHost {
    pub fn new(config: GitHubFileHostConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or("https://api.github.com")
    }

    /// `{base}/repos/{owner}/{repo}/{segments...}` with every segment
    /// percent-encoded on its own.
    fn repo_url<'a>(
        &self,
        creds: &'a GitHubCredentials,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, FileHostError> {
        let bad_base = || FileHostError::Network(format!("bad API URL: {}", self.api_base()));
        let mut url = Url::parse(self.api_base()).map_err(|_| bad_base())?;
        url.path_segments_mut()
            .map_err(|()| bad_base())?
            .pop_if_empty()
            .extend(["repos", creds.owner.as_str(), creds.repo.as_str()])
            .extend(segments.into_iter().filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn contents_url<'a>(
        &self,
        creds: &'a GitHubCredentials,
        path: &'a str,
    ) -> Result<Url, FileHostError> {
        self.repo_url(creds, std::iter::once("contents").chain(path.split('/')))
    }

    fn build_request(
        &self,
        method: Method,
        url: Url,
        creds: &GitHubCredentials,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", creds.token))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, FileHostError> {
        req.send()
            .await
            .map_err(|e| FileHostError::Network(e.to_string()))
    }
}

/// The `message` GitHub puts in error bodies, or the status reason.
async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned(),
    }
}

async fn rejected(response: reqwest::Response) -> FileHostError {
    let status = response.status();
    let message = error_message(response).await;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FileHostError::Unauthorized(message),
        _ => FileHostError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait::async_trait]
impl FileHost for GitHubFileHost {
    async fn branch_head(&self, creds: &GitHubCredentials) -> Result<String, FileHostError> {
        let url = self.repo_url(
            creds,
            std::iter::once("branches").chain(creds.branch.split('/')),
        )?;
        let response = self
            .send(self.build_request(Method::GET, url, creds))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FileHostError::BranchNotFound(creds.branch.clone()));
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let branch: BranchResponse = response
            .json()
            .await
            .map_err(|e| FileHostError::Decode(e.to_string()))?;
        debug!(branch = %branch.name, head = %branch.commit.sha, "branch head");
        Ok(branch.commit.sha)
    }

    async fn blob_sha(
        &self,
        creds: &GitHubCredentials,
        path: &str,
    ) -> Result<Option<String>, FileHostError> {
        let mut url = self.contents_url(creds, path)?;
        url.query_pairs_mut().append_pair("ref", &creds.branch);
        let response = self
            .send(self.build_request(Method::GET, url, creds))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "no blob at path");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        // A directory answers with an array and fails to decode here.
        let content: ContentResponse = response
            .json()
            .await
            .map_err(|e| FileHostError::Decode(e.to_string()))?;
        debug!(path = %content.path, sha = %content.sha, size = content.size, "existing blob");
        Ok(Some(content.sha))
    }

    async fn put_file(
        &self,
        creds: &GitHubCredentials,
        file: PutFile,
    ) -> Result<StoredFile, FileHostError> {
        let url = self.contents_url(creds, &file.path)?;
        let body = PutContentRequest {
            message: &file.message,
            content: base64::engine::general_purpose::STANDARD.encode(&file.content),
            branch: &creds.branch,
            sha: file.prior_sha.as_deref(),
        };

        let response = self
            .send(self.build_request(Method::PUT, url, creds).json(&body))
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => {}
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                return Err(FileHostError::Conflict(error_message(response).await));
            }
            _ => return Err(rejected(response).await),
        }

        let stored: PutContentResponse = response
            .json()
            .await
            .map_err(|e| FileHostError::Decode(e.to_string()))?;
        debug!(path = %stored.content.path, sha = %stored.content.sha, %status, "file written");

        Ok(StoredFile {
            path: stored.content.path,
            sha: stored.content.sha,
            created: status == StatusCode::CREATED,
        })
    }

    async fn check_access(&self, creds: &GitHubCredentials) -> Result<(), FileHostError> {
        let url = self.repo_url(creds, [])?;
        let response = self
            .send(self.build_request(Method::GET, url, creds))
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        debug!(target_repo = %creds.target(), "repository reachable");
        Ok(())
    }
}
