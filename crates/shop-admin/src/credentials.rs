use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH: &str = "main";

/// Access to the repository that hosts product images.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubCredentials {
    pub token: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl GitHubCredentials {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: Option<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(default_branch),
        }
    }

    /// `owner/repo@branch`, for messages.
    pub fn target(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

impl fmt::Debug for GitHubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubCredentials")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .finish()
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

/// Supplies credentials when an upload needs them.
///
/// Implementations may read saved settings, ask the operator, or both.
/// Returning `None` aborts the upload with `NoCredentials`.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Option<GitHubCredentials>;
}

#[async_trait::async_trait]
impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    async fn credentials(&self) -> Option<GitHubCredentials> {
        (**self).credentials().await
    }
}

/// A fixed answer, set once.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<GitHubCredentials>);

#[async_trait::async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Option<GitHubCredentials> {
        self.0.clone()
    }
}
