use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::credentials::{CredentialProvider, GitHubCredentials};
use crate::error::AdminError;
use crate::event::{AdminEvent, Notice};
use crate::product::{ProductId, image_path_for};

/// Errors that can occur when talking to the file host.
#[derive(Debug, thiserror::Error)]
pub enum FileHostError {
    #[error("network error: {0}")]
    Network(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Overwrite rejected because the prior hash was missing or stale.
    /// Carries the host's message unchanged.
    #[error("{0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// A write to submit to the file host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFile {
    pub path: String,
    pub message: String,
    pub content: Vec<u8>,
    /// Hash of the blob being replaced. Must be present exactly when the
    /// path already holds a blob.
    pub prior_sha: Option<String>,
}

/// The host's record of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub sha: String,
    pub created: bool,
}

/// A version-controlled file host keyed by owner/repo/branch/path.
#[async_trait::async_trait]
pub trait FileHost: Send + Sync {
    /// Head commit of the configured branch.
    async fn branch_head(&self, creds: &GitHubCredentials) -> Result<String, FileHostError>;

    /// Hash of the blob at `path`, or `None` when nothing is there.
    async fn blob_sha(
        &self,
        creds: &GitHubCredentials,
        path: &str,
    ) -> Result<Option<String>, FileHostError>;

    async fn put_file(
        &self,
        creds: &GitHubCredentials,
        file: PutFile,
    ) -> Result<StoredFile, FileHostError>;

    /// Confirm the repository is reachable with these credentials.
    async fn check_access(&self, creds: &GitHubCredentials) -> Result<(), FileHostError>;
}

#[async_trait::async_trait]
impl<T: FileHost + ?Sized> FileHost for Arc<T> {
    async fn branch_head(&self, creds: &GitHubCredentials) -> Result<String, FileHostError> {
        (**self).branch_head(creds).await
    }

    async fn blob_sha(
        &self,
        creds: &GitHubCredentials,
        path: &str,
    ) -> Result<Option<String>, FileHostError> {
        (**self).blob_sha(creds, path).await
    }

    async fn put_file(
        &self,
        creds: &GitHubCredentials,
        file: PutFile,
    ) -> Result<StoredFile, FileHostError> {
        (**self).put_file(creds, file).await
    }

    async fn check_access(&self, creds: &GitHubCredentials) -> Result<(), FileHostError> {
        (**self).check_access(creds).await
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub path: String,
    /// True when no blob existed at the path before.
    pub created: bool,
    pub content_sha: String,
}

/// Pushes raw image bytes to the file host.
pub struct ImagePublisher {
    host: Arc<dyn FileHost>,
    credentials: Arc<dyn CredentialProvider>,
    events: Option<broadcast::Sender<AdminEvent>>,
}

impl ImagePublisher {
    pub fn new(host: Arc<dyn FileHost>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            host,
            credentials,
            events: None,
        }
    }

    /// Report notices on an admin event stream.
    pub fn with_events(mut self, events: broadcast::Sender<AdminEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Upload `bytes` to `target_path`, creating or overwriting.
    ///
    /// Any network failure aborts the whole upload; nothing is retried.
    pub async fn publish(
        &self,
        bytes: &[u8],
        target_path: &str,
    ) -> Result<PublishOutcome, AdminError> {
        let result = self.try_publish(bytes, target_path).await;

        match &result {
            Ok(outcome) => self.notify(Notice::success(format!(
                "Image uploaded to {}",
                outcome.path
            ))),
            Err(e) => {
                warn!(path = target_path, error = %e, "image upload failed");
                self.notify(Notice::error(format!("Image upload failed: {e}")));
            }
        }

        result
    }

    /// Upload an image for a product under `images/product<id>.<ext>`.
    pub async fn publish_for_product(
        &self,
        id: ProductId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PublishOutcome, AdminError> {
        self.publish(bytes, &image_path_for(id, file_name)).await
    }

    /// Verify saved credentials against the host.
    pub async fn check_access(&self) -> Result<(), AdminError> {
        let creds = self
            .credentials
            .credentials()
            .await
            .ok_or(AdminError::NoCredentials)?;
        self.host.check_access(&creds).await?;
        Ok(())
    }

    async fn try_publish(
        &self,
        bytes: &[u8],
        target_path: &str,
    ) -> Result<PublishOutcome, AdminError> {
        let creds = self
            .credentials
            .credentials()
            .await
            .ok_or(AdminError::NoCredentials)?;

        // Only proves the branch exists; the head itself is not needed.
        let head = self.host.branch_head(&creds).await?;
        debug!(branch = %creds.branch, head = %head, "branch resolved");

        let prior_sha = self.host.blob_sha(&creds, target_path).await?;
        let created = prior_sha.is_none();

        let file_name = target_path.rsplit('/').next().unwrap_or(target_path);
        let stored = self
            .host
            .put_file(
                &creds,
                PutFile {
                    path: target_path.to_owned(),
                    message: format!("Add product image: {file_name}"),
                    content: bytes.to_vec(),
                    prior_sha,
                },
            )
            .await?;

        debug!(path = %stored.path, sha = %stored.sha, created, "image stored");

        Ok(PublishOutcome {
            path: stored.path,
            created,
            content_sha: stored.sha,
        })
    }

    fn notify(&self, notice: Notice) {
        if let Some(events) = &self.events {
            let _ = events.send(AdminEvent::Notice(notice));
        }
    }
}
