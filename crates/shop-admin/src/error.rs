use crate::images::FileHostError;
use crate::product::ProductId;
use crate::review::ReviewId;
use crate::store::StoreError;

/// Failures surfaced by console operations.
///
/// None of them are fatal: the caches stay consistent and usable after
/// any of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The document store could not complete a load, write or delete.
    #[error("remote store unavailable: {0}")]
    Remote(#[from] StoreError),

    /// An import payload was rejected before any write.
    #[error("invalid import: {0}")]
    InvalidImport(String),

    /// Image publishing needs file host credentials and none were provided.
    #[error("no file host credentials configured")]
    NoCredentials,

    /// A stored document did not decode; the load that read it was abandoned.
    #[error("unreadable document: {0}")]
    Undecodable(String),

    #[error(transparent)]
    FileHost(#[from] FileHostError),

    /// New products need the id range of a loaded catalog.
    #[error("products are not loaded")]
    NotLoaded,

    #[error("product {0} is not in the catalog")]
    UnknownProduct(ProductId),

    #[error("review {0} is not loaded")]
    UnknownReview(ReviewId),
}

impl AdminError {
    /// True for file host overwrite conflicts; the caller must re-probe.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::FileHost(FileHostError::Conflict(_)))
    }
}
