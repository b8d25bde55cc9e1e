pub mod cache;
pub mod catalog;
pub mod confirm;
pub mod context;
pub mod credentials;
pub mod error;
pub mod event;
pub mod images;
pub mod product;
pub mod review;
pub mod reviews;
pub mod store;
pub mod tracker;

pub use catalog::{DeleteOutcome, ImportFailure, ImportReport, SaveOutcome, StockChange};
pub use confirm::{Always, Confirm};
pub use context::{AdminContext, StockFailurePolicy, SyncOptions};
pub use credentials::{CredentialProvider, GitHubCredentials, StaticCredentials};
pub use error::AdminError;
pub use event::{AdminEvent, Notice};
pub use images::{FileHost, FileHostError, ImagePublisher, PublishOutcome, PutFile, StoredFile};
pub use product::{Category, Product, ProductDraft, ProductId, StockAdjustment, image_path_for};
pub use review::{Review, ReviewId};
pub use store::{Direction, Document, DocumentStore, StoreError, StoredDocument};
pub use tracker::{EntityKey, SyncStatus, SyncTracker};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a cache mutex. A panic elsewhere never leaves the caches in a
/// half-written state, so poisoning is ignored.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
