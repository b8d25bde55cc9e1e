use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::cache::{ProductCache, ReviewCache};
use crate::event::{AdminEvent, Notice};
use crate::lock;
use crate::product::{Product, ProductId};
use crate::review::Review;
use crate::store::DocumentStore;
use crate::tracker::{SyncStatus, SyncTracker};

const EVENT_CAPACITY: usize = 256;

/// What to do with an optimistic stock value when the remote update fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StockFailurePolicy {
    /// Leave the new value in the cache until the next reload.
    #[default]
    Keep,
    /// Restore the value the cache held before the adjustment.
    Rollback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub stock_failure: StockFailurePolicy,
}

/// Everything one console session operates on: the store client, both
/// caches, the in-flight tracker and the event stream the presentation
/// subscribes to.
///
/// Cache locks are never held across a store call, so operations on
/// different entities interleave freely.
pub struct AdminContext {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) tracker: SyncTracker,
    pub(crate) events: broadcast::Sender<AdminEvent>,
    pub(crate) products: Mutex<ProductCache>,
    pub(crate) reviews: Mutex<ReviewCache>,
    pub(crate) options: SyncOptions,
}

impl AdminContext {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, SyncOptions::default())
    }

    pub fn with_options(store: Arc<dyn DocumentStore>, options: SyncOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            tracker: SyncTracker::new(events.clone()),
            events,
            products: Mutex::new(ProductCache::default()),
            reviews: Mutex::new(ReviewCache::default()),
            options,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdminEvent> {
        self.events.subscribe()
    }

    /// Sender half of the event stream, for collaborators that report
    /// notices alongside the context (such as the image publisher).
    pub fn event_sender(&self) -> broadcast::Sender<AdminEvent> {
        self.events.clone()
    }

    pub fn tracker(&self) -> &SyncTracker {
        &self.tracker
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.tracker.status()
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Snapshot of the product cache.
    pub fn products(&self) -> Vec<Product> {
        lock(&self.products).products().to_vec()
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        lock(&self.products).get(id).cloned()
    }

    pub fn next_product_id(&self) -> ProductId {
        lock(&self.products).next_id()
    }

    /// Snapshot of the review cache, newest first.
    pub fn reviews(&self) -> Vec<Review> {
        lock(&self.reviews).reviews().to_vec()
    }

    pub(crate) fn emit(&self, event: AdminEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.emit(AdminEvent::Notice(notice));
    }
}
