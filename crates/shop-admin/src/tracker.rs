use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::event::AdminEvent;
use crate::lock;
use crate::product::ProductId;
use crate::review::ReviewId;

/// Something that can have a remote round trip outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Product(ProductId),
    Review(ReviewId),
    /// A whole-collection read, such as a bulk load.
    Collection(&'static str),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(id) => write!(f, "product {id}"),
            Self::Review(id) => write!(f, "review {id}"),
            Self::Collection(name) => write!(f, "{name}"),
        }
    }
}

/// Status derived from the size of the in-flight set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing(usize),
}

impl SyncStatus {
    fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Idle
        } else {
            Self::Syncing(count)
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    /// Banner text, or `None` when the banner should be hidden.
    pub fn banner(self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Syncing(n) => Some(format!("Syncing ({n})\u{2026}")),
        }
    }
}

/// Tracks which entities are awaiting a remote write, delete or load.
///
/// Membership is a set, not a counter: beginning twice for one key and
/// ending once clears it. Every membership change publishes the recomputed
/// status on the event stream.
pub struct SyncTracker {
    in_flight: Mutex<HashSet<EntityKey>>,
    events: broadcast::Sender<AdminEvent>,
}

impl SyncTracker {
    pub fn new(events: broadcast::Sender<AdminEvent>) -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
            events,
        }
    }

    pub fn begin(&self, key: EntityKey) -> SyncStatus {
        let status = {
            let mut set = lock(&self.in_flight);
            set.insert(key);
            SyncStatus::from_count(set.len())
        };
        self.publish(status);
        status
    }

    pub fn end(&self, key: &EntityKey) -> SyncStatus {
        let status = {
            let mut set = lock(&self.in_flight);
            set.remove(key);
            SyncStatus::from_count(set.len())
        };
        self.publish(status);
        status
    }

    /// Begin tracking `key` until the returned guard is dropped.
    pub fn track(&self, key: EntityKey) -> InFlight<'_> {
        self.begin(key.clone());
        InFlight { tracker: self, key }
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus::from_count(lock(&self.in_flight).len())
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        lock(&self.in_flight).contains(key)
    }

    fn publish(&self, status: SyncStatus) {
        // No subscribers is fine; the status is still queryable.
        let _ = self.events.send(AdminEvent::Status(status));
    }
}

/// Ends its key on drop, so every exit path of an operation unregisters.
pub struct InFlight<'a> {
    tracker: &'a SyncTracker,
    key: EntityKey,
}

impl InFlight<'_> {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tracker.end(&self.key);
    }
}
