use tracing::{debug, warn};

use crate::catalog::DeleteOutcome;
use crate::confirm::Confirm;
use crate::context::AdminContext;
use crate::error::AdminError;
use crate::event::{AdminEvent, Notice};
use crate::lock;
use crate::review::{Review, ReviewId};
use crate::store::{Direction, REVIEWS};
use crate::tracker::EntityKey;

/// Field reviews are listed by, newest first.
pub const REVIEW_ORDER_FIELD: &str = "date";

impl AdminContext {
    /// Replace the review cache with the store's reviews, newest first.
    ///
    /// Same contract as product loading: a store error or an undecodable
    /// review empties the cache.
    pub async fn load_reviews(&self) -> Result<usize, AdminError> {
        let _busy = self.tracker.track(EntityKey::Collection(REVIEWS));

        let decoded = match self
            .store
            .query_ordered(REVIEWS, REVIEW_ORDER_FIELD, Direction::Descending)
            .await
        {
            Ok(docs) => docs
                .into_iter()
                .map(|doc| Review::from_document(&doc.id, doc.fields))
                .collect::<Result<Vec<_>, _>>()
                .map_err(AdminError::Undecodable),
            Err(e) => Err(e.into()),
        };

        match decoded {
            Ok(reviews) => {
                let count = reviews.len();
                lock(&self.reviews).replace_all(reviews);
                self.emit(AdminEvent::ReviewsReplaced);
                debug!(count, "reviews loaded");
                Ok(count)
            }
            Err(e) => {
                lock(&self.reviews).clear();
                self.emit(AdminEvent::ReviewsReplaced);
                warn!(error = %e, "review load failed");
                self.notify(Notice::error(format!("Could not load reviews: {e}")));
                Err(e)
            }
        }
    }

    /// Delete a loaded review after the operator confirms.
    pub async fn delete_review(
        &self,
        id: &ReviewId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, AdminError> {
        let question = match lock(&self.reviews).get(id) {
            Some(r) => format!("Delete the review by {} ({}/5)?", r.author(), r.rating),
            None => return Err(AdminError::UnknownReview(id.clone())),
        };
        if !confirm.confirm(&question).await {
            return Ok(DeleteOutcome::Cancelled);
        }

        let result = {
            let _in_flight = self.tracker.track(EntityKey::Review(id.clone()));
            self.store.delete(REVIEWS, id.as_str()).await
        };

        match result {
            Ok(()) => {
                lock(&self.reviews).remove(id);
                self.emit(AdminEvent::ReviewRemoved(id.clone()));
                self.notify(Notice::success("Review deleted"));
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(review = %id, error = %e, "review delete failed");
                self.notify(Notice::error(format!("Could not delete review: {e}")));
                Err(e.into())
            }
        }
    }
}
