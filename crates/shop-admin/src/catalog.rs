use serde_json::Value;
use tracing::{debug, warn};

use crate::confirm::Confirm;
use crate::context::{AdminContext, StockFailurePolicy};
use crate::error::AdminError;
use crate::event::{AdminEvent, Notice};
use crate::lock;
use crate::product::{Product, ProductDraft, ProductId, StockAdjustment};
use crate::store::{Document, PRODUCTS, StoreError};
use crate::tracker::EntityKey;

/// Whether a save added a product or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// The remote store accepted the new value.
    Updated { previous: u32, current: u32 },
    /// The adjustment would leave the valid range; nothing was sent.
    Unchanged { current: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The operator declined; no state changed.
    Cancelled,
}

/// Summary of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub total: usize,
    pub saved: usize,
    /// The write that stopped the import. Products after it were not attempted.
    pub failure: Option<ImportFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub id: ProductId,
    pub error: String,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

impl AdminContext {
    /// Replace the product cache with the current contents of the store.
    ///
    /// The load is all or nothing: a store error or a document that does
    /// not decode as a product empties the cache rather than leaving it
    /// stale or partial. A partial cache would hand out ids that are
    /// already taken.
    pub async fn load_products(&self) -> Result<usize, AdminError> {
        let _busy = self.tracker.track(EntityKey::Collection(PRODUCTS));

        let decoded = match self.store.get_all(PRODUCTS).await {
            Ok(docs) => docs
                .into_iter()
                .map(|doc| Product::from_document(&doc.id, doc.fields))
                .collect::<Result<Vec<_>, _>>()
                .map_err(AdminError::Undecodable),
            Err(e) => Err(e.into()),
        };

        match decoded {
            Ok(products) => {
                let count = products.len();
                lock(&self.products).replace_all(products);
                self.emit(AdminEvent::ProductsReplaced);
                debug!(count, "products loaded");
                Ok(count)
            }
            Err(e) => {
                lock(&self.products).clear();
                self.emit(AdminEvent::ProductsReplaced);
                warn!(error = %e, "product load failed");
                self.notify(Notice::error(format!("Could not load products: {e}")));
                Err(e)
            }
        }
    }

    /// Write a full product to the store, then merge it into the cache.
    ///
    /// The cache only changes after the store accepts the write; a failed
    /// save leaves it exactly as it was.
    pub async fn save_product(&self, product: Product) -> Result<SaveOutcome, AdminError> {
        let id = product.id;
        match self.persist_product(product).await {
            Ok(outcome) => {
                self.notify(Notice::success(match outcome {
                    SaveOutcome::Created => format!("Product {id} added"),
                    SaveOutcome::Updated => format!("Product {id} updated"),
                }));
                Ok(outcome)
            }
            Err(e) => {
                warn!(product = %id, error = %e, "product save failed");
                self.notify(Notice::error(format!("Could not save product {id}: {e}")));
                Err(e.into())
            }
        }
    }

    /// Allocate the next id for `draft` and save it.
    ///
    /// Fails with [`AdminError::NotLoaded`] until products have been
    /// loaded successfully.
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, AdminError> {
        let id = lock(&self.products)
            .allocate_id()
            .ok_or(AdminError::NotLoaded)?;
        let product = draft.into_product(id);
        self.save_product(product.clone()).await?;
        Ok(product)
    }

    async fn persist_product(&self, product: Product) -> Result<SaveOutcome, StoreError> {
        let id = product.id;
        {
            let _in_flight = self.tracker.track(EntityKey::Product(id));
            self.store
                .set(PRODUCTS, &id.doc_id(), product.to_document())
                .await?;
        }

        let created = lock(&self.products).upsert(product);
        self.emit(AdminEvent::ProductChanged(id));
        Ok(if created {
            SaveOutcome::Created
        } else {
            SaveOutcome::Updated
        })
    }

    /// Set a product's stock.
    ///
    /// The cache shows the new value before the store confirms it. If the
    /// store then rejects the update, the cache keeps the new value (or
    /// reverts, under `StockFailurePolicy::Rollback`) and an error is
    /// reported.
    pub async fn update_stock(
        &self,
        id: ProductId,
        new_stock: u32,
    ) -> Result<StockChange, AdminError> {
        let previous = lock(&self.products)
            .set_stock(id, new_stock)
            .ok_or(AdminError::UnknownProduct(id))?;
        self.emit(AdminEvent::ProductChanged(id));

        let mut fields = Document::new();
        fields.insert("stock".into(), Value::from(new_stock));

        let result = {
            let _in_flight = self.tracker.track(EntityKey::Product(id));
            self.store.update(PRODUCTS, &id.doc_id(), fields).await
        };

        match result {
            Ok(()) => {
                debug!(product = %id, previous, current = new_stock, "stock updated");
                Ok(StockChange::Updated {
                    previous,
                    current: new_stock,
                })
            }
            Err(e) => {
                if self.options.stock_failure == StockFailurePolicy::Rollback {
                    self.rollback_stock(id, new_stock, previous);
                }
                warn!(product = %id, error = %e, "stock update failed");
                self.notify(Notice::error(format!(
                    "Could not update stock for product {id}: {e}"
                )));
                Err(e.into())
            }
        }
    }

    /// Apply one stock control click. Decrementing at zero does nothing.
    pub async fn adjust_stock(
        &self,
        id: ProductId,
        adjustment: StockAdjustment,
    ) -> Result<StockChange, AdminError> {
        let current = lock(&self.products)
            .get(id)
            .map(|p| p.stock)
            .ok_or(AdminError::UnknownProduct(id))?;

        match adjustment.apply(current) {
            Some(new_stock) => self.update_stock(id, new_stock).await,
            None => Ok(StockChange::Unchanged { current }),
        }
    }

    fn rollback_stock(&self, id: ProductId, optimistic: u32, previous: u32) {
        let mut cache = lock(&self.products);
        // A later adjustment may already have replaced our value.
        if cache.get(id).is_some_and(|p| p.stock == optimistic) {
            cache.set_stock(id, previous);
            drop(cache);
            self.emit(AdminEvent::ProductChanged(id));
        }
    }

    /// Delete a product after the operator confirms.
    pub async fn delete_product(
        &self,
        id: ProductId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, AdminError> {
        let question = match self.product(id) {
            Some(p) => format!("Delete product {id} ({})?", p.title),
            None => format!("Delete product {id}?"),
        };
        if !confirm.confirm(&question).await {
            return Ok(DeleteOutcome::Cancelled);
        }

        let result = {
            let _in_flight = self.tracker.track(EntityKey::Product(id));
            self.store.delete(PRODUCTS, &id.doc_id()).await
        };

        match result {
            Ok(()) => {
                lock(&self.products).remove(id);
                self.emit(AdminEvent::ProductRemoved(id));
                self.notify(Notice::success(format!("Product {id} deleted")));
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(product = %id, error = %e, "product delete failed");
                self.notify(Notice::error(format!("Could not delete product {id}: {e}")));
                Err(e.into())
            }
        }
    }

    /// Import products from JSON text. See [`AdminContext::import_all`].
    pub async fn import_json(&self, text: &str) -> Result<ImportReport, AdminError> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.import_all(value).await,
            Err(e) => Err(self.reject_import(format!("file is not valid JSON: {e}"))),
        }
    }

    /// Save every product in a non-empty JSON array, one at a time, then
    /// reload the cache from the store.
    ///
    /// The first failed write stops the import: earlier products stay
    /// saved, later ones are not attempted. Malformed input is rejected
    /// before anything is written.
    pub async fn import_all(&self, value: Value) -> Result<ImportReport, AdminError> {
        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => return Err(self.reject_import("the product list is empty".into())),
            _ => return Err(self.reject_import("expected an array of products".into())),
        };

        let mut products = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Product>(item) {
                Ok(product) => products.push(product),
                Err(e) => return Err(self.reject_import(format!("item {idx}: {e}"))),
            }
        }

        let total = products.len();
        let mut saved = 0;
        let mut failure = None;

        for product in products {
            let id = product.id;
            match self.persist_product(product).await {
                Ok(_) => saved += 1,
                Err(e) => {
                    warn!(product = %id, error = %e, "import stopped");
                    failure = Some(ImportFailure {
                        id,
                        error: e.to_string(),
                    });
                    break;
                }
            }
        }

        // Show exactly what the store accepted, whatever happened above.
        self.load_products().await?;

        match &failure {
            None => self.notify(Notice::success(format!("Imported {saved} products"))),
            Some(f) => self.notify(Notice::error(format!(
                "Import stopped at product {} after {saved} of {total}: {}",
                f.id, f.error
            ))),
        }

        Ok(ImportReport {
            total,
            saved,
            failure,
        })
    }

    fn reject_import(&self, reason: String) -> AdminError {
        self.notify(Notice::error(format!("Invalid import file: {reason}")));
        AdminError::InvalidImport(reason)
    }

    /// The whole product cache as pretty-printed JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.products())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::confirm::Always;
    use crate::product::{Category, PLACEHOLDER_IMAGE};
    use crate::test_support::{InMemoryStore, drain_events};
    use crate::tracker::SyncStatus;

    use super::*;

    fn pid(id: u64) -> ProductId {
        ProductId::new(id).unwrap()
    }

    fn product(id: u64, stock: u32) -> Product {
        Product {
            id: pid(id),
            title: format!("Product {id}"),
            price: 500,
            category: Category::Pods,
            stock,
            image: format!("images/product{id}.jpg"),
        }
    }

    async fn loaded(store: &Arc<InMemoryStore>) -> AdminContext {
        let ctx = AdminContext::new(store.clone());
        ctx.load_products().await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn load_mirrors_store_keys_and_next_id() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(3, 1), product(7, 2)]);

        let ctx = loaded(&store).await;
        let mut ids = ctx.products().iter().map(|p| p.id.get()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec![3, 7]);
        assert_eq!(ctx.next_product_id().get(), 8);
    }

    #[tokio::test]
    async fn load_of_empty_store_starts_ids_at_one() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = loaded(&store).await;
        assert!(ctx.products().is_empty());
        assert_eq!(ctx.next_product_id().get(), 1);
    }

    #[tokio::test]
    async fn failed_load_empties_cache() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 1)]);
        let ctx = loaded(&store).await;
        assert_eq!(ctx.products().len(), 1);

        store.fail_next("offline");
        let err = ctx.load_products().await.unwrap_err();
        assert!(matches!(err, AdminError::Remote(_)));
        assert!(ctx.products().is_empty());
        assert_eq!(ctx.next_product_id().get(), 1);
        assert!(ctx.tracker().is_idle());
    }

    #[tokio::test]
    async fn undecodable_document_fails_the_whole_load() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 1)]);
        store.insert_raw(
            PRODUCTS,
            "2",
            json!({ "title": "Precious", "price": "12.5", "category": "pods", "stock": 7 }),
        );
        let ctx = AdminContext::new(store.clone());
        let mut rx = ctx.subscribe();

        let err = ctx.load_products().await.unwrap_err();
        assert!(matches!(err, AdminError::Undecodable(_)));
        assert!(ctx.products().is_empty());
        assert!(ctx.tracker().is_idle());

        let errors = drain_events(&mut rx)
            .into_iter()
            .filter(|e| e.notice().is_some_and(Notice::is_error))
            .count();
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn create_after_failed_load_never_reuses_stored_id() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 1)]);
        let precious = json!({ "title": "Precious", "price": "12.5", "category": "pods", "stock": 7 });
        store.insert_raw(PRODUCTS, "2", precious.clone());
        let ctx = AdminContext::new(store.clone());

        assert!(ctx.load_products().await.is_err());
        let created = ctx
            .create_product(ProductDraft {
                title: "New".into(),
                price: 5,
                category: Category::Pods,
                stock: 0,
                image: PLACEHOLDER_IMAGE.into(),
            })
            .await;

        assert!(matches!(created, Err(AdminError::NotLoaded)));
        assert_eq!(store.document(PRODUCTS, "2"), precious.as_object().cloned());
        assert!(store.contains(PRODUCTS, "1"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn non_numeric_key_fails_the_load() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 1)]);
        store.insert_raw(PRODUCTS, "draft", json!({ "title": "no id" }));
        let ctx = AdminContext::new(store.clone());

        assert!(matches!(
            ctx.load_products().await,
            Err(AdminError::Undecodable(_))
        ));
    }

    #[tokio::test]
    async fn save_merges_after_store_accepts() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = loaded(&store).await;

        assert_eq!(
            ctx.save_product(product(1, 4)).await.unwrap(),
            SaveOutcome::Created
        );
        assert_eq!(
            ctx.save_product(product(1, 9)).await.unwrap(),
            SaveOutcome::Updated
        );

        assert_eq!(ctx.products().len(), 1);
        assert_eq!(ctx.product(pid(1)).unwrap().stock, 9);
        assert_eq!(store.product(1).unwrap().stock, 9);
        assert!(ctx.tracker().is_idle());
    }

    #[tokio::test]
    async fn failed_save_leaves_cache_identical() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 5)]);
        let ctx = loaded(&store).await;
        let before = ctx.products();
        let next_before = ctx.next_product_id();
        let mut rx = ctx.subscribe();

        store.fail_next("write refused");
        let mut edited = product(1, 5);
        edited.title = "Renamed".into();
        assert!(ctx.save_product(edited).await.is_err());
        assert!(ctx.save_product(product(2, 1)).await.is_ok());

        store.fail_next("write refused");
        assert!(ctx.save_product(product(3, 1)).await.is_err());

        let mut expected = before.clone();
        expected.push(product(2, 1));
        assert_eq!(ctx.products(), expected);
        assert_eq!(ctx.product(pid(1)).unwrap().title, "Product 1");
        assert!(ctx.product(pid(3)).is_none());
        assert!(next_before <= ctx.next_product_id());

        let errors = drain_events(&mut rx)
            .into_iter()
            .filter(|e| e.notice().is_some_and(Notice::is_error))
            .count();
        assert_eq!(errors, 2);
        assert!(ctx.tracker().is_idle());
    }

    #[tokio::test]
    async fn create_allocates_next_id() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(4, 1)]);
        let ctx = loaded(&store).await;

        let created = ctx.create_product(product(1, 2).draft()).await.unwrap();
        assert_eq!(created.id.get(), 5);
        assert_eq!(ctx.next_product_id().get(), 6);
        assert!(store.product(5).is_some());
    }

    #[tokio::test]
    async fn stock_failure_keeps_optimistic_value_by_default() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 5)]);
        let ctx = loaded(&store).await;
        let mut rx = ctx.subscribe();

        store.fail_next("unavailable");
        let err = ctx.update_stock(pid(1), 4).await.unwrap_err();
        assert!(matches!(err, AdminError::Remote(_)));

        assert_eq!(ctx.product(pid(1)).unwrap().stock, 4);
        assert_eq!(store.product(1).unwrap().stock, 5);
        assert!(ctx.tracker().is_idle());

        let events = drain_events(&mut rx);
        let errors = events
            .iter()
            .filter(|e| e.notice().is_some_and(Notice::is_error))
            .count();
        assert_eq!(errors, 1);
        assert_eq!(
            events.iter().filter_map(AdminEvent::status).last(),
            Some(&SyncStatus::Idle)
        );
    }

    #[tokio::test]
    async fn stock_failure_rolls_back_when_configured() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 5)]);
        let ctx = AdminContext::with_options(
            store.clone(),
            crate::context::SyncOptions {
                stock_failure: StockFailurePolicy::Rollback,
            },
        );
        ctx.load_products().await.unwrap();

        store.fail_next("unavailable");
        assert!(ctx.update_stock(pid(1), 4).await.is_err());
        assert_eq!(ctx.product(pid(1)).unwrap().stock, 5);
    }

    #[tokio::test]
    async fn decrement_at_zero_is_a_no_op() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 0)]);
        let ctx = loaded(&store).await;
        let writes_before = store.write_count();

        let change = ctx
            .adjust_stock(pid(1), StockAdjustment::Decrement)
            .await
            .unwrap();
        assert_eq!(change, StockChange::Unchanged { current: 0 });
        assert_eq!(store.write_count(), writes_before);
        assert_eq!(ctx.product(pid(1)).unwrap().stock, 0);
    }

    #[tokio::test]
    async fn increment_updates_only_stock_field() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 0)]);
        let ctx = loaded(&store).await;

        let change = ctx
            .adjust_stock(pid(1), StockAdjustment::Increment)
            .await
            .unwrap();
        assert_eq!(
            change,
            StockChange::Updated {
                previous: 0,
                current: 1
            }
        );
        let remote = store.product(1).unwrap();
        assert_eq!(remote.stock, 1);
        assert_eq!(remote.title, "Product 1");
    }

    #[tokio::test]
    async fn unknown_product_stock_is_rejected_without_writes() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = loaded(&store).await;

        let err = ctx.update_stock(pid(42), 3).await.unwrap_err();
        assert!(matches!(err, AdminError::UnknownProduct(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_adjustments_share_the_tracker() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 5), product(2, 5)]);
        let ctx = loaded(&store).await;
        let mut rx = ctx.subscribe();

        let (a, b) = tokio::join!(
            ctx.adjust_stock(pid(1), StockAdjustment::Decrement),
            ctx.adjust_stock(pid(2), StockAdjustment::Increment),
        );
        a.unwrap();
        b.unwrap();

        let statuses: Vec<SyncStatus> = drain_events(&mut rx)
            .iter()
            .filter_map(AdminEvent::status)
            .copied()
            .collect();
        assert!(statuses.contains(&SyncStatus::Syncing(2)));
        assert_eq!(statuses.last(), Some(&SyncStatus::Idle));
        assert_eq!(store.product(1).unwrap().stock, 4);
        assert_eq!(store.product(2).unwrap().stock, 6);
    }

    #[tokio::test]
    async fn delete_without_confirmation_touches_nothing() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(2, 1)]);
        let ctx = loaded(&store).await;
        let calls_before = store.call_count();

        let outcome = ctx.delete_product(pid(2), &Always(false)).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(store.call_count(), calls_before);
        assert!(ctx.product(pid(2)).is_some());
    }

    #[tokio::test]
    async fn confirmed_delete_removes_from_store_and_cache() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(2, 1)]);
        let ctx = loaded(&store).await;

        let outcome = ctx.delete_product(pid(2), &Always(true)).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(ctx.product(pid(2)).is_none());
        assert!(store.product(2).is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_cache() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(2, 1)]);
        let ctx = loaded(&store).await;

        store.fail_next("denied");
        assert!(ctx.delete_product(pid(2), &Always(true)).await.is_err());
        assert!(ctx.product(pid(2)).is_some());
        assert!(ctx.tracker().is_idle());
    }

    #[tokio::test]
    async fn import_rejects_empty_and_non_array_without_writes() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = loaded(&store).await;

        for payload in [json!([]), json!("not an array"), json!({ "id": 1 })] {
            let err = ctx.import_all(payload).await.unwrap_err();
            assert!(matches!(err, AdminError::InvalidImport(_)));
        }
        let err = ctx.import_json("{ not json").await.unwrap_err();
        assert!(matches!(err, AdminError::InvalidImport(_)));

        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn import_rejects_malformed_item_before_any_write() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = loaded(&store).await;

        let payload = json!([
            { "id": 1, "title": "ok", "price": 1, "category": "pods", "stock": 1 },
            { "title": "no id" },
        ]);
        assert!(matches!(
            ctx.import_all(payload).await,
            Err(AdminError::InvalidImport(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn import_saves_sequentially_and_reloads() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(9, 1)]);
        let ctx = AdminContext::new(store.clone());

        let payload = serde_json::to_value(vec![product(1, 1), product(2, 2)]).unwrap();
        let report = ctx.import_all(payload).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.saved, 2);
        let mut ids = ctx.products().iter().map(|p| p.id.get()).collect::<Vec<_>>();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 9]);
        assert_eq!(ctx.next_product_id().get(), 10);
    }

    #[tokio::test]
    async fn import_failure_keeps_prefix_and_skips_rest() {
        let store = Arc::new(InMemoryStore::new());
        let ctx = AdminContext::new(store.clone());
        store.fail_writes_to(PRODUCTS, "2", "quota exceeded");

        let payload =
            serde_json::to_value(vec![product(1, 1), product(2, 2), product(3, 3)]).unwrap();
        let report = ctx.import_all(payload).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.saved, 1);
        assert_eq!(report.failure.as_ref().unwrap().id, pid(2));
        assert!(store.product(1).is_some());
        assert!(store.product(3).is_none());
        assert_eq!(
            ctx.products().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![pid(1)]
        );
    }

    #[tokio::test]
    async fn export_is_pretty_json_of_cache() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_products(&[product(1, 5)]);
        let ctx = loaded(&store).await;

        let text = ctx.export_json().unwrap();
        assert!(text.contains("\n  {"));
        let back: Vec<Product> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ctx.products());
    }
}
