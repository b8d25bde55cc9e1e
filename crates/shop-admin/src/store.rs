use std::sync::Arc;

/// A document body: a JSON object of fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Collection holding products, keyed by the decimal product id.
pub const PRODUCTS: &str = "products";

/// Collection holding reviews, keyed by store-generated ids.
pub const REVIEWS: &str = "reviews";

/// A document together with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Errors that can occur when talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("store rejected request: {0}")]
    Remote(String),

    #[error("could not decode store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// The remote document database the caches mirror.
///
/// Persistence, querying and durability are the store's concern; callers
/// only consume its results.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection, in store order.
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// A single document, or `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Overwrite only the given fields of an existing document.
    /// Fails with `NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document)
    -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Every document in a collection ordered by one field.
    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

#[async_trait::async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).get_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        (**self).set(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<(), StoreError> {
        (**self).update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).query_ordered(collection, order_by, direction).await
    }
}
