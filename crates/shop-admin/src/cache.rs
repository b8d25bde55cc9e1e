use crate::product::{Product, ProductId};
use crate::review::{Review, ReviewId};

/// In-memory mirror of the `products` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCache {
    products: Vec<Product>,
    next_id: ProductId,
    /// Set by a successful snapshot. Ids are only handed out from a
    /// snapshot, so an empty cache after a failed load cannot collide
    /// with stored products.
    loaded: bool,
}

impl Default for ProductCache {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            next_id: ProductId::FIRST,
            loaded: false,
        }
    }
}

impl ProductCache {
    /// Replace the whole cache with a fresh snapshot and recompute the
    /// next id as `max(ids) + 1`, or 1 when empty.
    pub fn replace_all(&mut self, products: Vec<Product>) {
        self.next_id = products
            .iter()
            .map(|p| p.id)
            .max()
            .map_or(ProductId::FIRST, ProductId::next);
        self.products = products;
        self.loaded = true;
    }

    /// Drop everything, including the loaded snapshot.
    pub fn clear(&mut self) {
        self.products.clear();
        self.next_id = ProductId::FIRST;
        self.loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Replace the product with the same id, or append it.
    /// Returns `true` when the product was not cached before.
    pub fn upsert(&mut self, product: Product) -> bool {
        if product.id >= self.next_id {
            self.next_id = product.id.next();
        }

        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => {
                *existing = product;
                false
            }
            None => {
                self.products.push(product);
                true
            }
        }
    }

    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        let idx = self.products.iter().position(|p| p.id == id)?;
        Some(self.products.remove(idx))
    }

    /// Set the stock of a cached product, returning the previous value.
    pub fn set_stock(&mut self, id: ProductId, stock: u32) -> Option<u32> {
        let product = self.products.iter_mut().find(|p| p.id == id)?;
        Some(std::mem::replace(&mut product.stock, stock))
    }

    /// Hand out the next id for a new product and advance past it.
    /// `None` until a snapshot has been loaded.
    pub fn allocate_id(&mut self) -> Option<ProductId> {
        if !self.loaded {
            return None;
        }
        let id = self.next_id;
        self.next_id = id.next();
        Some(id)
    }

    pub fn next_id(&self) -> ProductId {
        self.next_id
    }

    pub fn ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|p| p.id).collect()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// In-memory mirror of the `reviews` collection, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewCache {
    reviews: Vec<Review>,
}

impl ReviewCache {
    pub fn replace_all(&mut self, reviews: Vec<Review>) {
        self.reviews = reviews;
    }

    pub fn clear(&mut self) {
        self.reviews.clear();
    }

    pub fn get(&self, id: &ReviewId) -> Option<&Review> {
        self.reviews.iter().find(|r| &r.id == id)
    }

    pub fn remove(&mut self, id: &ReviewId) -> Option<Review> {
        let idx = self.reviews.iter().position(|r| &r.id == id)?;
        Some(self.reviews.remove(idx))
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}
