use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::Document;

/// Image path used for products created without an uploaded image.
pub const PLACEHOLDER_IMAGE: &str = "images/placeholder.png";

/// Numeric product identity. The remote document id is its decimal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    pub const FIRST: ProductId = ProductId(1);

    /// Returns `None` for zero; product ids start at 1.
    pub fn new(id: u64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a remote document id.
    pub fn parse(doc_id: &str) -> Option<Self> {
        doc_id.trim().parse::<u64>().ok().and_then(Self::new)
    }

    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The document id in the `products` collection.
    pub fn doc_id(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = coerce_int(deserializer)?;
        u64::try_from(raw)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| D::Error::custom(format!("product id must be positive, got {raw}")))
    }
}

/// Catalog section a product is listed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Pods,
    Disposable,
    Liquid,
    Other(String),
}

impl Category {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pods" => Self::Pods,
            "disposable" => Self::Disposable,
            "liquid" => Self::Liquid,
            _ => Self::Other(s.to_owned()),
        }
    }

    /// All known (non-Other) categories in display order.
    pub fn all_known() -> Vec<Category> {
        vec![Self::Pods, Self::Disposable, Self::Liquid]
    }

    /// Stored category code.
    pub fn code(&self) -> &str {
        match self {
            Self::Pods => "pods",
            Self::Disposable => "disposable",
            Self::Liquid => "liquid",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Human-readable label for display.
    pub fn display_label(&self) -> &str {
        match self {
            Self::Pods => "Pods",
            Self::Disposable => "Disposables",
            Self::Liquid => "Liquids",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.code().to_owned()
    }
}

/// A catalog product as held in the product cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(deserialize_with = "coerce_int")]
    pub price: i64,
    pub category: Category,
    #[serde(default, deserialize_with = "coerce_stock")]
    pub stock: u32,
    #[serde(default = "placeholder_image")]
    pub image: String,
}

impl Product {
    /// Remote document body: every field except the id, which is the key.
    pub fn to_document(&self) -> Document {
        let mut doc = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Document::new(),
        };
        doc.remove("id");
        doc
    }

    /// Rebuild a product from a remote document and its key.
    ///
    /// The document key wins over any `id` field stored in the body.
    pub fn from_document(doc_id: &str, mut doc: Document) -> Result<Self, String> {
        let id = ProductId::parse(doc_id)
            .ok_or_else(|| format!("document id {doc_id:?} is not a product id"))?;
        doc.insert("id".into(), serde_json::Value::from(id.get()));
        serde_json::from_value(serde_json::Value::Object(doc))
            .map_err(|e| format!("product {doc_id}: {e}"))
    }

    pub fn draft(&self) -> ProductDraft {
        ProductDraft {
            title: self.title.clone(),
            price: self.price,
            category: self.category.clone(),
            stock: self.stock,
            image: self.image.clone(),
        }
    }
}

/// Product fields entered for a new product, before an id is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    #[serde(deserialize_with = "coerce_int")]
    pub price: i64,
    pub category: Category,
    #[serde(default, deserialize_with = "coerce_stock")]
    pub stock: u32,
    #[serde(default = "placeholder_image")]
    pub image: String,
}

impl ProductDraft {
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            title: self.title,
            price: self.price,
            category: self.category,
            stock: self.stock,
            image: self.image,
        }
    }
}

/// One click on the stock controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    Increment,
    Decrement,
}

impl StockAdjustment {
    /// New stock value, or `None` when the adjustment would leave the range.
    pub fn apply(self, current: u32) -> Option<u32> {
        match self {
            Self::Increment => current.checked_add(1),
            Self::Decrement => current.checked_sub(1),
        }
    }
}

/// Storage path for an uploaded product image: `images/product<id>.<ext>`.
///
/// Extensions that are not plain ASCII alphanumerics fall back to `jpg`.
pub fn image_path_for(id: ProductId, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg");
    format!("images/product{id}.{}", ext.to_lowercase())
}

fn placeholder_image() -> String {
    PLACEHOLDER_IMAGE.to_owned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accept an integer as a JSON number or a numeric string.
fn coerce_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match RawInt::deserialize(deserializer)? {
        RawInt::Int(n) => Ok(n),
        RawInt::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        RawInt::Float(f) => Err(D::Error::custom(format!("expected an integer, got {f}"))),
        RawInt::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}

fn coerce_stock<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = coerce_int(deserializer)?;
    u32::try_from(raw).map_err(|_| D::Error::custom(format!("stock out of range: {raw}")))
}
