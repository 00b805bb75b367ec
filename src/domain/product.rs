//! Product entities flowing through the analysis pipeline and the
//! saved-products store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currency-tagged price as displayed on the product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: f64,
    /// ISO-style currency code ("USD", "EUR") where the page reveals one.
    pub currency: String,
}

/// Aggregate customer rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub count: Option<u32>,
}

/// Raw structured fields scraped from a product page.
///
/// Transient: scoped to a single pipeline invocation, never persisted
/// directly. Optional fields degrade to neutral defaults when the page does
/// not expose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    pub title: Option<String>,
    pub price: Option<Price>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub rating: Option<Rating>,
}

impl RawExtraction {
    /// An extraction with neither a title nor a price carries nothing a
    /// reader could recognize as a product.
    #[must_use]
    pub fn has_product_fields(&self) -> bool {
        self.title.is_some() || self.price.is_some()
    }
}

/// Comparable product suggested alongside the critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeProduct {
    pub name: String,
    /// Price as displayed by the suggestion, if any ("$1,099.99").
    pub price: Option<String>,
}

/// Structured critique produced by the analysis engine.
///
/// Transient: attached to a [`Product`] at composition, never stored alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub alternatives: Vec<AlternativeProduct>,
}

impl AnalysisResult {
    /// A response with no pros, no cons, or a blank recommendation carries
    /// no usable signal. Alternatives are extra content and do not count.
    #[must_use]
    pub fn has_substance(&self) -> bool {
        (!self.pros.is_empty() || !self.cons.is_empty())
            && !self.recommendation.trim().is_empty()
    }
}

/// Unique product identifier assigned at composition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Creates a fresh identifier. Random UUIDs keep concurrent compositions
    /// of the same URL collision-free.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical analyzed product. Immutable once composed; re-analyzing the
/// same URL composes a new product with a new id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    pub title: Option<String>,
    pub price: Option<Price>,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub rating: Option<Rating>,
    pub analysis: AnalysisResult,
    #[serde(rename = "analyzedAt")]
    pub analyzed_at: DateTime<Utc>,
}

/// Identifier of a persisted saved-product record.
///
/// Generated by the store at save time and always distinct from the
/// transient [`ProductId`], so a round-tripped product can never be
/// mistaken for a stored one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavedProductId(String);

impl SavedProductId {
    /// Creates a fresh identifier: millisecond timestamp plus a random
    /// component.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!(
            "sp_{}_{:08x}",
            Utc::now().timestamp_millis(),
            fastrand::u32(..)
        ))
    }

    #[must_use]
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SavedProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product pinned to a user's collection.
///
/// Visible and deletable only by the identity recorded in `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedProduct {
    pub id: SavedProductId,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    pub product: Product,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Externally verified caller identity.
///
/// Supplied by the boundary's token verification; never created, mutated,
/// or deleted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
}
