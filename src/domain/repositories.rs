//! Repository interfaces for saved-product persistence.
//!
//! Trait definitions live in the domain; implementations sit in the
//! infrastructure layer and are injected where needed.

use async_trait::async_trait;

use crate::domain::errors::StoreError;
use crate::domain::product::{SavedProduct, SavedProductId};

#[async_trait]
pub trait SavedProductRepository: Send + Sync {
    /// Inserts a new record. Every save is an independent insert; an
    /// existing id is never overwritten or merged.
    async fn insert(&self, record: &SavedProduct) -> Result<(), StoreError>;

    /// Returns all records owned by `owner_id`, newest save first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<SavedProduct>, StoreError>;

    /// Deletes `id` iff it exists and belongs to `requester_id`.
    ///
    /// The ownership check happens before any mutation, and the delete
    /// itself is conditional on `(id, owner)` so racing deletes of the same
    /// record serialize: exactly one succeeds, the loser sees `NotFound`.
    async fn delete_owned(
        &self,
        id: &SavedProductId,
        requester_id: &str,
    ) -> Result<(), StoreError>;
}
