//! Per-user saved-product operations.
//!
//! The service owns record identity: every save mints a fresh store id and
//! timestamp, so a round-tripped product id can never collide with a stored
//! record. Corrections are delete + re-save; there is no update.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::StoreError;
use crate::domain::product::{Product, SavedProduct, SavedProductId, UserIdentity};
use crate::domain::repositories::SavedProductRepository;

pub struct SavedProducts {
    repository: Arc<dyn SavedProductRepository>,
}

impl SavedProducts {
    pub fn new(repository: Arc<dyn SavedProductRepository>) -> Self {
        Self { repository }
    }

    /// Persists `product` under `user`'s account.
    ///
    /// Always creates an independent record: saving the same product twice
    /// yields two records with distinct ids (no dedup against prior saves).
    ///
    /// # Errors
    /// Returns `StoreError::Persistence` when the write fails.
    pub async fn save(
        &self,
        product: Product,
        user: &UserIdentity,
    ) -> Result<SavedProduct, StoreError> {
        let record = SavedProduct {
            id: SavedProductId::generate(),
            owner_id: user.uid.clone(),
            product,
            saved_at: Utc::now(),
        };

        self.repository.insert(&record).await?;
        info!(id = %record.id, owner = %record.owner_id, "product saved");
        Ok(record)
    }

    /// Returns `user`'s saved products, newest save first.
    pub async fn list(&self, user: &UserIdentity) -> Result<Vec<SavedProduct>, StoreError> {
        self.repository.list_by_owner(&user.uid).await
    }

    /// Deletes a saved record if `user` owns it.
    ///
    /// # Errors
    /// `NotFound` when no such record exists, `NotOwner` when it belongs to
    /// someone else. Refused deletes are audited here; the caller-visible
    /// message stays identical to `NotFound` either way.
    pub async fn delete(
        &self,
        id: &SavedProductId,
        user: &UserIdentity,
    ) -> Result<(), StoreError> {
        match self.repository.delete_owned(id, &user.uid).await {
            Err(err @ StoreError::NotOwner { .. }) => {
                warn!(id = %id, requester = %user.uid, "delete refused: requester is not the owner");
                Err(err)
            }
            Ok(()) => {
                info!(id = %id, owner = %user.uid, "product deleted");
                Ok(())
            }
            other => other,
        }
    }
}
