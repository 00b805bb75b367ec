//! SQLite-backed saved-product repository.
//!
//! Records are stored as documents: the composed product serializes into a
//! JSON column, with id, owner, and save time as queryable fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::errors::StoreError;
use crate::domain::product::{Product, SavedProduct, SavedProductId};
use crate::domain::repositories::SavedProductRepository;

#[derive(Clone)]
pub struct SqliteSavedProductRepository {
    pool: SqlitePool,
}

impl SqliteSavedProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SavedProductRepository for SqliteSavedProductRepository {
    async fn insert(&self, record: &SavedProduct) -> Result<(), StoreError> {
        let product_json =
            serde_json::to_string(&record.product).map_err(StoreError::persistence)?;

        sqlx::query(
            r#"
            INSERT INTO saved_products (id, owner_id, saved_at, product)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.owner_id)
        .bind(record.saved_at)
        .bind(product_json)
        .execute(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<SavedProduct>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, saved_at, product
            FROM saved_products
            WHERE owner_id = ?
            ORDER BY saved_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id").map_err(StoreError::persistence)?;
                let owner_id: String =
                    row.try_get("owner_id").map_err(StoreError::persistence)?;
                let saved_at: DateTime<Utc> =
                    row.try_get("saved_at").map_err(StoreError::persistence)?;
                let product_json: String =
                    row.try_get("product").map_err(StoreError::persistence)?;
                let product: Product =
                    serde_json::from_str(&product_json).map_err(StoreError::persistence)?;

                Ok(SavedProduct {
                    id: SavedProductId::from_string(id),
                    owner_id,
                    product,
                    saved_at,
                })
            })
            .collect()
    }

    async fn delete_owned(
        &self,
        id: &SavedProductId,
        requester_id: &str,
    ) -> Result<(), StoreError> {
        // Ownership is checked before any mutation.
        let owner: Option<String> = sqlx::query("SELECT owner_id FROM saved_products WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::persistence)?
            .map(|row| row.try_get("owner_id"))
            .transpose()
            .map_err(StoreError::persistence)?;

        match owner {
            None => Err(StoreError::NotFound { id: id.to_string() }),
            Some(owner) if owner != requester_id => {
                Err(StoreError::NotOwner { id: id.to_string() })
            }
            Some(_) => {
                // Conditional on (id, owner): of two racing deletes exactly
                // one affects a row, the loser observes NotFound.
                let result =
                    sqlx::query("DELETE FROM saved_products WHERE id = ? AND owner_id = ?")
                        .bind(id.as_str())
                        .bind(requester_id)
                        .execute(&self.pool)
                        .await
                        .map_err(StoreError::persistence)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound { id: id.to_string() });
                }
                Ok(())
            }
        }
    }
}
