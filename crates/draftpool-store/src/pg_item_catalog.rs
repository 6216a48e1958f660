//! `PostgreSQL` implementation of the `ItemCatalog` trait over `schools`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use draftpool_core::error::DomainError;
use draftpool_core::model::{CatalogItem, ItemId};
use draftpool_core::repository::ItemCatalog;

#[derive(FromRow)]
struct SchoolRow {
    id: i32,
    name: String,
    conference: Option<String>,
}

fn infra(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

/// School catalog backed by the `schools` table.
#[derive(Debug, Clone)]
pub struct PgItemCatalog {
    pool: PgPool,
}

impl PgItemCatalog {
    /// Creates a new `PgItemCatalog`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemCatalog for PgItemCatalog {
    async fn contains(&self, item_id: ItemId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM schools WHERE id = $1)")
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(infra)
    }

    async fn describe(
        &self,
        item_ids: &[ItemId],
    ) -> Result<HashMap<ItemId, CatalogItem>, DomainError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<SchoolRow> =
            sqlx::query_as("SELECT id, name, conference FROM schools WHERE id = ANY($1)")
                .bind(item_ids)
                .fetch_all(&self.pool)
                .await
                .map_err(infra)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.id,
                    CatalogItem {
                        id: row.id,
                        name: row.name,
                        category: row.conference,
                    },
                )
            })
            .collect())
    }
}
