use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use snapshop_core::collection::QuantityAction;
use snapshop_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use snapshop_core::domain::user::UserId;

use super::{AddOutcome, LineItemRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLineItemRepository {
    pool: DbPool,
}

impl SqlLineItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_line_item(row: &sqlx::sqlite::SqliteRow) -> Result<LineItem, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: i64 =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let title: String =
        row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price_str: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: String =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: String =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let image_url: String =
        row.try_get("image_url").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating_rate: f64 =
        row.try_get("rating_rate").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating_count: i64 =
        row.try_get("rating_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let price = price_str
        .parse::<Decimal>()
        .map_err(|e| RepositoryError::Decode(format!("invalid price `{price_str}`: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(LineItem {
        id: LineItemId(id),
        user_id: UserId(user_id),
        title,
        price,
        description,
        category,
        image_url,
        rating_rate,
        rating_count: rating_count as u32,
        quantity: quantity as u32,
        created_at,
        updated_at,
    })
}

#[async_trait::async_trait]
impl LineItemRepository for SqlLineItemRepository {
    async fn add_or_increment(&self, item: NewLineItem) -> Result<AddOutcome, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        // Single-statement upsert: the database serializes concurrent adds of
        // the same (user, title), so no increment is lost.
        let row = sqlx::query(
            "INSERT INTO line_item (user_id, title, price, description, category, image_url,
                                    rating_rate, rating_count, quantity, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
             ON CONFLICT(user_id, title) DO UPDATE SET
                 quantity = quantity + 1,
                 updated_at = excluded.updated_at
             RETURNING id, quantity",
        )
        .bind(item.user_id.0)
        .bind(&item.title)
        .bind(item.price.to_string())
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.image_url)
        .bind(item.rating_rate)
        .bind(item.rating_count as i64)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let quantity: i64 =
            row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(AddOutcome {
            line_item_id: LineItemId(id),
            quantity: quantity as u32,
            created: quantity == 1,
        })
    }

    async fn apply_quantity_action(
        &self,
        user_id: UserId,
        id: LineItemId,
        action: QuantityAction,
    ) -> Result<u32, RepositoryError> {
        match action {
            QuantityAction::Increase => {
                let row = sqlx::query(
                    "UPDATE line_item SET quantity = quantity + 1, updated_at = ?
                     WHERE id = ? AND user_id = ?
                     RETURNING quantity",
                )
                .bind(Utc::now().to_rfc3339())
                .bind(id.0)
                .bind(user_id.0)
                .fetch_optional(&self.pool)
                .await?;

                match row {
                    Some(row) => {
                        let quantity: i64 = row
                            .try_get("quantity")
                            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                        Ok(quantity as u32)
                    }
                    None => Err(RepositoryError::NotFound),
                }
            }
            QuantityAction::Decrease => self.decrease(user_id, id).await,
            QuantityAction::Remove => {
                let deleted = sqlx::query("DELETE FROM line_item WHERE id = ? AND user_id = ?")
                    .bind(id.0)
                    .bind(user_id.0)
                    .execute(&self.pool)
                    .await?;

                if deleted.rows_affected() == 0 {
                    Err(RepositoryError::NotFound)
                } else {
                    Ok(0)
                }
            }
        }
    }

    async fn find_for_user(
        &self,
        user_id: UserId,
        id: LineItemId,
    ) -> Result<Option<LineItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, title, price, description, category, image_url,
                    rating_rate, rating_count, quantity, created_at, updated_at
             FROM line_item WHERE id = ? AND user_id = ?",
        )
        .bind(id.0)
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_line_item(row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, price, description, category, image_url,
                    rating_rate, rating_count, quantity, created_at, updated_at
             FROM line_item WHERE user_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_line_item).collect()
    }
}

impl SqlLineItemRepository {
    /// Decrease is two guarded statements with an optimistic retry: the
    /// conditional UPDATE only fires above quantity 1, the conditional DELETE
    /// only fires at exactly 1, and a concurrent increment between the two
    /// simply sends us around the loop again.
    async fn decrease(&self, user_id: UserId, id: LineItemId) -> Result<u32, RepositoryError> {
        for _ in 0..3 {
            let updated = sqlx::query(
                "UPDATE line_item SET quantity = quantity - 1, updated_at = ?
                 WHERE id = ? AND user_id = ? AND quantity > 1
                 RETURNING quantity",
            )
            .bind(Utc::now().to_rfc3339())
            .bind(id.0)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = updated {
                let quantity: i64 =
                    row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                return Ok(quantity as u32);
            }

            let deleted = sqlx::query(
                "DELETE FROM line_item WHERE id = ? AND user_id = ? AND quantity = 1",
            )
            .bind(id.0)
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;

            if deleted.rows_affected() > 0 {
                return Ok(0);
            }

            let exists = sqlx::query("SELECT 1 FROM line_item WHERE id = ? AND user_id = ?")
                .bind(id.0)
                .bind(user_id.0)
                .fetch_optional(&self.pool)
                .await?;

            if exists.is_none() {
                return Err(RepositoryError::NotFound);
            }
        }

        Err(RepositoryError::Conflict(
            "quantity decrease did not converge under concurrent updates".to_string(),
        ))
    }
}
