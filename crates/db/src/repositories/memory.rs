use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use snapshop_core::collection::{resolve_quantity, QuantityAction, QuantityResolution};
use snapshop_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use snapshop_core::domain::user::UserId;

use super::{AddOutcome, LineItemRepository, RepositoryError};

/// In-memory line item store for tests and scaffolding. Shares the
/// reconciliation rules with the SQL implementation via
/// [`resolve_quantity`].
#[derive(Default)]
pub struct InMemoryLineItemRepository {
    items: RwLock<HashMap<i64, LineItem>>,
    next_id: AtomicI64,
}

#[async_trait::async_trait]
impl LineItemRepository for InMemoryLineItemRepository {
    async fn add_or_increment(&self, item: NewLineItem) -> Result<AddOutcome, RepositoryError> {
        let mut items = self.items.write().await;
        let now = Utc::now();

        let existing = items
            .values_mut()
            .find(|candidate| candidate.user_id == item.user_id && candidate.title == item.title);

        if let Some(existing) = existing {
            existing.quantity += 1;
            existing.updated_at = now;
            return Ok(AddOutcome {
                line_item_id: existing.id,
                quantity: existing.quantity,
                created: false,
            });
        }

        let id = LineItemId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        items.insert(
            id.0,
            LineItem {
                id,
                user_id: item.user_id,
                title: item.title,
                price: item.price,
                description: item.description,
                category: item.category,
                image_url: item.image_url,
                rating_rate: item.rating_rate,
                rating_count: item.rating_count,
                quantity: 1,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(AddOutcome { line_item_id: id, quantity: 1, created: true })
    }

    async fn apply_quantity_action(
        &self,
        user_id: UserId,
        id: LineItemId,
        action: QuantityAction,
    ) -> Result<u32, RepositoryError> {
        let mut items = self.items.write().await;

        let owned = items.get(&id.0).filter(|item| item.user_id == user_id).is_some();
        if !owned {
            return Err(RepositoryError::NotFound);
        }

        let current = items[&id.0].quantity;
        match resolve_quantity(current, action) {
            QuantityResolution::Set(quantity) => {
                let item = items.get_mut(&id.0).ok_or(RepositoryError::NotFound)?;
                item.quantity = quantity;
                item.updated_at = Utc::now();
                Ok(quantity)
            }
            QuantityResolution::Delete => {
                items.remove(&id.0);
                Ok(0)
            }
        }
    }

    async fn find_for_user(
        &self,
        user_id: UserId,
        id: LineItemId,
    ) -> Result<Option<LineItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(&id.0).filter(|item| item.user_id == user_id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut owned: Vec<LineItem> =
            items.values().filter(|item| item.user_id == user_id).cloned().collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use snapshop_core::collection::QuantityAction;
    use snapshop_core::domain::line_item::NewLineItem;
    use snapshop_core::domain::user::UserId;

    use crate::repositories::{LineItemRepository, RepositoryError};

    use super::InMemoryLineItemRepository;

    fn backpack(user_id: UserId) -> NewLineItem {
        NewLineItem {
            user_id,
            title: "Fjallraven Backpack".to_string(),
            price: Decimal::new(10995, 2),
            description: "Fits 15 inch laptops".to_string(),
            category: "men's clothing".to_string(),
            image_url: "https://example.test/1.jpg".to_string(),
            rating_rate: 3.9,
            rating_count: 120,
        }
    }

    #[tokio::test]
    async fn first_add_creates_with_quantity_one() {
        let repo = InMemoryLineItemRepository::default();

        let outcome = repo.add_or_increment(backpack(UserId(1))).await.expect("add");
        assert!(outcome.created);
        assert_eq!(outcome.quantity, 1);

        let items = repo.list_for_user(UserId(1)).await.expect("list");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn repeated_add_merges_into_one_row() {
        let repo = InMemoryLineItemRepository::default();

        repo.add_or_increment(backpack(UserId(1))).await.expect("first add");
        let outcome = repo.add_or_increment(backpack(UserId(1))).await.expect("second add");

        assert!(!outcome.created);
        assert_eq!(outcome.quantity, 2);
        assert_eq!(repo.list_for_user(UserId(1)).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn same_title_for_different_users_stays_separate() {
        let repo = InMemoryLineItemRepository::default();

        repo.add_or_increment(backpack(UserId(1))).await.expect("user 1 add");
        repo.add_or_increment(backpack(UserId(2))).await.expect("user 2 add");

        assert_eq!(repo.list_for_user(UserId(1)).await.expect("list").len(), 1);
        assert_eq!(repo.list_for_user(UserId(2)).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn decrease_at_one_deletes_the_row() {
        let repo = InMemoryLineItemRepository::default();
        let outcome = repo.add_or_increment(backpack(UserId(1))).await.expect("add");

        let quantity = repo
            .apply_quantity_action(UserId(1), outcome.line_item_id, QuantityAction::Decrease)
            .await
            .expect("decrease");

        assert_eq!(quantity, 0);
        assert!(repo
            .find_for_user(UserId(1), outcome.line_item_id)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn foreign_line_item_is_not_found() {
        let repo = InMemoryLineItemRepository::default();
        let outcome = repo.add_or_increment(backpack(UserId(1))).await.expect("add");

        let error = repo
            .apply_quantity_action(UserId(2), outcome.line_item_id, QuantityAction::Increase)
            .await
            .expect_err("foreign access must fail");

        assert!(matches!(error, RepositoryError::NotFound));
        let untouched = repo
            .find_for_user(UserId(1), outcome.line_item_id)
            .await
            .expect("find")
            .expect("still present");
        assert_eq!(untouched.quantity, 1);
    }
}
