use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::collection::AddProductInput;
use crate::domain::user::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineItemId(pub i64);

/// A product saved by a user, with the quantity they have accumulated.
///
/// Within one user's collection the title is the identity key: adding a
/// product whose title already exists increments the stored quantity instead
/// of creating a second row. Quantity is always at least 1; a line item whose
/// quantity would drop to 0 is deleted rather than stored at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub user_id: UserId,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub rating_rate: f64,
    pub rating_count: u32,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for a line item about to be inserted. Ids and timestamps are
/// assigned by the repository.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLineItem {
    pub user_id: UserId,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub rating_rate: f64,
    pub rating_count: u32,
}

impl NewLineItem {
    pub fn from_input(user_id: UserId, input: &AddProductInput) -> Self {
        Self {
            user_id,
            title: input.title.clone(),
            price: input.price,
            description: input.description.clone(),
            category: input.category.clone(),
            image_url: input.image.clone(),
            rating_rate: input.rating.rate,
            rating_count: input.rating.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::collection::AddProductInput;
    use crate::domain::product::ProductRating;
    use crate::domain::user::UserId;

    use super::NewLineItem;

    #[test]
    fn new_line_item_copies_descriptor_fields() {
        let input = AddProductInput {
            id: Some(3),
            title: "Gold Chain".to_string(),
            price: Decimal::new(69599, 2),
            description: "A classic piece".to_string(),
            category: "jewelery".to_string(),
            image: "https://example.test/3.jpg".to_string(),
            rating: ProductRating { rate: 4.6, count: 400 },
        };

        let item = NewLineItem::from_input(UserId(12), &input);
        assert_eq!(item.user_id, UserId(12));
        assert_eq!(item.title, "Gold Chain");
        assert_eq!(item.price, Decimal::new(69599, 2));
        assert_eq!(item.rating_count, 400);
    }
}
