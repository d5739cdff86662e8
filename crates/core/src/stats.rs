//! Profile statistics derived from a user's line items. Nothing here is
//! stored; everything is recomputed per request.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::line_item::LineItem;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub quantity: u64,
    pub value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileStatistics {
    pub total_line_items: u64,
    pub total_quantity: u64,
    pub total_value: Decimal,
    pub categories: BTreeMap<String, CategoryBreakdown>,
    pub most_frequent_category: Option<String>,
    pub average_price: Decimal,
}

impl ProfileStatistics {
    pub fn compute(items: &[LineItem]) -> Self {
        let mut categories: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();
        let mut total_quantity: u64 = 0;
        let mut total_value = Decimal::ZERO;

        for item in items {
            let quantity = u64::from(item.quantity);
            let value = item.price * Decimal::from(item.quantity);

            total_quantity += quantity;
            total_value += value;

            let entry = categories.entry(item.category.clone()).or_default();
            entry.quantity += quantity;
            entry.value += value;
        }

        // BTreeMap iterates in key order, so a strict comparison picks the
        // lexicographically smallest category among ties.
        let most_frequent_category = categories
            .iter()
            .fold(None::<(&String, u64)>, |best, (category, breakdown)| match best {
                Some((_, quantity)) if breakdown.quantity > quantity => {
                    Some((category, breakdown.quantity))
                }
                Some(best) => Some(best),
                None => Some((category, breakdown.quantity)),
            })
            .map(|(category, _)| category.clone());

        let average_price = if total_quantity > 0 {
            total_value / Decimal::from(total_quantity)
        } else {
            Decimal::ZERO
        };

        Self {
            total_line_items: items.len() as u64,
            total_quantity,
            total_value,
            categories,
            most_frequent_category,
            average_price,
        }
    }
}
