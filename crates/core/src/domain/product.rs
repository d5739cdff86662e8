use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product as returned by the external catalog service. Read-only: fetched
/// fresh on every catalog view and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rating: ProductRating,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub count: u32,
}
