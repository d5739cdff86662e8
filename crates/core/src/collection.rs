//! Cart-quantity reconciliation rules.
//!
//! Adding a product a user already holds increments the existing line item
//! instead of creating a second row; decrementing a quantity of 1 deletes the
//! row. The decisions live here as pure functions so both the SQL and the
//! in-memory repositories enforce identical semantics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductRating;
use crate::errors::DomainError;

/// Add-to-collection payload: the catalog descriptor as submitted by the
/// client. The catalog `id` is informational only; the merge key is the
/// title (case-sensitive exact match).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AddProductInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
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

impl AddProductInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut messages = Vec::new();

        if self.title.trim().is_empty() {
            messages.push("Product title is required.".to_string());
        }
        if self.price < Decimal::ZERO {
            messages.push("Product price cannot be negative.".to_string());
        }
        if self.category.trim().is_empty() {
            messages.push("Product category is required.".to_string());
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation { messages })
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityAction {
    Increase,
    Decrease,
    Remove,
}

impl QuantityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Remove => "remove",
        }
    }
}

impl std::str::FromStr for QuantityAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            "remove" => Ok(Self::Remove),
            other => Err(DomainError::validation(format!(
                "Unknown quantity action `{other}` (expected increase|decrease|remove)."
            ))),
        }
    }
}

/// Outcome of applying a [`QuantityAction`] to a current quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantityResolution {
    /// Persist the line item with this quantity.
    Set(u32),
    /// Delete the line item; the reported quantity is 0.
    Delete,
}

/// The reconciliation rule itself. `current` is the stored quantity, always
/// >= 1 for an existing row.
pub fn resolve_quantity(current: u32, action: QuantityAction) -> QuantityResolution {
    match action {
        QuantityAction::Increase => QuantityResolution::Set(current.saturating_add(1)),
        QuantityAction::Decrease if current > 1 => QuantityResolution::Set(current - 1),
        QuantityAction::Decrease => QuantityResolution::Delete,
        QuantityAction::Remove => QuantityResolution::Delete,
    }
}
