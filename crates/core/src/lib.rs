pub mod collection;
pub mod config;
pub mod domain;
pub mod errors;
pub mod password;
pub mod stats;

pub use collection::{AddProductInput, QuantityAction, QuantityResolution};
pub use domain::line_item::{LineItem, LineItemId};
pub use domain::product::{ProductDescriptor, ProductRating};
pub use domain::user::{ProfileUpdateInput, RegistrationInput, Role, User, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use stats::{CategoryBreakdown, ProfileStatistics};
