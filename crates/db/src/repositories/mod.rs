use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use snapshop_core::collection::QuantityAction;
use snapshop_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use snapshop_core::domain::user::{ProfileUpdateInput, Role, User, UserId};

pub mod line_item;
pub mod memory;
pub mod user;

pub use line_item::SqlLineItemRepository;
pub use memory::InMemoryLineItemRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    /// The row does not exist, or belongs to a different user. The two cases
    /// are deliberately indistinguishable to the caller.
    #[error("line item not found for this user")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Result of an add-or-increment: the affected row and whether it was
/// freshly created (quantity 1) or merged into an existing row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddOutcome {
    pub line_item_id: LineItemId,
    pub quantity: u32,
    pub created: bool,
}

#[async_trait]
pub trait LineItemRepository: Send + Sync {
    /// Upsert keyed on `(user, title)`: create with quantity 1, or increment
    /// the existing row. Atomic with respect to concurrent adds of the same
    /// title for the same user.
    async fn add_or_increment(&self, item: NewLineItem) -> Result<AddOutcome, RepositoryError>;

    /// Apply increase/decrease/remove to one of the user's own line items.
    /// Returns the resulting quantity, 0 when the row was deleted.
    async fn apply_quantity_action(
        &self,
        user_id: UserId,
        id: LineItemId,
        action: QuantityAction,
    ) -> Result<u32, RepositoryError>;

    async fn find_for_user(
        &self,
        user_id: UserId,
        id: LineItemId,
    ) -> Result<Option<LineItem>, RepositoryError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<LineItem>, RepositoryError>;
}

/// Field set for a user about to be inserted. The password arrives already
/// hashed; this crate never sees plaintext credentials.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Case-insensitive username/email collisions are
    /// reported as [`RepositoryError::Conflict`] with a user-facing message.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up by username or email, case-insensitively.
    async fn find_credentials(&self, login: &str)
        -> Result<Option<UserCredentials>, RepositoryError>;

    async fn update_profile(
        &self,
        id: UserId,
        input: &ProfileUpdateInput,
    ) -> Result<User, RepositoryError>;

    async fn create_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Resolve a bearer token to its user. Expired sessions resolve to None.
    async fn find_session_user(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    async fn delete_session(&self, token: &str) -> Result<(), RepositoryError>;
}
