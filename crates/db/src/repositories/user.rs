use chrono::{DateTime, Utc};
use sqlx::Row;

use snapshop_core::domain::user::{ProfileUpdateInput, Role, User, UserId};

use super::{NewUser, RepositoryError, UserCredentials, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let username: String =
        row.try_get("username").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let role_str: String =
        row.try_get("role").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(User {
        id: UserId(id),
        name,
        username,
        email,
        role: Role::parse(&role_str),
        created_at,
        updated_at,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

const USER_COLUMNS: &str = "id, name, username, email, role, created_at, updated_at";

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (name, username, email, password_hash, role, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, name, username, email, role, created_at, updated_at",
        )
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(ref row) => row_to_user(row),
            Err(error) if is_unique_violation(&error) => Err(RepositoryError::Conflict(format!(
                "Username \"{}\" or email \"{}\" is already registered.",
                user.username, user.email
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_user(row)?)),
            None => Ok(None),
        }
    }

    async fn find_credentials(
        &self,
        login: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users
             WHERE username = ? COLLATE NOCASE OR email = ? COLLATE NOCASE"
        ))
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => {
                let password_hash: String = row
                    .try_get("password_hash")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(UserCredentials { user: row_to_user(row)?, password_hash }))
            }
            None => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: UserId,
        input: &ProfileUpdateInput,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, username = ?, email = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, name, username, email, role, created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.username)
        .bind(&input.email)
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(ref row)) => row_to_user(row),
            Ok(None) => Err(RepositoryError::NotFound),
            Err(error) if is_unique_violation(&error) => Err(RepositoryError::Conflict(format!(
                "Username \"{}\" or email \"{}\" is already taken by another user.",
                input.username, input.email
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn create_session(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id.0)
        .bind(Utc::now().to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session_user(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            "SELECT u.id, u.name, u.username, u.email, u.role, u.created_at, u.updated_at,
                    s.expires_at
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at_str: String =
            row.try_get("expires_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(format!("invalid session expiry: {e}")))?;

        if expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(Some(row_to_user(&row)?))
    }

    async fn delete_session(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
