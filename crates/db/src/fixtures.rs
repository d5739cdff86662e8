use chrono::Utc;
use secrecy::SecretString;
use sqlx::Row;

use snapshop_core::password;

use crate::repositories::RepositoryError;
use crate::DbPool;

/// Deterministic demo dataset used by `snapshop seed`: one customer account
/// with a small collection spanning two categories.
pub struct DemoSeedDataset;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_EMAIL: &str = "demo@snapshop.test";
pub const DEMO_PASSWORD: &str = "demo-password-1";

const DEMO_LINE_ITEMS: &[(&str, &str, &str, u32)] = &[
    ("Fjallraven Backpack", "109.95", "men's clothing", 2),
    ("Mens Casual T-Shirt", "22.30", "men's clothing", 1),
    ("Gold Petite Micropave", "168.00", "jewelery", 1),
];

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub users_seeded: u32,
    pub line_items_seeded: u32,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoSeedDataset {
    /// Idempotent: re-running leaves existing rows untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let password_hash = password::hash(&SecretString::from(DEMO_PASSWORD.to_string()))
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let inserted = sqlx::query(
            "INSERT INTO users (name, username, email, password_hash, role, created_at, updated_at)
             VALUES ('Demo Shopper', ?, ?, ?, 'customer', ?, ?)
             ON CONFLICT DO NOTHING",
        )
        .bind(DEMO_USERNAME)
        .bind(DEMO_EMAIL)
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;
        let users_seeded = inserted.rows_affected() as u32;

        let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(DEMO_USERNAME)
            .fetch_one(pool)
            .await?;

        let mut line_items_seeded = 0;
        for (title, price, category, quantity) in DEMO_LINE_ITEMS {
            let inserted = sqlx::query(
                "INSERT INTO line_item (user_id, title, price, description, category, image_url,
                                        rating_rate, rating_count, quantity, created_at, updated_at)
                 VALUES (?, ?, ?, '', ?, '', 0, 0, ?, ?, ?)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(title)
            .bind(price)
            .bind(category)
            .bind(*quantity as i64)
            .bind(&now)
            .bind(&now)
            .execute(pool)
            .await?;
            line_items_seeded += inserted.rows_affected() as u32;
        }

        Ok(SeedResult { users_seeded, line_items_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let demo_user: Option<i64> = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(DEMO_USERNAME)
            .fetch_optional(pool)
            .await?
            .map(|row| row.get("id"));
        checks.push(("demo-user", demo_user.is_some()));

        let line_count: i64 = match demo_user {
            Some(user_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM line_item WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?
            }
            None => 0,
        };
        checks.push(("demo-line-items", line_count == DEMO_LINE_ITEMS.len() as i64));

        let zero_quantities: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM line_item WHERE quantity < 1")
                .fetch_one(pool)
                .await?;
        checks.push(("quantity-floor", zero_quantities == 0));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}
