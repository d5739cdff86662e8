use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Vendor,
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vendor" => Self::Vendor,
            _ => Self::Customer,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration form fields. Passwords never leave `SecretString` until the
/// hashing seam consumes them.
#[derive(Clone, Debug)]
pub struct RegistrationInput {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub role: Role,
    pub accepted_terms: bool,
}

impl RegistrationInput {
    /// String-rule validation. Collects every failure so the caller can show
    /// them all at once; uniqueness against existing accounts is checked by
    /// the repository.
    pub fn validate(&self, min_password_len: usize) -> Result<(), DomainError> {
        let mut messages = Vec::new();

        let required = [
            (&self.name, "name"),
            (&self.username, "username"),
            (&self.email, "email"),
        ];
        if required.iter().any(|(value, _)| value.trim().is_empty())
            || self.password.expose_secret().is_empty()
            || self.confirm_password.expose_secret().is_empty()
        {
            messages.push("All fields are required.".to_string());
        }

        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            messages.push("Passwords do not match.".to_string());
        }

        if self.password.expose_secret().len() < min_password_len {
            messages.push(format!(
                "Password must be at least {min_password_len} characters long."
            ));
        }

        if !self.accepted_terms {
            messages.push("You must accept the terms and conditions.".to_string());
        }

        messages.extend(username_rule_failures(&self.username));
        messages.extend(email_rule_failures(&self.email));

        if messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation { messages })
        }
    }
}

/// Profile update form fields (name, username, email).
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileUpdateInput {
    pub name: String,
    pub username: String,
    pub email: String,
}

impl ProfileUpdateInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut messages = Vec::new();

        if [&self.name, &self.username, &self.email].iter().any(|v| v.trim().is_empty()) {
            messages.push("All fields are required.".to_string());
        }

        messages.extend(username_rule_failures(&self.username));
        messages.extend(email_rule_failures(&self.email));

        if messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation { messages })
        }
    }
}

fn username_rule_failures(username: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if username.len() < 3 {
        messages.push("Username must be at least 3 characters long.".to_string());
    }

    let allowed =
        username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !allowed || username.is_empty() {
        messages.push(
            "Username can only contain letters, numbers, hyphens, and underscores.".to_string(),
        );
    }

    messages
}

fn email_rule_failures(email: &str) -> Vec<String> {
    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if valid {
        Vec::new()
    } else {
        vec!["Please enter a valid email address.".to_string()]
    }
}
