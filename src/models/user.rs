use serde::{Deserialize, Serialize};

use crate::constants::{MAX_USERNAME_LEN, USER_PLANS};

/// User record stored in the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Derived from the email address, see `security::user_id_from_email`
    pub id: String,
    pub username: String,
    /// Hex HMAC-SHA256 of the password, never the password itself
    pub password_hash: String,
    pub email: String,
    pub plan: String,
    /// Unix timestamps
    pub created: i64,
    pub updated: i64,
}

impl User {
    /// Minimal structural email check: one `@`, non-empty local part, dotted domain
    pub fn validate_email(email: &str) -> bool {
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        }
    }

    pub fn validate_username(username: &str) -> bool {
        let trimmed = username.trim();
        !trimmed.is_empty() && trimmed.chars().count() <= MAX_USERNAME_LEN
    }

    pub fn validate_plan(plan: &str) -> bool {
        USER_PLANS.contains(&plan)
    }
}
