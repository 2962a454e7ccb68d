//! Accounts and customer profiles.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bozor_core::{CustomerId, Email, UserId};

/// A login account.
///
/// The password hash is never loaded into this struct; see
/// [`crate::db::users::UserRepository::get_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const USERNAME_MAX_LENGTH: usize = 150;
}

/// Shopper profile. Outlives its user: deleting the user only clears
/// `user_id`, so order history stays attached to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
}

impl Customer {
    pub const NAME_MAX_LENGTH: usize = 255;

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl std::fmt::Display for Customer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.first_name)
    }
}
