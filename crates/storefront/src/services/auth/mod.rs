//! Authentication service.
//!
//! Passwords are hashed with Argon2id. Form-level checks (matching
//! passwords, length, username characters) happen in [`crate::forms`]
//! before anything reaches this service.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::forms::{Credentials, NewAccount};
use crate::models::{Customer, User};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Create the account and its customer profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameTaken` or `AuthError::EmailTaken` on a
    /// uniqueness collision.
    /// Returns `AuthError::Repository` for other database errors.
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub async fn register(&self, account: &NewAccount) -> Result<(User, Customer), AuthError> {
        let password_hash = hash_password(account.password.expose_secret())?;

        let new_user = NewUser {
            username: account.username.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            password_hash,
        };

        let (user, customer) = self
            .users
            .create_with_customer(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) if field == "email" => AuthError::EmailTaken,
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, customer_id = %customer.id, "Registered new user");
        Ok((user, customer))
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// the password is wrong.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let Some((user, password_hash)) = self
            .users
            .get_password_hash(&credentials.username)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(credentials.password.expose_secret(), &password_hash)?;

        Ok(user)
    }
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("kumush-uzuk-77").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("kumush-uzuk-77", &hash).is_ok());
        assert!(matches!(
            verify_password("oltin-uzuk-77", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("kumush-uzuk-77").unwrap();
        let b = hash_password("kumush-uzuk-77").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
