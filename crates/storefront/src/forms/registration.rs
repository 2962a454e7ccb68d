//! Account registration form.

use secrecy::SecretString;
use serde::Deserialize;

use bozor_core::{Email, EmailError};

use super::{FieldSpec, FormErrors, InputKind, required};
use crate::models::User;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const NAME_MAX_LENGTH: usize = 150;

/// Raw registration input.
#[derive(Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// A registration that passed validation. Uniqueness of username and email
/// is only known once the insert runs.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: SecretString,
}

impl RegistrationForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("username", InputKind::Text, "Ismingiz"),
        FieldSpec::new("first_name", InputKind::Text, "Ismingiz"),
        FieldSpec::new("last_name", InputKind::Text, "Familiyangiz"),
        FieldSpec::new("email", InputKind::Email, "Emailingiz"),
        FieldSpec::new("password1", InputKind::Password, "Parol"),
        FieldSpec::new("password2", InputKind::Password, "Parolni tasdiqlang"),
    ];

    /// # Errors
    ///
    /// Returns `FormErrors` describing every field that failed.
    pub fn validate(&self) -> Result<NewAccount, FormErrors> {
        let mut errors = FormErrors::new();

        let username = required(
            &mut errors,
            "username",
            &self.username,
            Some(User::USERNAME_MAX_LENGTH),
        );
        if !username.is_empty() && !is_valid_username(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let first_name = required(&mut errors, "first_name", &self.first_name, Some(NAME_MAX_LENGTH));
        let last_name = required(&mut errors, "last_name", &self.last_name, Some(NAME_MAX_LENGTH));

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(EmailError::Empty) => {
                errors.add("email", "This field is required.");
                None
            }
            Err(_) => {
                errors.add("email", "Enter a valid email address.");
                None
            }
        };

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        }
        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            for problem in password_problems(&self.password1, &username) {
                errors.add("password2", problem);
            }
        }

        match email {
            Some(email) if errors.is_empty() => Ok(NewAccount {
                username,
                first_name,
                last_name,
                email,
                password: SecretString::from(self.password1.clone()),
            }),
            _ => Err(errors),
        }
    }

    /// Current value of a non-password field, for re-rendering.
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "email" => &self.email,
            _ => "",
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password.eq_ignore_ascii_case(username) {
        problems.push("The password is too similar to the username.".to_string());
    }
    problems
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            username: "aziz_k".to_string(),
            first_name: "Aziz".to_string(),
            last_name: "Karimov".to_string(),
            email: "Aziz@Example.UZ".to_string(),
            password1: "kumush-uzuk-77".to_string(),
            password2: "kumush-uzuk-77".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let account = filled().validate().unwrap();
        assert_eq!(account.username, "aziz_k");
        assert_eq!(account.email.as_str(), "Aziz@example.uz");
        assert_eq!(account.password.expose_secret(), "kumush-uzuk-77");
    }

    #[test]
    fn test_mismatched_passwords() {
        let form = RegistrationForm {
            password2: "something-else-1".to_string(),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("password2"), ["The two password fields didn't match."]);
        assert!(!errors.has("username"));
    }

    #[test]
    fn test_weak_passwords() {
        let short = RegistrationForm {
            password1: "abc12".to_string(),
            password2: "abc12".to_string(),
            ..filled()
        };
        assert!(short.validate().unwrap_err().field("password2")[0].contains("too short"));

        let numeric = RegistrationForm {
            password1: "1234567890".to_string(),
            password2: "1234567890".to_string(),
            ..filled()
        };
        assert!(
            numeric.validate().unwrap_err().field("password2")[0].contains("entirely numeric")
        );
    }

    #[test]
    fn test_invalid_username_and_email() {
        let form = RegistrationForm {
            username: "aziz karimov".to_string(),
            email: "not-an-email".to_string(),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("username"));
        assert_eq!(errors.field("email"), ["Enter a valid email address."]);
    }

    #[test]
    fn test_missing_fields() {
        let errors = RegistrationForm::default().validate().unwrap_err();
        for field in ["username", "first_name", "last_name", "email", "password1", "password2"] {
            assert!(errors.has(field), "{field} should be required");
        }
    }

    #[test]
    fn test_placeholders() {
        let placeholders: Vec<_> = RegistrationForm::FIELDS
            .iter()
            .map(|f| (f.name, f.placeholder))
            .collect();
        assert_eq!(
            placeholders,
            [
                ("username", "Ismingiz"),
                ("first_name", "Ismingiz"),
                ("last_name", "Familiyangiz"),
                ("email", "Emailingiz"),
                ("password1", "Parol"),
                ("password2", "Parolni tasdiqlang"),
            ]
        );
    }
}
