//! Login form.

use secrecy::SecretString;
use serde::Deserialize;

use super::{FieldSpec, FormErrors, InputKind, required};

#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl LoginForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("username", InputKind::Text, "Login"),
        FieldSpec::new("password", InputKind::Password, "Parol"),
    ];

    /// Message shown when the username or password is wrong.
    pub const INVALID_CREDENTIALS: &'static str =
        "Please enter a correct username and password. Note that both fields may be case-sensitive.";

    /// # Errors
    ///
    /// Returns `FormErrors` if either field is blank.
    pub fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::new();
        let username = required(&mut errors, "username", &self.username, None);
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }
        errors.into_result(Credentials {
            username,
            password: SecretString::from(self.password.clone()),
        })
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            _ => "",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let form = LoginForm {
            username: " aziz_k ".to_string(),
            password: "kumush-uzuk-77".to_string(),
        };
        assert_eq!(form.validate().unwrap().username, "aziz_k");

        let errors = LoginForm::default().validate().unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("password"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(LoginForm::FIELDS[0].placeholder, "Login");
        assert_eq!(LoginForm::FIELDS[1].placeholder, "Parol");
        assert!(!LoginForm::FIELDS[1].keeps_value());
    }
}
