//! Customer profile form.

use serde::Deserialize;

use super::{FieldSpec, FormErrors, InputKind, required};
use crate::models::Customer;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Validated profile names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerNames {
    pub first_name: String,
    pub last_name: String,
}

impl CustomerForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("first_name", InputKind::Text, "Ismingiz"),
        FieldSpec::new("last_name", InputKind::Text, "Familiyangiz"),
    ];

    /// Prefill from an existing profile.
    #[must_use]
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `FormErrors` if a name is blank or too long.
    pub fn validate(&self) -> Result<CustomerNames, FormErrors> {
        let mut errors = FormErrors::new();
        let max = Some(Customer::NAME_MAX_LENGTH);
        let names = CustomerNames {
            first_name: required(&mut errors, "first_name", &self.first_name, max),
            last_name: required(&mut errors, "last_name", &self.last_name, max),
        };
        errors.into_result(names)
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        match field {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
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
        let form = CustomerForm {
            first_name: "Aziz".to_string(),
            last_name: " Karimov ".to_string(),
        };
        let names = form.validate().unwrap();
        assert_eq!(names.last_name, "Karimov");

        let form = CustomerForm {
            first_name: String::new(),
            last_name: "x".repeat(256),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("first_name"));
        assert!(errors.has("last_name"));
    }
}
