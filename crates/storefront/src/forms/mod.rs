//! HTML form bindings and validation.
//!
//! Each form is a `Deserialize` struct bound with `axum::Form`. Its
//! `validate()` either returns a validated value the repositories accept or a
//! [`FormErrors`] to render back next to the inputs. Nothing is written to
//! the database until validation passes.
//!
//! Every form also lists its inputs as [`FieldSpec`]s so templates render
//! them uniformly.

pub mod customer;
pub mod login;
pub mod registration;
pub mod review;
pub mod shipping;

use std::collections::BTreeMap;
use std::fmt;

pub use customer::CustomerForm;
pub use login::{Credentials, LoginForm};
pub use registration::{NewAccount, RegistrationForm};
pub use review::ReviewForm;
pub use shipping::ShippingForm;

/// CSS class applied to every rendered input.
pub const INPUT_CLASS: &str = "form-control";

/// HTML input element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Email,
    Password,
    Textarea,
}

impl InputKind {
    /// The `type` attribute for `<input>` kinds.
    #[must_use]
    pub const fn html_type(self) -> &'static str {
        match self {
            Self::Text | Self::Textarea => "text",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// Presentation metadata for one form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: InputKind,
    pub placeholder: &'static str,
}

impl FieldSpec {
    pub(crate) const fn new(name: &'static str, kind: InputKind, placeholder: &'static str) -> Self {
        Self {
            name,
            kind,
            placeholder,
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        INPUT_CLASS
    }

    #[must_use]
    pub const fn is_textarea(&self) -> bool {
        matches!(self.kind, InputKind::Textarea)
    }

    #[must_use]
    pub const fn html_type(&self) -> &'static str {
        self.kind.html_type()
    }

    /// Passwords are never echoed back into a re-rendered form.
    #[must_use]
    pub const fn keeps_value(&self) -> bool {
        !matches!(self.kind, InputKind::Password)
    }
}

/// Validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Record an error that belongs to the form as a whole.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field; empty if it passed.
    #[must_use]
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    #[must_use]
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    /// `Ok(value)` if nothing was recorded, otherwise the errors.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.non_field.clone();
        for (field, messages) in &self.fields {
            for message in messages {
                parts.push(format!("{field}: {message}"));
            }
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FormErrors {}

/// Trim a required text input, recording an error if it is blank or longer
/// than `max` characters.
pub(crate) fn required(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    max: Option<usize>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }
    value.to_owned()
}
