//! Product review form.

use serde::Deserialize;

use super::{FieldSpec, FormErrors, InputKind, required};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub text: String,
}

impl ReviewForm {
    pub const FIELDS: &'static [FieldSpec] = &[FieldSpec::new(
        "text",
        InputKind::Textarea,
        "Sizning izohingiz",
    )];

    /// The trimmed review text.
    ///
    /// # Errors
    ///
    /// Returns `FormErrors` if the text is blank.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = required(&mut errors, "text", &self.text, None);
        errors.into_result(text)
    }
}
