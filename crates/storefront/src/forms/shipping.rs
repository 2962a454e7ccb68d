//! Checkout shipping address form.

use serde::Deserialize;

use super::{FieldSpec, FormErrors, InputKind, required};
use crate::db::orders::NewShippingAddress;

pub const ADDRESS_MAX_LENGTH: usize = 500;
pub const CITY_MAX_LENGTH: usize = 250;
pub const REGION_MAX_LENGTH: usize = 250;
pub const PHONE_MAX_LENGTH: usize = 250;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub phone: String,
}

impl ShippingForm {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("address", InputKind::Text, "Sizning manzil"),
        FieldSpec::new("city", InputKind::Text, "Sizning shahar"),
        FieldSpec::new("region", InputKind::Text, "Sizning tuman"),
        FieldSpec::new("phone", InputKind::Text, "Telefon raqamingiz"),
    ];

    /// # Errors
    ///
    /// Returns `FormErrors` if a field is blank or too long.
    pub fn validate(&self) -> Result<NewShippingAddress, FormErrors> {
        let mut errors = FormErrors::new();
        let address = NewShippingAddress {
            address: required(&mut errors, "address", &self.address, Some(ADDRESS_MAX_LENGTH)),
            city: required(&mut errors, "city", &self.city, Some(CITY_MAX_LENGTH)),
            region: required(&mut errors, "region", &self.region, Some(REGION_MAX_LENGTH)),
            phone: required(&mut errors, "phone", &self.phone, Some(PHONE_MAX_LENGTH)),
        };
        errors.into_result(address)
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        match field {
            "address" => &self.address,
            "city" => &self.city,
            "region" => &self.region,
            "phone" => &self.phone,
            _ => "",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled() -> ShippingForm {
        ShippingForm {
            address: "Amir Temur ko'chasi 15".to_string(),
            city: "Toshkent".to_string(),
            region: "Yunusobod".to_string(),
            phone: "+998 90 123 45 67".to_string(),
        }
    }

    #[test]
    fn test_placeholders_in_order() {
        let placeholders: Vec<_> = ShippingForm::FIELDS.iter().map(|f| f.placeholder).collect();
        assert_eq!(
            placeholders,
            [
                "Sizning manzil",
                "Sizning shahar",
                "Sizning tuman",
                "Telefon raqamingiz"
            ]
        );
    }

    #[test]
    fn test_validate() {
        let address = filled().validate().unwrap();
        assert_eq!(address.city, "Toshkent");
        assert_eq!(address.phone, "+998 90 123 45 67");
    }

    #[test]
    fn test_every_field_required() {
        let errors = ShippingForm::default().validate().unwrap_err();
        for field in ShippingForm::FIELDS {
            assert!(errors.has(field.name), "{} should be required", field.name);
        }
    }

    #[test]
    fn test_address_length() {
        let form = ShippingForm {
            address: "a".repeat(501),
            ..filled()
        };
        assert!(form.validate().unwrap_err().has("address"));
    }
}
