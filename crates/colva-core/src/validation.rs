//! # Validation Module
//!
//! Field rules checked before any call reaches the backend.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (no I/O)                                         │
//! │  ├── Client form: required fields, phone digits, email shape           │
//! │  ├── Registration: id, username, password length + confirmation        │
//! │  └── Catalog: product name, units, price                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Commands (apps/cli)                                          │
//! │  ├── Session / role checks                                             │
//! │  └── Stock re-check against a fresh catalog snapshot                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PostgreSQL                                                   │
//! │  ├── UNIQUE (users.username, products.name)                            │
//! │  ├── CHECK  (role, units >= 0)                                         │
//! │  └── FOREIGN KEY (quotations → users, line items → quotations)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::ValidationError;
use crate::types::{ClientForm, ClientInfo, DocumentType};
use crate::{
    MAX_DOCUMENT_NUMBER_LEN, MAX_ENVIRONMENT_LABEL_LEN, MAX_PRODUCT_NAME_LEN, MAX_USERNAME_LEN,
    MAX_TAX_RATE_BPS, MIN_PASSWORD_LEN, PHONE_MAX_DIGITS, PHONE_MIN_DIGITS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Client Form
// =============================================================================

/// Outcome of validating a client form: every failing field, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientValidation {
    pub errors: BTreeMap<&'static str, ValidationError>,
}

impl ClientValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    /// One line per field, in field order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.values().map(|e| e.to_string()).collect()
    }
}

/// Serialized as `{ "phone": "phone has invalid format: ..." }`.
impl Serialize for ClientValidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let messages: BTreeMap<&str, String> = self
            .errors
            .iter()
            .map(|(field, err)| (*field, err.to_string()))
            .collect();
        messages.serialize(serializer)
    }
}

/// Validates the client block of a quotation.
///
/// ## Rules
/// | Field             | Rule                                        |
/// |-------------------|---------------------------------------------|
/// | `document_type`   | required, one of CC / CE / PA / NIT         |
/// | `document_number` | required, at most 15 characters             |
/// | `names`           | required                                    |
/// | `surnames`        | required                                    |
/// | `phone`           | required, 7 to 10 ASCII digits              |
/// | `email`           | optional, `x@y.z` shape when present        |
///
/// Every field is checked; the result lists all failures, not just the first.
pub fn validate_client_fields(form: &ClientForm) -> ClientValidation {
    let mut errors = BTreeMap::new();

    if let Err(e) = validate_document_type(&form.document_type) {
        errors.insert("document_type", e);
    }
    if let Err(e) = validate_document_number(&form.document_number) {
        errors.insert("document_number", e);
    }
    if let Err(e) = require("names", &form.names) {
        errors.insert("names", e);
    }
    if let Err(e) = require("surnames", &form.surnames) {
        errors.insert("surnames", e);
    }
    if let Err(e) = validate_phone(&form.phone) {
        errors.insert("phone", e);
    }
    if let Err(e) = validate_optional_email(&form.email) {
        errors.insert("email", e);
    }

    ClientValidation { errors }
}

impl ClientForm {
    /// Validates and trims the form into a client snapshot.
    pub fn into_client(self) -> Result<ClientInfo, ClientValidation> {
        let validation = validate_client_fields(&self);
        if !validation.is_valid() {
            return Err(validation);
        }

        let document_type = match validate_document_type(&self.document_type) {
            Ok(t) => t,
            Err(e) => {
                let mut validation = validation;
                validation.errors.insert("document_type", e);
                return Err(validation);
            }
        };

        let email = self.email.trim();
        Ok(ClientInfo {
            document_type,
            document_number: self.document_number.trim().to_string(),
            names: self.names.trim().to_string(),
            surnames: self.surnames.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
        })
    }
}

/// Parses the document type code.
pub fn validate_document_type(value: &str) -> ValidationResult<DocumentType> {
    require("document_type", value)?;
    value.parse()
}

pub fn validate_document_number(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    require("document_number", value)?;

    if value.chars().count() > MAX_DOCUMENT_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "document_number".to_string(),
            max: MAX_DOCUMENT_NUMBER_LEN,
        });
    }

    Ok(())
}

/// Phone must be 7-10 ASCII digits, nothing else.
///
/// ```rust
/// use colva_core::validation::validate_phone;
///
/// assert!(validate_phone("3001234567").is_ok());
/// assert!(validate_phone("300-123-4567").is_err());
/// assert!(validate_phone("123456").is_err());
/// ```
pub fn validate_phone(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    require("phone", value)?;

    let digits_only = value.chars().all(|c| c.is_ascii_digit());
    let len = value.len();
    if !digits_only || !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&len) {
        return Err(ValidationError::invalid(
            "phone",
            format!("must be {} to {} digits", PHONE_MIN_DIGITS, PHONE_MAX_DIGITS),
        ));
    }

    Ok(())
}

/// Empty is accepted; otherwise the value must look like `local@domain.tld`.
pub fn validate_optional_email(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    validate_email(value)
}

/// Shape check: non-space `@` non-space `.` non-space, no whitespace anywhere.
pub fn validate_email(value: &str) -> ValidationResult<()> {
    let bad = || ValidationError::invalid("email", "expected an address like name@domain.com");

    if value.chars().any(char::is_whitespace) {
        return Err(bad());
    }

    let (local, domain) = value.split_once('@').ok_or_else(bad)?;
    if local.is_empty() {
        return Err(bad());
    }

    // Needs a dot with at least one char on each side, after the '@'
    let has_dotted_domain = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_dotted_domain {
        return Err(bad());
    }

    Ok(())
}

// =============================================================================
// Registration
// =============================================================================

/// Identification numbers double as user ids and must be positive.
pub fn validate_user_id(id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "id".to_string(),
        });
    }
    Ok(())
}

/// Parses a user id typed as text.
pub fn parse_user_id(value: &str) -> ValidationResult<i64> {
    let value = value.trim();
    require("id", value)?;
    let id = value
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid("id", "must be a number"))?;
    validate_user_id(id)?;
    Ok(id)
}

pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();
    require("username", username)?;

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }

    Ok(())
}

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub id: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Validated registration, ready to be hashed and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: i64,
    pub username: String,
    pub password: String,
}

/// Checks a registration form. Stops at the first failing field.
pub fn validate_registration(form: &RegistrationForm) -> ValidationResult<Registration> {
    let id = parse_user_id(&form.id)?;
    validate_username(&form.username)?;
    validate_password(&form.password)?;

    if form.password != form.confirm_password {
        return Err(ValidationError::Mismatch {
            field: "confirm_password".to_string(),
            other: "password".to_string(),
        });
    }

    Ok(Registration {
        id,
        username: form.username.trim().to_string(),
        password: form.password.clone(),
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Product names are trimmed before storage; the trimmed form is checked.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    require("name", name)?;

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

pub fn validate_units(units: i64) -> ValidationResult<()> {
    if units < 0 {
        return Err(ValidationError::Negative {
            field: "units".to_string(),
        });
    }
    Ok(())
}

/// Zero is allowed (promotional items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "unit_cost".to_string(),
        });
    }
    Ok(())
}

/// 0 to 10000 basis points (0 % to 100 %).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: i64::from(MAX_TAX_RATE_BPS),
        });
    }
    Ok(())
}

pub fn validate_environment_label(label: &str) -> ValidationResult<()> {
    let label = label.trim();
    require("environment", label)?;

    if label.chars().count() > MAX_ENVIRONMENT_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: "environment".to_string(),
            max: MAX_ENVIRONMENT_LABEL_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> ClientForm {
        ClientForm {
            document_type: "CC".to_string(),
            document_number: "12345678".to_string(),
            names: "Ana".to_string(),
            surnames: "Gomez".to_string(),
            phone: "3001234567".to_string(),
            email: String::new(),
        }
    }

    #[test]
    fn test_complete_client_is_valid() {
        let validation = validate_client_fields(&ana());
        assert!(validation.is_valid(), "{:?}", validation);

        let client = ana().into_client().unwrap();
        assert_eq!(client.document_type, DocumentType::CC);
        assert_eq!(client.email, None);
        assert_eq!(client.full_name(), "Ana Gomez");
    }

    #[test]
    fn test_each_required_field_is_reported() {
        let fields = [
            "document_type",
            "document_number",
            "names",
            "surnames",
            "phone",
        ];
        for field in fields {
            let mut form = ana();
            match field {
                "document_type" => form.document_type.clear(),
                "document_number" => form.document_number = "   ".to_string(),
                "names" => form.names.clear(),
                "surnames" => form.surnames.clear(),
                _ => form.phone.clear(),
            }
            let validation = validate_client_fields(&form);
            assert!(!validation.is_valid());
            assert_eq!(
                validation.error_for(field),
                Some(&ValidationError::required(field)),
                "field {}",
                field
            );
            assert_eq!(validation.errors.len(), 1);
        }
    }

    #[test]
    fn test_all_failures_collected() {
        let validation = validate_client_fields(&ClientForm::default());
        assert_eq!(validation.errors.len(), 5);
        assert!(validation.error_for("email").is_none());
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("1234567").is_ok());
        assert!(validate_phone("1234567890").is_ok());
        assert!(validate_phone("123456").is_err());
        assert!(validate_phone("12345678901").is_err());
        assert!(validate_phone("300 123 4567").is_err());
        assert!(validate_phone("３００１２３４").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_optional_email("").is_ok());
        assert!(validate_optional_email("ana@example.com").is_ok());
        assert!(validate_optional_email("a@b.co").is_ok());
        assert!(validate_optional_email("ana@example").is_err());
        assert!(validate_optional_email("@example.com").is_err());
        assert!(validate_optional_email("ana@.com").is_err());
        assert!(validate_optional_email("ana@example.").is_err());
        assert!(validate_optional_email("ana gomez@example.com").is_err());

        let mut form = ana();
        form.email = "not-an-email".to_string();
        let validation = validate_client_fields(&form);
        assert!(matches!(
            validation.error_for("email"),
            Some(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_client_validation_serializes_messages() {
        let mut form = ana();
        form.phone = "12".to_string();
        let json = serde_json::to_value(validate_client_fields(&form)).unwrap();
        assert_eq!(json["phone"], "phone has invalid format: must be 7 to 10 digits");
    }

    #[test]
    fn test_document_number_length() {
        assert!(validate_document_number("123456789012345").is_ok());
        assert!(validate_document_number("1234567890123456").is_err());
    }

    #[test]
    fn test_registration() {
        let form = RegistrationForm {
            id: "1020304050".to_string(),
            username: " maria ".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };
        let reg = validate_registration(&form).unwrap();
        assert_eq!(reg.id, 1020304050);
        assert_eq!(reg.username, "maria");

        let short = RegistrationForm {
            password: "12345".to_string(),
            confirm_password: "12345".to_string(),
            ..form.clone()
        };
        assert!(matches!(
            validate_registration(&short),
            Err(ValidationError::TooShort { .. })
        ));

        let mismatch = RegistrationForm {
            confirm_password: "secret2".to_string(),
            ..form.clone()
        };
        assert!(matches!(
            validate_registration(&mismatch),
            Err(ValidationError::Mismatch { .. })
        ));

        let bad_id = RegistrationForm {
            id: "abc".to_string(),
            ..form
        };
        assert!(validate_registration(&bad_id).is_err());
    }

    #[test]
    fn test_catalog_rules() {
        assert!(validate_product_name("Foco LED RGB Controlado").is_ok());
        assert!(validate_product_name("  ").is_err());
        assert!(validate_units(0).is_ok());
        assert!(validate_units(-1).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-100).is_err());
        assert!(validate_environment_label("Cocina").is_ok());
        assert!(validate_environment_label("").is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1900).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert_eq!(validate_tax_rate_bps(10_001).unwrap_err().field(), "tax_rate");
    }
}
