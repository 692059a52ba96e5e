// Validation utilities module
// Provides custom validation functions for domain-specific rules

use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

/// Rejects empty and whitespace-only strings
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Must not be blank".into());
        Err(error)
    } else {
        Ok(())
    }
}

/// Flattens validator errors into `{ field: [message, ...] }`
///
/// Falls back to the error code when a rule carries no message.
pub fn field_errors(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();

    for (field, field_errors) in errors.field_errors() {
        let messages = field_errors
            .iter()
            .map(|error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                Value::String(message)
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }

    Value::Object(fields)
}
