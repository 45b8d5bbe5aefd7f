//! Structured output schemas
//!
//! An [`OutputSchema`] describes the shape an agent's final answer must take.
//! Validation is structural, against a JSON Schema document, and collects the
//! full violation set in one pass rather than stopping at the first failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON Schema constraint on an agent's final output.
///
/// Construct one from a raw schema document, or derive it from a Rust type
/// with [`OutputSchema::from_type`]:
///
/// ```rust
/// use agent_relay::schema::OutputSchema;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, JsonSchema)]
/// struct HomeworkAnswer {
///     answer: String,
///     question_level: String,
/// }
///
/// let schema = OutputSchema::from_type::<HomeworkAnswer>();
/// let ok = serde_json::json!({"answer": "4", "question_level": "element-school"});
/// assert!(schema.violations(&ok).is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    document: Value,
}

impl OutputSchema {
    /// Wraps a raw JSON Schema document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Derives the schema document from a schemars-annotated type.
    pub fn from_type<T: schemars::JsonSchema>() -> Self {
        let root = schemars::gen::SchemaGenerator::default().into_root_schema_for::<T>();
        let document = serde_json::to_value(root).unwrap_or(Value::Null);
        Self { document }
    }

    /// Returns the underlying schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validates `value` against the schema, returning every violation.
    ///
    /// An empty vector means the value conforms. A schema document that fails
    /// to compile is reported as a violation rather than a panic, so a
    /// misconfigured agent surfaces as a normal validation failure.
    pub fn violations(&self, value: &Value) -> Vec<String> {
        if self.document.is_null() {
            return Vec::new();
        }
        match jsonschema::validator_for(&self.document) {
            Ok(validator) => validator
                .iter_errors(value)
                .map(|error| format!("at {}: {}", error.instance_path, error))
                .collect(),
            Err(e) => vec![format!("invalid JSON Schema document: {e}")],
        }
    }

    /// Convenience check used by the dispatch loop.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.violations(value).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct WeatherReport {
        location: String,
        temperature: f64,
        unit: String,
        condition: String,
    }

    #[test]
    fn test_conforming_value_passes() {
        let schema = OutputSchema::new(json!({
            "type": "object",
            "properties": {
                "answer": {"type": "string"},
                "confidence": {"type": "number"}
            },
            "required": ["answer"]
        }));

        let violations = schema.violations(&json!({"answer": "42", "confidence": 0.9}));
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn test_missing_required_field_reported() {
        let schema = OutputSchema::new(json!({
            "type": "object",
            "properties": {"answer": {"type": "string"}},
            "required": ["answer"]
        }));

        let violations = schema.violations(&json!({"other": 1}));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("answer"));
    }

    #[test]
    fn test_enum_constraint() {
        let schema = OutputSchema::new(json!({
            "type": "object",
            "properties": {
                "question_level": {
                    "type": "string",
                    "enum": ["element-school", "high-school", "university"]
                }
            },
            "required": ["question_level"]
        }));

        assert!(schema.is_valid(&json!({"question_level": "university"})));
        assert!(!schema.is_valid(&json!({"question_level": "kindergarten"})));
    }

    #[test]
    fn test_derived_schema_validates() {
        let schema = OutputSchema::from_type::<WeatherReport>();

        let ok = json!({
            "location": "Sapporo",
            "temperature": 15.0,
            "unit": "C",
            "condition": "rain"
        });
        assert!(schema.is_valid(&ok));

        // temperature must be a number
        let bad = json!({
            "location": "Sapporo",
            "temperature": "cold",
            "unit": "C",
            "condition": "rain"
        });
        let violations = schema.violations(&bad);
        assert!(!violations.is_empty());
        assert!(violations.iter().any(|v| v.contains("temperature")));
    }

    #[test]
    fn test_malformed_document_is_a_violation() {
        let schema = OutputSchema::new(json!({"type": "no-such-type"}));
        let violations = schema.violations(&json!({}));
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_null_document_accepts_everything() {
        let schema = OutputSchema::new(Value::Null);
        assert!(schema.is_valid(&json!("anything")));
    }
}
