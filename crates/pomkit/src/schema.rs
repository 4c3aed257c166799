//! Runtime shape validation for JSON payloads.
//!
//! A [`Schema`] lists the fields an object must carry and their primitive
//! types. Payloads are checked against it before any typed parse, so a
//! malformed response is reported with every offending path instead of the
//! first serde error.

use crate::result::{PomError, PomResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
}

impl FieldType {
    /// Name used in violation messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Describe the JSON type of a value the way violations report it.
#[must_use]
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared field of a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Wire name
    pub name: &'static str,
    /// Expected type
    pub ty: FieldType,
    /// Whether the field must be present
    pub required: bool,
}

impl Field {
    /// A field that must be present.
    #[must_use]
    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    /// A field that may be omitted. When present it must not be `null`.
    #[must_use]
    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// A single mismatch between a payload and its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeViolation {
    /// JSON path of the offending value (`$`, `$.title`, `$[3].id`)
    pub path: String,
    /// What the schema expected
    pub expected: String,
    /// What was found
    pub found: String,
}

impl ShapeViolation {
    /// Create a violation.
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl std::fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, found {}",
            self.path, self.expected, self.found
        )
    }
}

/// Declared shape of a JSON object.
///
/// Unknown fields are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    name: &'static str,
    fields: &'static [Field],
}

impl Schema {
    /// Create a schema.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [Field]) -> Self {
        Self { name, fields }
    }

    /// Schema name used in errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Collect every violation of `value` against this schema.
    #[must_use]
    pub fn check(&self, value: &Value) -> Vec<ShapeViolation> {
        let mut violations = Vec::new();
        self.check_at("$", value, &mut violations);
        violations
    }

    fn check_at(&self, path: &str, value: &Value, out: &mut Vec<ShapeViolation>) {
        let Some(object) = value.as_object() else {
            out.push(ShapeViolation::new(path, "object", describe(value)));
            return;
        };

        for field in self.fields {
            let field_path = format!("{path}.{}", field.name);
            match object.get(field.name) {
                None if field.required => {
                    out.push(ShapeViolation::new(field_path, field.ty.name(), "missing"));
                }
                None => {}
                Some(found) if !field.ty.accepts(found) => {
                    out.push(ShapeViolation::new(
                        field_path,
                        field.ty.name(),
                        describe(found),
                    ));
                }
                Some(_) => {}
            }
        }

        for (key, found) in object {
            if !self.fields.iter().any(|f| f.name == key) {
                out.push(ShapeViolation::new(
                    format!("{path}.{key}"),
                    "no such field",
                    describe(found),
                ));
            }
        }
    }

    /// Check a JSON array whose elements must all match this schema.
    #[must_use]
    pub fn check_list(&self, value: &Value) -> Vec<ShapeViolation> {
        let mut violations = Vec::new();
        match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_at(&format!("$[{i}]"), item, &mut violations);
                }
            }
            None => violations.push(ShapeViolation::new("$", "array", describe(value))),
        }
        violations
    }

    /// Validate a single object.
    ///
    /// # Errors
    ///
    /// Returns [`PomError::Validation`] listing every violation.
    pub fn validate(&self, value: &Value) -> PomResult<()> {
        self.into_result(self.check(value))
    }

    /// Validate an array of objects.
    ///
    /// # Errors
    ///
    /// Returns [`PomError::Validation`] listing every violation.
    pub fn validate_list(&self, value: &Value) -> PomResult<()> {
        self.into_result(self.check_list(value))
    }

    /// Validate then deserialize a single object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the shape does not match.
    pub fn parse<T: DeserializeOwned>(&self, value: Value) -> PomResult<T> {
        self.validate(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Validate then deserialize an array of objects.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any element does not match.
    pub fn parse_list<T: DeserializeOwned>(&self, value: Value) -> PomResult<Vec<T>> {
        self.validate_list(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    fn into_result(&self, violations: Vec<ShapeViolation>) -> PomResult<()> {
        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(schema = self.name, count = violations.len(), "shape mismatch");
            Err(PomError::Validation {
                schema: self.name.to_string(),
                violations,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const ITEM: Schema = Schema::new(
        "Item",
        &[
            Field::required("id", FieldType::Integer),
            Field::required("label", FieldType::String),
            Field::optional("done", FieldType::Boolean),
        ],
    );

    mod check_tests {
        use super::*;

        #[test]
        fn test_valid_object_passes() {
            assert!(ITEM.check(&json!({"id": 1, "label": "a"})).is_empty());
            assert!(ITEM
                .check(&json!({"id": 1, "label": "a", "done": true}))
                .is_empty());
        }

        #[test]
        fn test_missing_required_field() {
            let v = ITEM.check(&json!({"label": "a"}));
            assert_eq!(v, vec![ShapeViolation::new("$.id", "integer", "missing")]);
        }

        #[test]
        fn test_mistyped_field() {
            let v = ITEM.check(&json!({"id": 1, "label": 42}));
            assert_eq!(v, vec![ShapeViolation::new("$.label", "string", "integer")]);
        }

        #[test]
        fn test_float_is_not_integer() {
            let v = ITEM.check(&json!({"id": 1.5, "label": "a"}));
            assert_eq!(v[0].found, "number");
        }

        #[test]
        fn test_extra_field_rejected() {
            let v = ITEM.check(&json!({"id": 1, "label": "a", "colour": "red"}));
            assert_eq!(
                v,
                vec![ShapeViolation::new("$.colour", "no such field", "string")]
            );
        }

        #[test]
        fn test_optional_field_rejects_null() {
            let v = ITEM.check(&json!({"id": 1, "label": "a", "done": null}));
            assert_eq!(v, vec![ShapeViolation::new("$.done", "boolean", "null")]);
        }

        #[test]
        fn test_non_object() {
            let v = ITEM.check(&json!([1, 2]));
            assert_eq!(v, vec![ShapeViolation::new("$", "object", "array")]);
        }

        #[test]
        fn test_collects_all_violations() {
            let v = ITEM.check(&json!({"label": 1, "extra": true}));
            assert_eq!(v.len(), 3);
        }
    }

    mod list_tests {
        use super::*;

        #[test]
        fn test_list_paths_are_indexed() {
            let v = ITEM.check_list(&json!([
                {"id": 1, "label": "ok"},
                {"id": "2", "label": "bad"}
            ]));
            assert_eq!(v, vec![ShapeViolation::new("$[1].id", "integer", "string")]);
        }

        #[test]
        fn test_list_requires_array() {
            let v = ITEM.check_list(&json!({"id": 1, "label": "a"}));
            assert_eq!(v[0].expected, "array");
        }

        #[test]
        fn test_empty_list_is_valid() {
            assert!(ITEM.validate_list(&json!([])).is_ok());
        }
    }

    mod parse_tests {
        use super::*;

        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: u64,
            label: String,
            #[serde(default)]
            done: bool,
        }

        #[test]
        fn test_parse_valid() {
            let item: Item = ITEM.parse(json!({"id": 7, "label": "x"})).unwrap();
            assert_eq!(
                item,
                Item {
                    id: 7,
                    label: "x".to_string(),
                    done: false
                }
            );
        }

        #[test]
        fn test_parse_invalid_never_yields_value() {
            let err = ITEM.parse::<Item>(json!({"id": 7})).unwrap_err();
            match err {
                PomError::Validation { schema, violations } => {
                    assert_eq!(schema, "Item");
                    assert_eq!(violations.len(), 1);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_parse_list() {
            let items: Vec<Item> = ITEM
                .parse_list(json!([{"id": 1, "label": "a"}, {"id": 2, "label": "b"}]))
                .unwrap();
            assert_eq!(items.len(), 2);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_numeric_label_always_rejected(id in 0u64..1_000_000, label in any::<i64>()) {
                let v = ITEM.check(&json!({"id": id, "label": label}));
                prop_assert_eq!(v.len(), 1);
                prop_assert_eq!(&v[0].path, "$.label");
            }

            #[test]
            fn prop_well_formed_always_accepted(id in 0u64..1_000_000, label in ".*", done in any::<bool>()) {
                let v = ITEM.check(&json!({"id": id, "label": label, "done": done}));
                prop_assert!(v.is_empty());
            }
        }
    }
}
