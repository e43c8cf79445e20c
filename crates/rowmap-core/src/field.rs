//! Field rules
//!
//! A [`Field`] extracts one value from a record by key, falling back to a
//! default when the key is absent and optionally passing the found value
//! through a filter. A [`Computed`] field is an arbitrary function of the
//! whole record. Both live in a transformer's registry as a [`FieldRule`].

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::Record;
use crate::error::{Error, Result};

/// Unary transform applied to a value found under a field's key
pub type Filter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

type ComputeFn = dyn Fn(&Record) -> Result<Value> + Send + Sync;

/// Declarative extraction rule
#[derive(Clone)]
pub struct Field {
    key: String,
    default: Value,
    filter: Option<Filter>,
}

impl Field {
    /// Extract `key`, producing `null` when it is absent
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: Value::Null,
            filter: None,
        }
    }

    /// Value returned when the key is absent. Never filtered.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Transform applied to the extracted value
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Same as [`Field::with_filter`] for an already shared filter
    pub fn with_shared_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Source key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Configured default
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whether a filter was supplied
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Resolve this field against a record
    pub fn evaluate(&self, record: &Record) -> Value {
        match record.get(&self.key) {
            Some(value) => match &self.filter {
                Some(filter) => filter(value),
                None => value.clone(),
            },
            None => self.default.clone(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Field whose value is computed from the whole record
pub struct Computed {
    func: Box<ComputeFn>,
}

impl Computed {
    /// Wrap an infallible function
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self {
            func: Box::new(move |record| Ok(func(record))),
        }
    }

    /// Wrap a function that may fail
    pub fn fallible<F>(func: F) -> Self
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }

    /// Run the function against a record
    pub fn evaluate(&self, record: &Record) -> Result<Value> {
        (self.func)(record)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(<fn>)")
    }
}

/// Resolved evaluator stored in a transformer registry
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Declarative [`Field`]
    Declared(Arc<Field>),
    /// Function of the record
    Computed(Arc<Computed>),
}

impl FieldRule {
    /// Evaluate against a record
    pub fn evaluate(&self, record: &Record) -> Result<Value> {
        match self {
            Self::Declared(field) => Ok(field.evaluate(record)),
            Self::Computed(computed) => computed.evaluate(record),
        }
    }

    /// Evaluate as the field declared under `name`.
    ///
    /// A computed rule's failure is reported as [`Error::Computed`] naming
    /// that field; errors already in that form pass through.
    pub fn evaluate_as(&self, name: &str, record: &Record) -> Result<Value> {
        self.evaluate(record).map_err(|err| match err {
            Error::Computed { .. } => err,
            other => Error::Computed {
                field: name.to_string(),
                message: other.to_string(),
            },
        })
    }

    /// The underlying [`Field`], if this is a declared rule
    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Self::Declared(field) => Some(field),
            Self::Computed(_) => None,
        }
    }

    /// Whether this is a computed rule
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    /// Identity comparison: both rules point at the same declaration
    pub fn ptr_eq(&self, other: &FieldRule) -> bool {
        match (self, other) {
            (Self::Declared(a), Self::Declared(b)) => Arc::ptr_eq(a, b),
            (Self::Computed(a), Self::Computed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Field> for FieldRule {
    fn from(field: Field) -> Self {
        Self::Declared(Arc::new(field))
    }
}

impl From<Computed> for FieldRule {
    fn from(computed: Computed) -> Self {
        Self::Computed(Arc::new(computed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_field_extracts_or_defaults() {
        let row = record(json!({"name": "John"}));
        let field = Field::new("name").with_default("Jane");

        assert_eq!(field.evaluate(&row), json!("John"));
        assert_eq!(field.evaluate(&Record::new()), json!("Jane"));
    }

    #[test]
    fn test_field_applies_filter() {
        let row = record(json!({"name": "John"}));
        let field = Field::new("name")
            .with_filter(|v| json!(v.as_str().unwrap_or_default().to_uppercase()));

        assert_eq!(field.evaluate(&row), json!("JOHN"));
    }

    #[test]
    fn test_default_bypasses_filter() {
        let field = Field::new("name")
            .with_default("jane")
            .with_filter(|_| json!("filtered"));

        assert_eq!(field.evaluate(&Record::new()), json!("jane"));
    }

    #[test]
    fn test_missing_key_without_default_is_null() {
        assert_eq!(Field::new("age").evaluate(&Record::new()), Value::Null);
    }

    #[rstest]
    #[case(json!({"v": null}), Value::Null)]
    #[case(json!({"v": 0}), json!(0))]
    #[case(json!({"v": [1, 2]}), json!([1, 2]))]
    #[case(json!({"v": {"nested": true}}), json!({"nested": true}))]
    fn test_present_values_are_returned_as_is(#[case] row: Value, #[case] expected: Value) {
        let field = Field::new("v").with_default("fallback");
        assert_eq!(field.evaluate(&record(row)), expected);
    }

    #[test]
    fn test_computed_rule() {
        let rule = FieldRule::from(Computed::new(|row| json!(row.len())));
        let row = record(json!({"a": 1, "b": 2}));
        assert_eq!(rule.evaluate(&row).unwrap(), json!(2));
        assert!(rule.is_computed());
        assert!(rule.as_field().is_none());
    }

    #[test]
    fn test_computed_failure_names_the_field() {
        let rule = FieldRule::from(Computed::fallible(|_| {
            Err(Error::ConfigInvalid {
                message: "boom".to_string(),
            })
        }));
        match rule.evaluate_as("total", &Record::new()) {
            Err(Error::Computed { field, message }) => {
                assert_eq!(field, "total");
                assert!(message.contains("boom"));
            }
            other => panic!("Expected Computed error, got {:?}", other),
        }
    }

    #[test]
    fn test_ptr_eq_tracks_identity() {
        let a = FieldRule::from(Field::new("name"));
        let b = FieldRule::from(Field::new("name"));
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
