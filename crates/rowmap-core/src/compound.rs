//! Compound fields
//!
//! A declared name such as `age__name` designates one rule whose result is a
//! sequence, unzipped by position into the outputs `age` and `name`. The rule
//! runs once per transformed row; the result is cached so each output can be
//! read back afterwards without running the rule again.

use serde_json::Value;

use crate::Record;
use crate::error::{Error, Result};
use crate::field::FieldRule;

/// Separator between sub-names in a compound declared name
pub const COMPOUND_DELIMITER: &str = "__";

/// Whether a declared name designates a compound field
pub fn is_compound(declared: &str) -> bool {
    declared.contains(COMPOUND_DELIMITER)
}

/// Split a declared name into its output names
pub fn split_name(declared: &str) -> Vec<String> {
    declared
        .split(COMPOUND_DELIMITER)
        .map(str::to_string)
        .collect()
}

/// Rule plus the cache slot holding its most recent result
#[derive(Debug)]
pub struct CompoundField {
    declared: String,
    names: Vec<String>,
    rule: FieldRule,
    cache: Vec<Value>,
    fresh: bool,
}

impl CompoundField {
    /// Wrap `rule` under the compound name `declared`
    pub fn new(declared: impl Into<String>, rule: FieldRule) -> Self {
        let declared = declared.into();
        Self {
            names: split_name(&declared),
            declared,
            rule,
            cache: Vec::new(),
            fresh: false,
        }
    }

    /// Declared compound name
    pub fn declared(&self) -> &str {
        &self.declared
    }

    /// Output names in position order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Underlying rule
    pub fn rule(&self) -> &FieldRule {
        &self.rule
    }

    /// Position of an output name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Run the rule once and overwrite the cache.
    ///
    /// On failure the previous cache is left stale.
    pub fn compute(&mut self, record: &Record) -> Result<&[Value]> {
        self.fresh = false;
        let values = match self.rule.evaluate_as(&self.declared, record)? {
            Value::Array(values) => values,
            _ => {
                return Err(Error::NotASequence {
                    field: self.declared.clone(),
                });
            }
        };

        if values.len() != self.names.len() {
            return Err(Error::ArityMismatch {
                field: self.declared.clone(),
                expected: self.names.len(),
                found: values.len(),
            });
        }

        self.cache = values;
        self.fresh = true;
        Ok(&self.cache)
    }

    /// Cached value at `index` from the last [`CompoundField::compute`]
    pub fn sub_value(&self, index: usize) -> Result<&Value> {
        if !self.fresh {
            return Err(Error::StaleCache {
                field: self.declared.clone(),
            });
        }
        self.cache.get(index).ok_or_else(|| Error::UnknownField {
            name: format!("{}[{}]", self.declared, index),
        })
    }

    /// Drop freshness; reads fail until the next compute
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Computed, Field};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn counting_rule(counter: Arc<AtomicUsize>) -> FieldRule {
        Computed::new(move |row| {
            counter.fetch_add(1, Ordering::SeqCst);
            json!([row["age"], row["name"]])
        })
        .into()
    }

    #[test]
    fn test_split_name() {
        assert!(is_compound("age__name"));
        assert!(!is_compound("age_name"));
        assert_eq!(split_name("a__b__c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_compute_then_read() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut field = CompoundField::new("age__name", counting_rule(counter.clone()));

        field.compute(&record(json!({"age": 20, "name": "John"}))).unwrap();
        assert_eq!(field.sub_value(0).unwrap(), &json!(20));
        assert_eq!(field.sub_value(1).unwrap(), &json!("John"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_before_compute_fails() {
        let field = CompoundField::new("a__b", Field::new("x").into());
        assert!(matches!(field.sub_value(0), Err(Error::StaleCache { .. })));
    }

    #[test]
    fn test_invalidate_clears_freshness() {
        let mut field = CompoundField::new("a__b", Field::new("x").into());
        field.compute(&record(json!({"x": [1, 2]}))).unwrap();
        field.invalidate();
        assert!(matches!(field.sub_value(1), Err(Error::StaleCache { .. })));
    }

    #[test]
    fn test_arity_mismatch() {
        let mut field = CompoundField::new("a__b__c", Field::new("x").into());
        let err = field.compute(&record(json!({"x": [1, 2]}))).unwrap_err();
        assert!(matches!(
            err,
            Error::ArityMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert!(field.sub_value(0).is_err());
    }

    #[test]
    fn test_scalar_result_is_rejected() {
        let mut field = CompoundField::new("a__b", Field::new("x").into());
        let err = field.compute(&record(json!({"x": "ab"}))).unwrap_err();
        assert!(matches!(err, Error::NotASequence { .. }));
    }
}
