//! Combination of independent transformers
//!
//! [`CombineTransformers`] runs several transformers over the same batch and
//! nests each result under its label.

use indexmap::IndexMap;

use crate::Record;
use crate::error::Result;
use crate::transformer::Transformer;

/// Label to owned transformer
#[derive(Debug, Default)]
pub struct CombineTransformers {
    transformers: IndexMap<String, Transformer>,
}

impl CombineTransformers {
    /// Empty combination
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformer under `label`, replacing any previous one
    pub fn with(mut self, label: impl Into<String>, transformer: Transformer) -> Self {
        self.transformers.insert(label.into(), transformer);
        self
    }

    /// Labels in insertion order
    pub fn labels(&self) -> Vec<&str> {
        self.transformers.keys().map(String::as_str).collect()
    }

    /// Transformer registered under `label`
    pub fn get(&self, label: &str) -> Option<&Transformer> {
        self.transformers.get(label)
    }

    /// Run every transformer over `records`.
    ///
    /// Each label's list preserves input order. The order in which labels
    /// are processed is not part of the contract.
    pub fn transform(&mut self, records: &[Record]) -> Result<IndexMap<String, Vec<Record>>> {
        let mut combined = IndexMap::with_capacity(self.transformers.len());
        for (label, transformer) in &mut self.transformers {
            tracing::debug!(
                label = %label,
                transformer = %transformer.name(),
                "running combined transformer"
            );
            combined.insert(label.clone(), transformer.transform(records)?);
        }
        Ok(combined)
    }
}

impl<L: Into<String>> FromIterator<(L, Transformer)> for CombineTransformers {
    fn from_iter<I: IntoIterator<Item = (L, Transformer)>>(iter: I) -> Self {
        Self {
            transformers: iter
                .into_iter()
                .map(|(label, transformer)| (label.into(), transformer))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::transformer::TransformerDef;
    use serde_json::json;

    fn first() -> Transformer {
        let def = TransformerDef::builder("first")
            .field("person_name", Field::new("name"))
            .build();
        Transformer::new(&def).unwrap()
    }

    fn second() -> Transformer {
        let def = TransformerDef::builder("second")
            .field("person_age", Field::new("age"))
            .build();
        Transformer::new(&def).unwrap()
    }

    #[test]
    fn test_combined_transformers() {
        let mut combined = CombineTransformers::new()
            .with("first", first())
            .with("second", second());

        let rows = vec![json!({"name": "John", "age": 30})
            .as_object()
            .cloned()
            .unwrap()];
        let data = combined.transform(&rows).unwrap();

        assert_eq!(data["first"][0]["person_name"], json!("John"));
        assert_eq!(data["second"][0]["person_age"], json!(30));
    }

    #[test]
    fn test_combination_equals_individual_runs() {
        let rows: Vec<Record> = (0..3)
            .map(|i| {
                json!({"name": format!("n{}", i), "age": i})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect();

        let mut combined: CombineTransformers =
            [("first", first()), ("second", second())].into_iter().collect();
        let data = combined.transform(&rows).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data["first"], first().transform(&rows).unwrap());
        assert_eq!(data["second"], second().transform(&rows).unwrap());
        assert_eq!(combined.labels(), vec!["first", "second"]);
    }

    #[test]
    fn test_empty_batch() {
        let mut combined = CombineTransformers::new().with("first", first());
        let data = combined.transform(&[]).unwrap();
        assert_eq!(data["first"], Vec::<Record>::new());
        assert!(combined.get("first").is_some());
        assert!(combined.get("missing").is_none());
    }
}
