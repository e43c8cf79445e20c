//! Transformer definitions and instances
//!
//! A [`TransformerDef`] is the declared field set of one transformer type:
//! an ordered list of field rules, an optional parent definition it extends,
//! and a rename table. A [`Transformer`] is built from a definition once and
//! then maps records row by row.
//!
//! # Registry resolution
//!
//! The registry is collected from the most base definition to the most
//! derived. A name declared again in a derived definition replaces the
//! inherited rule but keeps the inherited position. Within a single
//! definition a declared [`Field`] wins over a computed rule of the same
//! name, whichever was declared first.
//!
//! # Example
//!
//! ```rust
//! use rowmap_core::{Field, Transformer, TransformerDef};
//! use serde_json::json;
//!
//! let base = TransformerDef::builder("base").field("a", Field::new("a")).build();
//! let derived = TransformerDef::builder("derived")
//!     .extends(&base)
//!     .field("a", Field::new("x"))
//!     .field("b", Field::new("b"))
//!     .build();
//!
//! let transformer = Transformer::new(&derived).unwrap();
//! assert_eq!(transformer.field_names(), vec!["a", "b"]);
//! assert_eq!(transformer.fields()["a"].as_field().unwrap().key(), "x");
//! ```

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::Record;
use crate::compound::{self, CompoundField};
use crate::error::{Error, Result};
use crate::field::{Computed, Field, FieldRule};

/// Declared field set of one transformer type
#[derive(Debug)]
pub struct TransformerDef {
    name: String,
    parent: Option<Arc<TransformerDef>>,
    declarations: IndexMap<String, FieldRule>,
    rename: IndexMap<String, String>,
}

impl TransformerDef {
    /// Start declaring a transformer type
    pub fn builder(name: impl Into<String>) -> TransformerDefBuilder {
        TransformerDefBuilder {
            name: name.into(),
            parent: None,
            declarations: IndexMap::new(),
            rename: IndexMap::new(),
        }
    }

    /// Definition name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition this one extends
    pub fn parent(&self) -> Option<&Arc<TransformerDef>> {
        self.parent.as_ref()
    }

    /// Rules declared directly on this definition, in declaration order
    pub fn declarations(&self) -> &IndexMap<String, FieldRule> {
        &self.declarations
    }

    /// Chain of definitions from the most base to this one
    pub fn ancestry(&self) -> Vec<&TransformerDef> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Effective registry: declared name to rule, inheritance resolved
    pub fn registry(&self) -> IndexMap<String, FieldRule> {
        let mut registry = IndexMap::new();
        for def in self.ancestry() {
            for (name, rule) in &def.declarations {
                // IndexMap::insert keeps the position of an existing key
                registry.insert(name.clone(), rule.clone());
            }
        }
        registry
    }

    /// Effective rename table, derived entries winning
    pub fn rename_map(&self) -> IndexMap<String, String> {
        let mut rename = IndexMap::new();
        for def in self.ancestry() {
            for (from, to) in &def.rename {
                rename.insert(from.clone(), to.clone());
            }
        }
        rename
    }
}

/// Builder for [`TransformerDef`]
pub struct TransformerDefBuilder {
    name: String,
    parent: Option<Arc<TransformerDef>>,
    declarations: IndexMap<String, FieldRule>,
    rename: IndexMap<String, String>,
}

impl TransformerDefBuilder {
    /// Inherit the fields and renames of `parent`
    pub fn extends(mut self, parent: &Arc<TransformerDef>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Declare a field. A compound name (`a__b`) expects a sequence result.
    pub fn field(self, name: impl Into<String>, field: Field) -> Self {
        self.rule(name, FieldRule::from(field))
    }

    /// Declare a computed field
    pub fn computed<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.rule(name, FieldRule::from(Computed::new(func)))
    }

    /// Declare a computed field that may fail
    pub fn try_computed<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Record) -> Result<Value> + Send + Sync + 'static,
    {
        self.rule(name, FieldRule::from(Computed::fallible(func)))
    }

    /// Declare an already resolved rule
    pub fn rule(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        match self.declarations.get(&name) {
            Some(FieldRule::Declared(_)) if rule.is_computed() => {
                tracing::debug!(
                    transformer = %self.name,
                    field = %name,
                    "declared field shadows computed field of the same name"
                );
            }
            _ => {
                self.declarations.insert(name, rule);
            }
        }
        self
    }

    /// Emit output `from` under the key `to`
    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename.insert(from.into(), to.into());
        self
    }

    /// Finish the definition
    pub fn build(self) -> Arc<TransformerDef> {
        Arc::new(TransformerDef {
            name: self.name,
            parent: self.parent,
            declarations: self.declarations,
            rename: self.rename,
        })
    }
}

#[derive(Debug)]
enum Slot {
    Simple { name: String, rule: FieldRule },
    Compound(CompoundField),
}

/// Row mapper built from a [`TransformerDef`]
///
/// Compound fields keep a per-instance cache written by
/// [`Transformer::transform_row`] and read by [`Transformer::call`]. An
/// instance must not be shared between callers that interleave rows.
#[derive(Debug)]
pub struct Transformer {
    name: String,
    fields: IndexMap<String, FieldRule>,
    slots: Vec<Slot>,
    rename: IndexMap<String, String>,
    // output name -> (slot index, position within a compound)
    lookup: HashMap<String, (usize, Option<usize>)>,
}

impl Transformer {
    /// Resolve the registry of `def` and validate it
    pub fn new(def: &TransformerDef) -> Result<Self> {
        let fields = def.registry();
        let rename = def.rename_map();

        let mut slots = Vec::with_capacity(fields.len());
        let mut lookup = HashMap::new();

        for (declared, rule) in &fields {
            let index = slots.len();
            if compound::is_compound(declared) {
                let field = CompoundField::new(declared.clone(), rule.clone());
                for (position, name) in field.names().iter().enumerate() {
                    register_output(def, &mut lookup, name, (index, Some(position)))?;
                }
                slots.push(Slot::Compound(field));
            } else {
                register_output(def, &mut lookup, declared, (index, None))?;
                slots.push(Slot::Simple {
                    name: declared.clone(),
                    rule: rule.clone(),
                });
            }
        }

        let transformer = Self {
            name: def.name().to_string(),
            fields,
            slots,
            rename,
            lookup,
        };
        transformer.check_renames()?;

        tracing::debug!(
            transformer = %transformer.name,
            fields = ?transformer.field_names(),
            "resolved field registry"
        );

        Ok(transformer)
    }

    fn check_renames(&self) -> Result<()> {
        for from in self.rename.keys() {
            if !self.lookup.contains_key(from) {
                tracing::debug!(
                    transformer = %self.name,
                    field = %from,
                    "rename entry does not match any output"
                );
            }
        }

        let mut emitted = HashSet::new();
        for name in self.output_names() {
            if !emitted.insert(name) {
                return Err(Error::InvalidDefinition {
                    transformer: self.name.clone(),
                    message: format!("output key '{}' is emitted more than once", name),
                });
            }
        }
        Ok(())
    }

    /// Name of the definition this instance was built from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared name to resolved rule, before compound expansion
    pub fn fields(&self) -> &IndexMap<String, FieldRule> {
        &self.fields
    }

    /// Output names in emission order, compounds expanded, before renaming
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.lookup.len());
        for slot in &self.slots {
            match slot {
                Slot::Simple { name, .. } => names.push(name.as_str()),
                Slot::Compound(field) => names.extend(field.names().iter().map(String::as_str)),
            }
        }
        names
    }

    /// Keys actually written to output records
    pub fn output_names(&self) -> Vec<&str> {
        self.field_names()
            .into_iter()
            .map(|name| emitted_name(&self.rename, name))
            .collect()
    }

    /// Map one record
    pub fn transform_row(&mut self, record: &Record) -> Result<Record> {
        let mut output = Record::new();

        for slot in &mut self.slots {
            match slot {
                Slot::Simple { name, rule } => {
                    let value = rule.evaluate_as(name, record)?;
                    output.insert(emitted_name(&self.rename, name).to_string(), value);
                }
                Slot::Compound(field) => {
                    field.compute(record)?;
                    for (position, name) in field.names().iter().enumerate() {
                        let value = field.sub_value(position)?.clone();
                        output.insert(emitted_name(&self.rename, name).to_string(), value);
                    }
                }
            }
        }

        tracing::trace!(transformer = %self.name, keys = output.len(), "transformed row");
        Ok(output)
    }

    /// Map a batch, preserving order
    pub fn transform(&mut self, records: &[Record]) -> Result<Vec<Record>> {
        records
            .iter()
            .map(|record| self.transform_row(record))
            .collect()
    }

    /// Map an untyped JSON value, which must be an object
    pub fn transform_value(&mut self, value: &Value) -> Result<Value> {
        let record = value.as_object().ok_or(Error::NotAnObject)?;
        Ok(Value::Object(self.transform_row(record)?))
    }

    /// Per-output accessor.
    ///
    /// For an output of a compound field this returns the value cached by the
    /// most recent [`Transformer::transform_row`] and ignores `record`. For
    /// any other output the rule is evaluated against `record`.
    pub fn call(&self, name: &str, record: &Record) -> Result<Value> {
        let (index, position) = self
            .lookup
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownField {
                name: name.to_string(),
            })?;

        match (&self.slots[index], position) {
            (Slot::Compound(field), Some(position)) => field.sub_value(position).cloned(),
            (Slot::Simple { rule, .. }, _) => rule.evaluate_as(name, record),
            (Slot::Compound(field), None) => Err(Error::UnknownField {
                name: field.declared().to_string(),
            }),
        }
    }

    /// Mark every compound cache stale
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            if let Slot::Compound(field) = slot {
                field.invalidate();
            }
        }
    }
}

fn register_output(
    def: &TransformerDef,
    lookup: &mut HashMap<String, (usize, Option<usize>)>,
    name: &str,
    target: (usize, Option<usize>),
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidDefinition {
            transformer: def.name().to_string(),
            message: "field names must not be empty".to_string(),
        });
    }
    if lookup.insert(name.to_string(), target).is_some() {
        return Err(Error::InvalidDefinition {
            transformer: def.name().to_string(),
            message: format!("output '{}' is declared more than once", name),
        });
    }
    Ok(())
}

fn emitted_name<'a>(rename: &'a IndexMap<String, String>, name: &'a str) -> &'a str {
    rename.get(name).map(String::as_str).unwrap_or(name)
}
