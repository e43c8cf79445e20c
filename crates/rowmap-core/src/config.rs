//! Mapping configuration
//!
//! Transformers can be declared in a YAML mapping file instead of code. Each
//! entry under `fields` becomes one declaration, in file order.
//!
//! # Field forms
//!
//! - `name: source_key` - extract a key
//! - `name: { key, default, filter }` - extract with a default and a built-in filter
//! - `name: { template: "..." }` - render a Jinja template with the record as context
//! - `name: { regex: { key, pattern } }` - capture groups of a pattern
//! - `name: { coalesce: [a, b] }` - first non-null source value
//! - `name: { value: ... }` - static value
//!
//! # Example
//!
//! ```yaml
//! transformers:
//!   person:
//!     fields:
//!       firstname: firstname
//!       lastname: { key: lastname, default: "", filter: upper }
//!       fullname: { template: "{{ firstname }} {{ lastname }}" }
//!       age__name: { regex: { key: raw, pattern: '(\d+) (\w+)' } }
//!     rename:
//!       fullname: display_name
//!   employee:
//!     extends: person
//!     fields:
//!       firstname: given_name
//! combine:
//!   people: person
//!   staff: employee
//! ```

use indexmap::IndexMap;
use minijinja::Environment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::combine::CombineTransformers;
use crate::error::{Error, Result};
use crate::field::{Computed, Field, FieldRule};
use crate::filters;
use crate::transformer::{Transformer, TransformerDef};

/// Root of a mapping file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Transformer declarations by name
    #[serde(default)]
    pub transformers: IndexMap<String, TransformerConfig>,

    /// Label to transformer name, for combined runs
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub combine: IndexMap<String, String>,
}

/// One declared transformer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformerConfig {
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Transformer whose fields and renames are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Declared fields in order
    #[serde(default)]
    pub fields: IndexMap<String, FieldConfig>,

    /// Output name to emitted key
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub rename: IndexMap<String, String>,
}

/// Regex field configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexConfig {
    /// Source key holding the text to match
    pub key: String,
    /// Pattern; capture groups 1..n become the values
    pub pattern: String,
}

/// Field declaration from YAML
///
/// Each form accepts only its own keys, so a misspelled key or a mix of two
/// forms fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum FieldConfig {
    /// Bare source key
    Key(String),

    /// Source key with default and filter
    Field {
        /// Source key
        key: String,
        /// Value used when the key is absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        /// Built-in filter name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },

    /// Jinja template rendered with the record as context
    Template {
        /// Template source
        template: String,
    },

    /// Regex capture extraction
    Regex {
        /// Regex configuration
        regex: RegexConfig,
    },

    /// First non-null value among several keys
    Coalesce {
        /// Source keys in priority order
        coalesce: Vec<String>,
    },

    /// Static value
    Value {
        /// Value emitted for every record
        value: Value,
    },
}

impl FieldConfig {
    /// Resolve into a registry rule for the field declared as `name`
    pub fn to_rule(&self, name: &str) -> Result<FieldRule> {
        let rule = match self {
            Self::Key(key) => Field::new(key.clone()).into(),
            Self::Field {
                key,
                default,
                filter,
            } => {
                let mut field = Field::new(key.clone());
                if let Some(default) = default {
                    field = field.with_default(default.clone());
                }
                if let Some(filter) = filter {
                    field = field.with_shared_filter(filters::lookup(filter)?);
                }
                field.into()
            }
            Self::Template { template } => template_rule(name, template)?,
            Self::Regex { regex } => regex_rule(regex)?,
            Self::Coalesce { coalesce } => {
                let keys = coalesce.clone();
                Computed::new(move |row| {
                    keys.iter()
                        .find_map(|k| row.get(k).filter(|v| !v.is_null()).cloned())
                        .unwrap_or(Value::Null)
                })
                .into()
            }
            Self::Value { value } => {
                let value = value.clone();
                Computed::new(move |_| value.clone()).into()
            }
        };
        Ok(rule)
    }
}

// Compiled once at load time; syntax errors surface here
fn template_rule(name: &str, source: &str) -> Result<FieldRule> {
    let mut env = Environment::new();
    env.add_template_owned(name.to_string(), source.to_string())?;

    let name = name.to_string();
    Ok(Computed::fallible(move |row| {
        let rendered = env.get_template(&name)?.render(row)?;
        Ok(Value::String(rendered))
    })
    .into())
}

fn regex_rule(config: &RegexConfig) -> Result<FieldRule> {
    let re = Regex::new(&config.pattern).map_err(|e| Error::InvalidRegex {
        pattern: config.pattern.clone(),
        message: e.to_string(),
    })?;
    let key = config.key.clone();

    Ok(Computed::new(move |row| {
        let captures = row
            .get(&key)
            .and_then(Value::as_str)
            .and_then(|text| re.captures(text));
        let group = |i: usize| {
            captures
                .as_ref()
                .and_then(|c| c.get(i))
                .map(|m| Value::from(m.as_str()))
                .unwrap_or(Value::Null)
        };

        match re.captures_len() - 1 {
            0 => group(0),
            1 => group(1),
            n => Value::Array((1..=n).map(group).collect()),
        }
    })
    .into())
}

impl MappingConfig {
    /// Load a mapping file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = MappingConfig::load("./rowmap.yaml")?;
    /// let mut person = config.transformer("person")?;
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a mapping from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Declared transformer names in file order
    pub fn transformer_names(&self) -> Vec<&str> {
        self.transformers.keys().map(String::as_str).collect()
    }

    /// Build every definition, resolving `extends`
    pub fn definitions(&self) -> Result<IndexMap<String, Arc<TransformerDef>>> {
        let mut resolved = IndexMap::new();
        for name in self.transformers.keys() {
            self.resolve(name, &mut resolved, &mut Vec::new())?;
        }
        Ok(resolved)
    }

    /// Build one definition and its `extends` chain only
    pub fn definition(&self, name: &str) -> Result<Arc<TransformerDef>> {
        self.resolve(name, &mut IndexMap::new(), &mut Vec::new())
    }

    fn resolve(
        &self,
        name: &str,
        resolved: &mut IndexMap<String, Arc<TransformerDef>>,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<TransformerDef>> {
        if let Some(def) = resolved.get(name) {
            return Ok(Arc::clone(def));
        }
        if visiting.iter().any(|v| v == name) {
            return Err(Error::CircularInheritance {
                transformer: name.to_string(),
            });
        }

        let config = self
            .transformers
            .get(name)
            .ok_or_else(|| Error::ConfigInvalid {
                message: format!("transformer '{}' is not declared", name),
            })?;

        visiting.push(name.to_string());
        let mut builder = TransformerDef::builder(name);
        if let Some(parent) = &config.extends {
            if !self.transformers.contains_key(parent) {
                return Err(Error::ParentNotFound {
                    transformer: name.to_string(),
                    parent: parent.clone(),
                });
            }
            let parent = self.resolve(parent, resolved, visiting)?;
            builder = builder.extends(&parent);
        }
        visiting.pop();

        for (field_name, field) in &config.fields {
            builder = builder.rule(field_name.clone(), field.to_rule(field_name)?);
        }
        for (from, to) in &config.rename {
            builder = builder.rename(from.clone(), to.clone());
        }

        let def = builder.build();
        tracing::debug!(transformer = %name, "resolved transformer definition");
        resolved.insert(name.to_string(), Arc::clone(&def));
        Ok(def)
    }

    /// Build a transformer instance by name
    pub fn transformer(&self, name: &str) -> Result<Transformer> {
        Transformer::new(&*self.definition(name)?)
    }

    /// Build the `combine` section
    pub fn combination(&self) -> Result<CombineTransformers> {
        if self.combine.is_empty() {
            return Err(Error::ConfigInvalid {
                message: "mapping has no combine section".to_string(),
            });
        }

        let mut resolved = IndexMap::new();
        let mut combined = CombineTransformers::new();
        for (label, name) in &self.combine {
            if !self.transformers.contains_key(name) {
                return Err(Error::ConfigInvalid {
                    message: format!(
                        "combine label '{}' refers to unknown transformer '{}'",
                        label, name
                    ),
                });
            }
            let def = self.resolve(name, &mut resolved, &mut Vec::new())?;
            combined = combined.with(label.clone(), Transformer::new(&def)?);
        }
        Ok(combined)
    }
}
