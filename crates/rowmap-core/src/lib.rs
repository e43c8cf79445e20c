//! rowmap Core Library
//!
//! This crate provides the core functionality for rowmap:
//! - Field rules that extract one value from a record
//! - Compound fields that split one computation across several outputs
//! - Transformer definitions with inheritance, overrides and renaming
//! - Combination of independent transformers over one batch
//! - YAML mapping configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Record    │────▶│ Transformer │────▶│   Output    │
//! │   (JSON)    │     │  (registry) │     │   Record    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use rowmap_core::{Field, Transformer, TransformerDef};
//! use serde_json::json;
//!
//! let def = TransformerDef::builder("person")
//!     .field("lastname", Field::new("lastname"))
//!     .field("firstname", Field::new("firstname"))
//!     .computed("fullname", |row| {
//!         json!(format!("{} {}", row["firstname"].as_str().unwrap_or_default(),
//!                                row["lastname"].as_str().unwrap_or_default()))
//!     })
//!     .build();
//!
//! let mut transformer = Transformer::new(&def).unwrap();
//! let row = json!({"firstname": "John", "lastname": "Doe"});
//! let out = transformer.transform_value(&row).unwrap();
//! assert_eq!(out["fullname"], "John Doe");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combine;
pub mod compound;
pub mod config;
pub mod error;
pub mod field;
pub mod filters;
pub mod transformer;

pub use combine::CombineTransformers;
pub use compound::{COMPOUND_DELIMITER, CompoundField};
pub use config::MappingConfig;
pub use error::{Error, Result};
pub use field::{Computed, Field, FieldRule, Filter};
pub use transformer::{Transformer, TransformerDef, TransformerDefBuilder};

/// One input or output unit: string keys to arbitrary JSON values.
pub type Record = serde_json::Map<String, serde_json::Value>;
