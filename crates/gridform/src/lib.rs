//! Gridform: template-driven spreadsheet validation and ingestion.
//!
//! The shape of an ingested spreadsheet is not fixed by a static schema.
//! It is described by a separate "sample" template whose first sheet lays
//! out the expected columns (merged header cells included) and whose second
//! sheet holds the dropdown vocabularies that validation rules are derived
//! from. Gridform infers the schema from the template, matches an upload's
//! columns against it despite case/whitespace drift, validates every
//! sampled cell, and folds the flat row stream into grouped
//! "dataset + attribute list" records.
//!
//! # Pipeline
//!
//! template -> schema + rules -> column mapping -> validated grouped records
//!
//! # Example
//!
//! ```no_run
//! use gridform::Gridform;
//!
//! let gridform = Gridform::new();
//!
//! let outcome = gridform.validate("upload.xlsx", "sample.xlsx");
//! if outcome.is_valid() {
//!     let output = gridform.process("upload.xlsx", "sample.xlsx").unwrap();
//!     println!("records: {}", output.records.len());
//! } else {
//!     for error in outcome.errors() {
//!         println!("{error}");
//!     }
//! }
//! ```

pub mod error;
pub mod grouping;
pub mod input;
pub mod matching;
pub mod rules;
pub mod schema;
pub mod template;
pub mod validation;

mod gridform;

pub use crate::gridform::{Gridform, GridformConfig, ProcessOutput};
pub use error::{GridformError, Result};
pub use grouping::{AttributePair, GroupedRecord};
pub use input::{MergedRegion, SheetGrid, WorkbookData};
pub use matching::normalize_name;
pub use rules::{RuleKind, ValidationRule};
pub use schema::{RoleBindings, RoleTable, SchemaModel, SpecialRole};
pub use template::{TemplateOutcome, TemplateReader};
pub use validation::{FileMetadata, ValidationOutcome};
