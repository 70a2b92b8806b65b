//! Main engine struct and public API.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{GridformError, Result};
use crate::grouping::{group_records, GroupedRecord};
use crate::input::WorkbookData;
use crate::matching::match_columns;
use crate::schema::{RoleBindings, RoleTable};
use crate::template::TemplateReader;
use crate::validation::{self, ValidationOutcome};

/// Configuration for validation and processing.
#[derive(Debug, Clone)]
pub struct GridformConfig {
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,
    /// Accepted file extensions, compared case-insensitively.
    pub allowed_extensions: Vec<String>,
    /// Maximum number of data rows sampled for value validation.
    pub sample_row_limit: usize,
    /// Fixed row index of the matchable header in uploaded sheets.
    pub header_row_index: usize,
    /// Header height assumed when a sample sheet is entirely blank.
    pub default_header_row_count: usize,
    /// Special-role positions within the template's column order.
    pub roles: RoleTable,
}

impl Default for GridformConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            sample_row_limit: 100,
            header_row_index: 1,
            default_header_row_count: 2,
            roles: RoleTable::default(),
        }
    }
}

impl GridformConfig {
    pub(crate) fn template_reader(&self) -> TemplateReader {
        TemplateReader::new()
            .with_roles(self.roles)
            .with_default_header_row_count(self.default_header_row_count)
    }
}

/// Result of processing an upload into grouped records.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    /// Records in first-seen group-key order.
    pub records: Vec<GroupedRecord>,
    /// Template-declared special-field names. Consumers interpret each
    /// record's attribute pairs through these, not through constants.
    /// `None` when the template was too narrow to carry special fields.
    pub roles: Option<RoleBindings>,
}

impl ProcessOutput {
    /// Render the records as JSON objects: regular fields flattened, plus a
    /// reserved key holding the attribute pairs. The pair keys are the
    /// template's declared attribute field names.
    pub fn records_json(&self) -> Vec<Value> {
        self.records
            .iter()
            .map(|record| {
                let mut object = serde_json::Map::new();
                for (field, value) in &record.fields {
                    object.insert(field.clone(), json!(value));
                }

                let pairs: Vec<Value> = match &self.roles {
                    Some(roles) => record
                        .children
                        .iter()
                        .map(|child| {
                            let mut pair = serde_json::Map::new();
                            pair.insert(roles.attribute_name_field.clone(), json!(child.name));
                            pair.insert(roles.attribute_description_field.clone(), json!(child.description));
                            Value::Object(pair)
                        })
                        .collect(),
                    None => Vec::new(),
                };
                object.insert("attributes".to_string(), Value::Array(pairs));

                Value::Object(object)
            })
            .collect()
    }
}

/// The template-driven ingestion engine.
///
/// Stateless between calls: every operation re-derives the schema from the
/// current sample bytes, so concurrent callers using different template
/// versions never interfere.
#[derive(Debug, Clone, Default)]
pub struct Gridform {
    config: GridformConfig,
}

impl Gridform {
    /// Engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(GridformConfig::default())
    }

    /// Engine with custom configuration.
    pub fn with_config(config: GridformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridformConfig {
        &self.config
    }

    /// Validate an uploaded file against a sample template.
    ///
    /// Total: every failure mode lands in the returned outcome's error
    /// list, never in a `Result::Err`.
    pub fn validate(&self, uploaded: impl AsRef<Path>, sample: impl AsRef<Path>) -> ValidationOutcome {
        validation::validate_file(&self.config, uploaded.as_ref(), sample.as_ref())
    }

    /// Byte-stream variant of [`Gridform::validate`].
    pub fn validate_bytes(&self, file_name: &str, uploaded: &[u8], sample: &[u8]) -> ValidationOutcome {
        validation::validate_bytes(&self.config, file_name, uploaded, sample)
    }

    /// Process an uploaded file into grouped records using the sample
    /// template as the structure reference.
    ///
    /// Unlike validation this can fail hard, but only when an input
    /// document cannot be decoded at all.
    pub fn process(&self, uploaded: impl AsRef<Path>, sample: impl AsRef<Path>) -> Result<ProcessOutput> {
        let uploaded_workbook = WorkbookData::from_path(uploaded)?;
        let sample_workbook = WorkbookData::from_path(sample)?;
        self.process_workbooks(&uploaded_workbook, &sample_workbook)
    }

    /// Byte-stream variant of [`Gridform::process`].
    pub fn process_bytes(&self, uploaded: &[u8], sample: &[u8]) -> Result<ProcessOutput> {
        let uploaded_workbook = WorkbookData::from_bytes(uploaded)?;
        let sample_workbook = WorkbookData::from_bytes(sample)?;
        self.process_workbooks(&uploaded_workbook, &sample_workbook)
    }

    fn process_workbooks(&self, uploaded: &WorkbookData, sample: &WorkbookData) -> Result<ProcessOutput> {
        let sheet = uploaded.sheet(0).ok_or(GridformError::MissingSheet(0))?;
        let sample_sheet = sample.sheet(0).ok_or(GridformError::MissingSheet(0))?;

        let reader = self.config.template_reader();
        let template = reader.derive_from_workbook(sample);
        let schema = template.schema;

        let mapping = match_columns(&schema, sheet, self.config.header_row_index);
        let data_start_row = reader.header_row_count(sample_sheet);

        let records = group_records(sheet, &schema, &mapping, data_start_row);
        let roles = schema.role_bindings();

        Ok(ProcessOutput { records, roles })
    }
}
