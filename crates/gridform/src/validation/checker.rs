//! Whole-file validation against a sample template.
//!
//! The pipeline never raises past its own boundary: every failure mode
//! (input rejection, structure derivation failure, structural mismatch,
//! cell-level violations, decode errors) resolves to messages inside the
//! returned [`ValidationOutcome`].

use std::collections::BTreeSet;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::gridform::GridformConfig;
use crate::input::{SheetGrid, WorkbookData};
use crate::matching::normalize_name;
use crate::schema::SchemaModel;
use crate::template::resolve_header_columns;

use super::outcome::ValidationOutcome;

/// Validate an uploaded file on disk against a sample template on disk.
///
/// Sequence (short-circuiting on the terminal checks): basic file checks,
/// sample schema derivation, uploaded structure parse, structural
/// comparison, per-cell rule validation. Metadata is populated as soon as
/// the corresponding fact is known.
pub fn validate_file(config: &GridformConfig, uploaded: &Path, sample: &Path) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::new();

    if let Some(name) = uploaded.file_name() {
        outcome.metadata_mut().file_name = name.to_string_lossy().into_owned();
    }

    if !validate_basic_file(config, uploaded, &mut outcome) {
        return outcome;
    }

    let bytes = match std::fs::read(uploaded) {
        Ok(bytes) => bytes,
        Err(e) => {
            outcome.add_error(format!("Validation failed: {e}"));
            return outcome;
        }
    };

    let reader = config.template_reader();
    let template = reader.derive_from_path(sample);
    validate_decoded(config, &template.schema, template.read_succeeded, &bytes, &mut outcome);
    outcome
}

/// Validate uploaded bytes against sample template bytes.
///
/// Byte-stream variant of [`validate_file`] for callers that handle upload
/// storage themselves; `file_name` is used for the extension check and
/// metadata only.
pub fn validate_bytes(
    config: &GridformConfig,
    file_name: &str,
    uploaded: &[u8],
    sample: &[u8],
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::new();
    outcome.metadata_mut().file_name = file_name.to_string();

    if uploaded.is_empty() {
        outcome.add_error("File is empty");
        return outcome;
    }
    if uploaded.len() as u64 > config.max_file_size {
        outcome.add_error(size_limit_message(config));
        return outcome;
    }
    if !extension_allowed(config, file_name) {
        outcome.add_error(extension_message(config));
        return outcome;
    }

    let reader = config.template_reader();
    let template = reader.derive_from_bytes(sample);
    validate_decoded(config, &template.schema, template.read_succeeded, uploaded, &mut outcome);
    outcome
}

/// Steps shared by the path and byte entry points, from schema check on.
fn validate_decoded(
    config: &GridformConfig,
    schema: &SchemaModel,
    sample_read_succeeded: bool,
    uploaded_bytes: &[u8],
    outcome: &mut ValidationOutcome,
) {
    outcome.metadata_mut().hash = Some(format!("sha256:{:x}", Sha256::digest(uploaded_bytes)));

    if schema.is_empty() {
        if sample_read_succeeded {
            log::warn!("sample template decoded but produced no columns");
        }
        outcome.add_error("Could not read sample file structure");
        return;
    }

    let upload = parse_upload_structure(config, uploaded_bytes);
    if upload.columns.is_empty() {
        outcome.add_error("File is empty.");
        return;
    }

    compare_structures(schema, &upload, outcome);
    validate_data_values(schema, &upload, outcome);

    outcome.metadata_mut().column_count = upload.column_count();
    outcome.metadata_mut().row_count = upload.row_count();
}

/// Basic prerequisite checks: existence, non-zero size, size cap,
/// extension whitelist. The first failure is terminal.
fn validate_basic_file(config: &GridformConfig, path: &Path, outcome: &mut ValidationOutcome) -> bool {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => {
            outcome.add_error("File does not exist");
            return false;
        }
    };

    if metadata.len() == 0 {
        outcome.add_error("File is empty");
        return false;
    }

    if metadata.len() > config.max_file_size {
        outcome.add_error(size_limit_message(config));
        return false;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !extension_allowed(config, &file_name) {
        outcome.add_error(extension_message(config));
        return false;
    }

    true
}

fn extension_allowed(config: &GridformConfig, file_name: &str) -> bool {
    let lowered = file_name.to_lowercase();
    config
        .allowed_extensions
        .iter()
        .any(|ext| lowered.ends_with(&format!(".{ext}")))
}

fn size_limit_message(config: &GridformConfig) -> String {
    format!("File size exceeds {}MB limit", config.max_file_size / (1024 * 1024))
}

fn extension_message(config: &GridformConfig) -> String {
    let formats = config
        .allowed_extensions
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Unsupported file format. Only {formats} files are allowed")
}

/// The uploaded file's own structure: resolved columns plus sampled data,
/// column-major, for value checking.
#[derive(Debug, Default)]
struct UploadStructure {
    columns: Vec<String>,
    column_data: Vec<Vec<String>>,
}

impl UploadStructure {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn row_count(&self) -> usize {
        self.column_data.first().map(Vec::len).unwrap_or(0)
    }
}

/// Parse the uploaded file's structure the same way a template's structure
/// sheet is parsed, sampling up to the configured number of data rows.
///
/// Decode failures degrade to an empty structure (logged); the caller
/// reports that as an empty file and stops.
fn parse_upload_structure(config: &GridformConfig, bytes: &[u8]) -> UploadStructure {
    let workbook = match WorkbookData::from_bytes(bytes) {
        Ok(workbook) => workbook,
        Err(e) => {
            log::error!("error parsing uploaded file: {e}");
            return UploadStructure::default();
        }
    };
    let Some(grid) = workbook.sheet(0) else {
        log::error!("uploaded workbook has no sheets");
        return UploadStructure::default();
    };

    sample_structure(grid, config.sample_row_limit)
}

fn sample_structure(grid: &SheetGrid, sample_row_limit: usize) -> UploadStructure {
    let columns: Vec<String> = resolve_header_columns(grid).into_iter().map(|c| c.name).collect();
    let mut column_data = vec![Vec::new(); columns.len()];

    if !columns.is_empty() {
        let data_start = if grid.height() >= 2 { 2 } else { 1 };
        let last_row = grid.height().min(data_start + sample_row_limit);
        for row in data_start..last_row {
            if grid.is_row_empty(row) {
                continue;
            }
            for (col_idx, data) in column_data.iter_mut().enumerate() {
                data.push(grid.value(row, col_idx).trim().to_string());
            }
        }
    }

    UploadStructure { columns, column_data }
}

/// Structural comparison: column count, missing columns, extra columns.
/// All three checks run and report independently.
fn compare_structures(schema: &SchemaModel, upload: &UploadStructure, outcome: &mut ValidationOutcome) {
    let sample_columns = schema.columns();
    let uploaded_columns = &upload.columns;

    if sample_columns.len() != uploaded_columns.len() {
        outcome.add_error(format!(
            "Column count mismatch. Expected: {}, Found: {}",
            sample_columns.len(),
            uploaded_columns.len()
        ));
    }

    let sample_normalized: BTreeSet<String> = sample_columns.iter().map(|c| normalize_name(c)).collect();
    let uploaded_normalized: BTreeSet<String> = uploaded_columns.iter().map(|c| normalize_name(c)).collect();

    let missing: Vec<&str> = sample_normalized
        .difference(&uploaded_normalized)
        .map(String::as_str)
        .collect();
    let extra: Vec<&str> = uploaded_normalized
        .difference(&sample_normalized)
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        outcome.add_error(format!("Missing columns: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        outcome.add_error(format!("Extra columns found: {}", extra.join(", ")));
    }
}

/// Validate every non-blank sampled cell of every uploaded column that has
/// a rule bound to its normalized name. One error per offending cell.
fn validate_data_values(schema: &SchemaModel, upload: &UploadStructure, outcome: &mut ValidationOutcome) {
    for (col_idx, column_name) in upload.columns.iter().enumerate() {
        let Some(rule) = schema.rule_for(column_name) else {
            continue;
        };

        for (row_idx, cell_value) in upload.column_data[col_idx].iter().enumerate() {
            if cell_value.trim().is_empty() {
                continue;
            }
            let cell_errors = rule.validate(cell_value);
            if !cell_errors.is_empty() {
                // Displayed row accounts for the header offset.
                outcome.add_error(format!(
                    "Row {}, Column '{}': {} (Value: '{}')",
                    row_idx + 2,
                    column_name,
                    cell_errors.join(", "),
                    cell_value
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleKind, ValidationRule};

    fn grid(cells: &[&[&str]]) -> SheetGrid {
        SheetGrid::new(
            cells.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
            Vec::new(),
        )
    }

    fn schema_with(columns: &[&str]) -> SchemaModel {
        let mut schema = SchemaModel::new();
        for name in columns {
            schema.add_column(name);
        }
        schema
    }

    #[test]
    fn test_missing_and_extra_columns_are_two_errors() {
        // Scenario: upload lacks "Year" but carries "Surprise": exactly one
        // missing-columns error and one extra-columns error.
        let schema = schema_with(&["No", "Dataset Name", "Year"]);
        let upload = sample_structure(
            &grid(&[
                &["No", "Dataset Name", "Surprise"],
                &["", "", ""],
            ]),
            100,
        );

        let mut outcome = ValidationOutcome::new();
        compare_structures(&schema, &upload, &mut outcome);

        assert_eq!(outcome.errors().len(), 2);
        assert_eq!(outcome.errors()[0], "Missing columns: year");
        assert_eq!(outcome.errors()[1], "Extra columns found: surprise");
    }

    #[test]
    fn test_column_count_mismatch_reported_alongside_name_checks() {
        let schema = schema_with(&["No", "Dataset Name"]);
        let upload = sample_structure(&grid(&[&["No"], &[""]]), 100);

        let mut outcome = ValidationOutcome::new();
        compare_structures(&schema, &upload, &mut outcome);

        assert_eq!(outcome.errors().len(), 2);
        assert!(outcome.errors()[0].starts_with("Column count mismatch. Expected: 2, Found: 1"));
        assert_eq!(outcome.errors()[1], "Missing columns: dataset name");
    }

    #[test]
    fn test_matching_structures_produce_no_errors() {
        let schema = schema_with(&["No", "Dataset  Name"]);
        let upload = sample_structure(&grid(&[&["no", "DATASET NAME"], &["", ""]]), 100);

        let mut outcome = ValidationOutcome::new();
        compare_structures(&schema, &upload, &mut outcome);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_cell_errors_embed_row_column_constraint_and_value() {
        let mut schema = schema_with(&["Year"]);
        schema.add_rule("year", ValidationRule::new(RuleKind::Numeric).with_range(2024, 2024));

        // Row 0 header, row 1 sub-header, data rows from index 2.
        let upload = sample_structure(
            &grid(&[&["Year"], &[""], &["2024"], &["2025"], &["soon"]]),
            100,
        );

        let mut outcome = ValidationOutcome::new();
        validate_data_values(&schema, &upload, &mut outcome);

        assert_eq!(
            outcome.errors(),
            [
                "Row 3, Column 'Year': Value must be <= 2024 (Value: '2025')",
                "Row 4, Column 'Year': Value must be a number (Value: 'soon')",
            ]
        );
    }

    #[test]
    fn test_blank_cells_are_not_validated() {
        let mut schema = schema_with(&["Month"]);
        schema.add_rule(
            "month",
            ValidationRule::new(RuleKind::Enum)
                .with_allowed_values(["January".to_string()].into_iter().collect()),
        );

        let upload = sample_structure(&grid(&[&["Month"], &[""], &["  "], &["January"]]), 100);

        let mut outcome = ValidationOutcome::new();
        validate_data_values(&schema, &upload, &mut outcome);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_sampling_respects_row_limit() {
        let mut rows: Vec<Vec<String>> = vec![vec!["Col".to_string()], vec![String::new()]];
        for i in 0..150 {
            rows.push(vec![format!("v{i}")]);
        }
        let upload = sample_structure(&SheetGrid::new(rows, Vec::new()), 100);
        assert_eq!(upload.row_count(), 100);
    }

    #[test]
    fn test_single_header_row_data_starts_at_row_one() {
        let upload = sample_structure(&grid(&[&["Col"]]), 100);
        assert_eq!(upload.column_count(), 1);
        assert_eq!(upload.row_count(), 0);
    }
}
