//! Template derivation: structure sheet + dropdown rules sheet -> schema.

use std::collections::BTreeSet;
use std::path::Path;

use crate::input::{SheetGrid, WorkbookData};
use crate::rules::{RuleKind, ValidationRule};
use crate::schema::{RoleTable, SchemaModel};

/// Field the classification dropdown binds to.
const CLASSIFICATION_FIELD: &str = "dataset classification";
/// Fields sharing the scale dropdown's min/max bounds.
const SCALE_FIELDS: [&str; 4] = ["user demand", "economic impact", "better services", "better governance"];
/// Fields validated against the fixed yes/no vocabulary.
const BOOLEAN_FIELDS: [&str; 4] = ["defined owner", "existing metadata", "already published", "open format"];
const YEAR_FIELD: &str = "year";
const MONTH_FIELD: &str = "month";

/// Result of deriving a schema from template bytes.
///
/// An empty schema can mean either a legitimately empty template or a
/// document that could not be decoded; `read_succeeded` tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOutcome {
    pub schema: SchemaModel,
    pub read_succeeded: bool,
}

/// A column resolved from the header region of a structure sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Effective column name: sub-header if present, else primary header.
    pub name: String,
    /// Merged parent label, when the effective name sits under one.
    pub merged_parent: Option<String>,
}

/// Derives a [`SchemaModel`] from a two-sheet sample template.
///
/// Sheet 0 defines the column structure (primary header row, optional
/// sub-header row, merged header spans). Sheet 1, when present, holds the
/// dropdown reference columns the validation rules are derived from.
///
/// Decode failures are logged and swallowed: the reader always returns an
/// outcome, never an error.
#[derive(Debug, Clone)]
pub struct TemplateReader {
    roles: RoleTable,
    default_header_row_count: usize,
}

impl TemplateReader {
    pub fn new() -> Self {
        Self {
            roles: RoleTable::default(),
            default_header_row_count: 2,
        }
    }

    pub fn with_roles(mut self, roles: RoleTable) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_default_header_row_count(mut self, count: usize) -> Self {
        self.default_header_row_count = count;
        self
    }

    /// Derive a schema from a template file on disk.
    pub fn derive_from_path(&self, path: impl AsRef<Path>) -> TemplateOutcome {
        match WorkbookData::from_path(path.as_ref()) {
            Ok(workbook) => self.derive_from_workbook(&workbook),
            Err(e) => {
                log::error!("error reading sample file '{}': {e}", path.as_ref().display());
                self.failed_outcome()
            }
        }
    }

    /// Derive a schema from template bytes.
    pub fn derive_from_bytes(&self, bytes: &[u8]) -> TemplateOutcome {
        match WorkbookData::from_bytes(bytes) {
            Ok(workbook) => self.derive_from_workbook(&workbook),
            Err(e) => {
                log::error!("error reading sample file: {e}");
                self.failed_outcome()
            }
        }
    }

    /// Derive a schema from an already decoded workbook.
    pub fn derive_from_workbook(&self, workbook: &WorkbookData) -> TemplateOutcome {
        let mut schema = SchemaModel::with_roles(self.roles);

        let Some(structure_sheet) = workbook.sheet(0) else {
            log::error!("sample workbook has no structure sheet");
            return self.failed_outcome();
        };

        for column in resolve_header_columns(structure_sheet) {
            schema.add_column(&column.name);
            if let Some(parent) = &column.merged_parent {
                schema.add_merged_header(parent, &column.name);
            }
        }

        match workbook.sheet(1) {
            Some(rules_sheet) => read_dropdown_rules(rules_sheet, &mut schema),
            None => log::warn!("no second sheet found for validation rules"),
        }

        TemplateOutcome {
            schema,
            read_succeeded: true,
        }
    }

    /// Header height of the sample: index of the first row containing any
    /// non-blank cell, plus one. Falls back to the configured default when
    /// the sheet is entirely blank.
    ///
    /// Computed once per sample and reused for every upload validated
    /// against it.
    pub fn header_row_count(&self, grid: &SheetGrid) -> usize {
        (0..grid.height())
            .find(|&row| !grid.is_row_empty(row))
            .map(|row| row + 1)
            .unwrap_or(self.default_header_row_count)
    }

    fn failed_outcome(&self) -> TemplateOutcome {
        TemplateOutcome {
            schema: SchemaModel::with_roles(self.roles),
            read_succeeded: false,
        }
    }
}

impl Default for TemplateReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the effective column list from a structure sheet's header region.
///
/// Row 0 is the primary header, row 1 (when present) the sub-header. A
/// merged span in the header region broadcasts its first cell's value over
/// every column it covers, replacing the primary header there. The
/// effective name is the sub-header when non-blank, else the primary
/// header; columns whose effective name is empty are dropped.
pub fn resolve_header_columns(grid: &SheetGrid) -> Vec<ResolvedColumn> {
    let mut columns = Vec::new();
    if grid.height() == 0 {
        return columns;
    }

    let merged_by_column = grid.merged_values_by_column();
    let has_sub_header = grid.height() >= 2;

    for col in 0..grid.width() {
        let mut primary = grid.value(0, col).trim().to_string();
        let sub = if has_sub_header {
            grid.value(1, col).trim()
        } else {
            ""
        };

        if let Some(parent) = merged_by_column.get(&col) {
            if !parent.is_empty() {
                primary = parent.clone();
            }
        }

        let name = if !sub.is_empty() { sub.to_string() } else { primary.clone() };
        if name.is_empty() {
            continue;
        }

        let merged_parent = (primary != name && !primary.is_empty()).then_some(primary);
        columns.push(ResolvedColumn { name, merged_parent });
    }

    columns
}

/// The five fixed reference columns of the rules sheet, as distinct
/// non-blank trimmed value sets.
#[derive(Debug, Default)]
struct ReferenceColumns {
    classification: BTreeSet<String>,
    scale: BTreeSet<String>,
    boolean: BTreeSet<String>,
    year: BTreeSet<String>,
    month: BTreeSet<String>,
}

impl ReferenceColumns {
    fn collect(grid: &SheetGrid) -> Self {
        let mut columns = Self::default();
        for row in 1..grid.height() {
            add_reference_value(&mut columns.classification, grid.value(row, 0));
            add_reference_value(&mut columns.scale, grid.value(row, 1));
            add_reference_value(&mut columns.boolean, grid.value(row, 2));
            add_reference_value(&mut columns.year, grid.value(row, 3));
            add_reference_value(&mut columns.month, grid.value(row, 4));
        }
        columns
    }
}

fn add_reference_value(set: &mut BTreeSet<String>, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        set.insert(trimmed.to_string());
    }
}

/// Derive validation rules from the dropdown sheet's reference columns and
/// bind them to their fixed target fields.
fn read_dropdown_rules(grid: &SheetGrid, schema: &mut SchemaModel) {
    if grid.height() == 0 {
        log::warn!("no header row found in validation sheet");
        return;
    }

    let reference = ReferenceColumns::collect(grid);

    if !reference.classification.is_empty() {
        let rule = ValidationRule::new(RuleKind::Enum).with_allowed_values(reference.classification.clone());
        schema.add_rule(CLASSIFICATION_FIELD, rule);
    }

    // Non-integer entries in the scale column are discarded, not errors.
    let scale_values: BTreeSet<i64> = reference
        .scale
        .iter()
        .filter_map(|v| v.parse::<i64>().ok())
        .collect();
    if let (Some(&min), Some(&max)) = (scale_values.iter().next(), scale_values.iter().last()) {
        for field in SCALE_FIELDS {
            schema.add_rule(field, ValidationRule::new(RuleKind::Scale).with_range(min, max));
        }
    }

    if !reference.boolean.is_empty() {
        // The vocabulary itself is canonical yes/no; the dropdown's presence
        // is what opts the boolean fields into validation.
        for field in BOOLEAN_FIELDS {
            schema.add_rule(field, ValidationRule::new(RuleKind::Boolean));
        }
    }

    let year = reference.year.iter().find_map(|v| v.parse::<i64>().ok());
    if let Some(year) = year {
        schema.add_rule(YEAR_FIELD, ValidationRule::new(RuleKind::Numeric).with_range(year, year));
    }

    if !reference.month.is_empty() {
        let rule = ValidationRule::new(RuleKind::Enum).with_allowed_values(reference.month.clone());
        schema.add_rule(MONTH_FIELD, rule);
    }
}
