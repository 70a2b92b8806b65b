//! Column-name normalization and header matching.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::SheetGrid;
use crate::schema::SchemaModel;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a column name for comparison and map keys: lower-case, trim,
/// and collapse interior whitespace runs to a single space.
///
/// Two column names are "the same" iff their normalized forms are equal.
/// Normalization is idempotent.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE_RUN
        .replace_all(name.to_lowercase().trim(), " ")
        .into_owned()
}

/// Map an uploaded sheet's header row onto the schema's columns.
///
/// For every header cell whose normalized value equals the normalized form
/// of some schema column, records `normalized name -> column index`.
/// Unmatched uploaded headers are ignored here (the structure comparison
/// reports them separately); schema columns with no match are simply absent
/// from the mapping and read back as blank.
///
/// The header row index is a fixed convention inherited from the template's
/// known header height, never auto-detected per upload.
pub fn match_columns(
    schema: &SchemaModel,
    grid: &SheetGrid,
    header_row: usize,
) -> IndexMap<String, usize> {
    let mut mapping = IndexMap::new();

    for col in 0..grid.width() {
        let header_value = normalize_name(grid.value(header_row, col));
        if header_value.is_empty() {
            continue;
        }
        let matched = schema
            .columns()
            .iter()
            .find(|name| normalize_name(name) == header_value);
        if let Some(name) = matched {
            mapping.insert(normalize_name(name), col);
        }
    }

    log::debug!("generated column mapping: {mapping:?}");
    mapping
}
