//! In-memory workbook model with merged-region geometry.
//!
//! Decoding happens once per parse: the workbook is read top-to-bottom into
//! dense string grids and the underlying reader is dropped before any engine
//! touches the data. Engines therefore operate on plain data and can be
//! tested without spreadsheet bytes.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};

use crate::error::{GridformError, Result};

/// A rectangular merged-cell span in absolute sheet coordinates (inclusive).
///
/// Only the top-left cell of a span carries a value; every other cell in the
/// span is blank in the raw grid and resolves to that value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

impl MergedRegion {
    /// Whether the given absolute cell position lies inside this span.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }
}

/// A single decoded sheet: dense cell grid plus merged-region list.
///
/// Coordinates are absolute (row 0 = first sheet row), matching the merged
/// region geometry reported by the container format.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    /// Cell values in row-major order. Rows are uniform width.
    pub rows: Vec<Vec<String>>,
    /// Merged-cell spans, in document order.
    pub merged: Vec<MergedRegion>,
}

impl SheetGrid {
    /// Create a grid from raw cell values and merged spans.
    pub fn new(rows: Vec<Vec<String>>, merged: Vec<MergedRegion>) -> Self {
        Self { rows, merged }
    }

    /// Number of rows, including any header rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Raw cell value at an absolute position; empty string out of bounds.
    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Merged-aware cell value: if the position lies inside a merged span,
    /// the span's first cell carries the value for the whole span.
    pub fn effective_value(&self, row: usize, col: usize) -> &str {
        match self.merged.iter().find(|region| region.contains(row, col)) {
            Some(region) => self.value(region.first_row, region.first_col),
            None => self.value(row, col),
        }
    }

    /// A row is empty when every raw cell in it is blank after trimming.
    pub fn is_row_empty(&self, row: usize) -> bool {
        match self.rows.get(row) {
            Some(cells) => cells.iter().all(|c| c.trim().is_empty()),
            None => true,
        }
    }

    /// Broadcast each merged span's first-cell value (trimmed) to every
    /// column the span covers. Later spans overwrite earlier ones.
    ///
    /// Used for header resolution: a merged primary header spanning columns
    /// 3..=5 labels all three columns.
    pub fn merged_values_by_column(&self) -> HashMap<usize, String> {
        let mut by_column = HashMap::new();
        for region in &self.merged {
            let value = self.value(region.first_row, region.first_col).trim().to_string();
            for col in region.first_col..=region.last_col {
                by_column.insert(col, value.clone());
            }
        }
        by_column
    }
}

/// A fully decoded workbook: one [`SheetGrid`] per sheet, in workbook order.
#[derive(Debug, Clone, Default)]
pub struct WorkbookData {
    pub sheets: Vec<SheetGrid>,
}

impl WorkbookData {
    /// Decode a workbook from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| GridformError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decode a workbook from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes.to_vec());
        let mut workbook: Xlsx<_> = Xlsx::new(cursor)?;
        workbook.load_merged_regions()?;

        let sheet_names = workbook.sheet_names().to_vec();
        let merged_regions: Vec<(String, MergedRegion)> = workbook
            .merged_regions()
            .iter()
            .map(|(sheet, _, dimensions)| {
                (
                    sheet.clone(),
                    MergedRegion {
                        first_row: dimensions.start.0 as usize,
                        last_row: dimensions.end.0 as usize,
                        first_col: dimensions.start.1 as usize,
                        last_col: dimensions.end.1 as usize,
                    },
                )
            })
            .collect();

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for name in &sheet_names {
            let range = workbook.worksheet_range(name)?;
            let rows = match range.end() {
                Some((end_row, end_col)) => {
                    let height = end_row as usize + 1;
                    let width = end_col as usize + 1;
                    (0..height)
                        .map(|r| {
                            (0..width)
                                .map(|c| {
                                    range
                                        .get_value((r as u32, c as u32))
                                        .map(render_cell)
                                        .unwrap_or_default()
                                })
                                .collect()
                        })
                        .collect()
                }
                None => Vec::new(),
            };

            let merged = merged_regions
                .iter()
                .filter(|(sheet, _)| sheet == name)
                .map(|(_, region)| *region)
                .collect();

            sheets.push(SheetGrid::new(rows, merged));
        }

        Ok(Self { sheets })
    }

    /// Sheet by zero-based index.
    pub fn sheet(&self, index: usize) -> Option<&SheetGrid> {
        self.sheets.get(index)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}

/// Render a decoded cell as a string.
///
/// Numeric cells with an integral value keep a trailing `.0`, the same
/// presentation the upstream decoder produced for numeric cells, which the
/// grouping engine strips on ingest. Error cells render as blank.
pub fn render_cell(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
