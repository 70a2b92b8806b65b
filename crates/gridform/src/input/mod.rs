//! Decoded-document model and spreadsheet decoding.

mod workbook;

pub use workbook::{MergedRegion, SheetGrid, WorkbookData, render_cell};
