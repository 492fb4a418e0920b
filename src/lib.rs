//! # excel_serializer
//!
//! A zero-reflection, streaming XLSX serializer for Rust types.
//!
//! ## What it does
//!
//! `excel_serializer` turns a slice of values into a spreadsheet file: one
//! row per value, one column per field, written as a flat OOXML package
//! (shared-string table, fixed style set, single worksheet) streamed straight
//! into a ZIP. There is no DOM, no intermediate cell grid and no reflection:
//! every type resolves a serializer once, and that serializer is replayed for
//! millions of rows.
//!
//! ## Key Features
//!
//! - **Type-driven**: serializers resolve per type through a cached registry
//!   with override, default and dynamic-fallback tiers
//! - **Streaming**: cell markup goes straight into the output ZIP entry; no
//!   whole-sheet buffers and no temporary files
//! - **Deduplicated strings**: repeated text serializes as one shared-string
//!   slot, assigned in first-write order
//! - **Layout control**: header row with a frozen pane, per-member column
//!   ordering and naming, auto-fitted column widths, auto-filter
//! - **No Unsafe Code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use excel_serializer::{excel_record, to_bytes, ExcelSerializerOptions};
//!
//! struct Dinosaur {
//!     name: String,
//!     mass_kg: f64,
//!     extinct: bool,
//! }
//!
//! excel_record!(Dinosaur {
//!     name => "Name",
//!     mass_kg => "Mass (kg)",
//!     extinct,
//! });
//!
//! let herd = vec![
//!     Dinosaur { name: "Triceratops".into(), mass_kg: 8000.0, extinct: true },
//!     Dinosaur { name: "Compsognathus".into(), mass_kg: 3.0, extinct: true },
//! ];
//!
//! let options = ExcelSerializerOptions::new().with_header(true);
//! let workbook = to_bytes(&herd, &options).unwrap();
//! assert!(!workbook.is_empty());
//! ```
//!
//! ## Customizing serialization
//!
//! The resolution chain walks member-level overrides, registered overrides,
//! then the type's default serializer; results are cached per type:
//!
//! ```rust
//! use excel_serializer::{
//!     ExcelFormatter, ExcelSerializer, ExcelSerializerOptions, Result,
//! };
//! use std::io::Write;
//!
//! struct Celsius;
//!
//! impl ExcelSerializer<f64> for Celsius {
//!     fn write_title(
//!         &self,
//!         formatter: &mut ExcelFormatter,
//!         sink: &mut dyn Write,
//!         _value: &f64,
//!         _options: &ExcelSerializerOptions,
//!         name: &str,
//!     ) -> Result<()> {
//!         formatter.write_string(name, sink)
//!     }
//!
//!     fn serialize(
//!         &self,
//!         formatter: &mut ExcelFormatter,
//!         sink: &mut dyn Write,
//!         value: &f64,
//!         _options: &ExcelSerializerOptions,
//!     ) -> Result<()> {
//!         formatter.write_string(&format!("{value:.1} °C"), sink)
//!     }
//! }
//!
//! let options = ExcelSerializerOptions::new().with_serializer(Celsius);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Serialization**: O(rows × columns), single pass (two passes over the
//!   first rows when column auto-fit is enabled)
//! - **Resolution**: at most once per type per registry, then a cache hit
//! - **Memory**: proportional to the distinct-string pool, not to row count
//!
//! ## Format notes
//!
//! The package is the minimal six-part layout: `[Content_Types].xml`,
//! `_rels/.rels`, `book.xml`, `_rels/book.xml.rels`, `styles.xml`,
//! `sheet.xml` and `strings.xml`. Styles are fixed: five configurable number
//! formats and seven cell formats (general, wrapped text, date-time, date,
//! time, integer, number).

pub mod builtins;
pub mod containers;
pub mod dynamic;
pub mod error;
pub mod formatter;
pub mod macros;
pub mod options;
pub mod record;
pub mod registry;
pub mod serializer;
pub mod sheet;

pub use builtins::{EnumLabelSerializer, EnumValueSerializer, ExcelEnum};
pub use containers::OptionSerializer;
pub use dynamic::{any_cell, CellValue, DynamicSerializer, DynamicTable};
pub use error::{Error, Result};
pub use formatter::ExcelFormatter;
pub use options::ExcelSerializerOptions;
pub use record::{ExcelRecord, Member, RecordSchema, RecordSerializer};
pub use registry::{FailedSerializer, SerializerRegistry};
pub use serializer::{ExcelSerialize, ExcelSerializer, SharedSerializer};
pub use sheet::{column_name, to_writer};

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

/// Serializes `rows` as a workbook file at `path`.
///
/// An empty slice is a no-op: no file is created.
///
/// # Errors
///
/// Returns an error when the file cannot be created or any row fails to
/// serialize.
pub fn to_file<T: ExcelSerialize>(
    rows: &[T],
    path: impl AsRef<Path>,
    options: &ExcelSerializerOptions,
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let file = File::create(path)?;
    to_writer(rows, BufWriter::new(file), options)
}

/// Serializes `rows` as an in-memory workbook.
///
/// An empty slice yields an empty buffer.
///
/// # Errors
///
/// Returns an error when any row fails to serialize.
pub fn to_bytes<T: ExcelSerialize>(
    rows: &[T],
    options: &ExcelSerializerOptions,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    to_writer(rows, &mut cursor, options)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_writes_nothing() {
        let rows: Vec<i32> = Vec::new();
        let bytes = to_bytes(&rows, &ExcelSerializerOptions::new()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn non_empty_input_yields_a_zip() {
        let rows = vec![1_i32, 2, 3];
        let bytes = to_bytes(&rows, &ExcelSerializerOptions::new()).unwrap();
        // ZIP local-file-header magic.
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }
}
