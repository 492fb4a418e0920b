//! The streaming cell formatter.
//!
//! [`ExcelFormatter`] is the stateful writer every serializer funnels through.
//! It owns the per-session tables:
//!
//! - **Shared string table**: an insertion-ordered map from string value to a
//!   zero-based index. The same string always serializes as the same index
//!   for the lifetime of one output session ("first write wins").
//! - **Column length map**: the maximum character length observed per column,
//!   consumed by the auto-fit pass. Tracking can be switched off once probing
//!   completes so the real write pass skips the bookkeeping.
//! - **Nesting depth counter**: bounds traversal depth to catch runaway or
//!   circular record graphs. This is a heuristic limit, not a cycle detector:
//!   a true cycle shallower than the limit is not caught.
//!
//! Cell markup is emitted directly into a caller-provided byte sink; the
//! formatter never buffers whole rows.
//!
//! ## Examples
//!
//! ```rust
//! use excel_serializer::{ExcelFormatter, ExcelSerializerOptions};
//!
//! let options = ExcelSerializerOptions::new();
//! let mut formatter = ExcelFormatter::new(&options);
//! let mut out = Vec::new();
//!
//! formatter.write_string("hello", &mut out).unwrap();
//! formatter.write_string("hello", &mut out).unwrap();
//!
//! // Both cells reference shared-string slot 0.
//! assert_eq!(out, b"<c t=\"s\"><v>0</v></c><c t=\"s\"><v>0</v></c>");
//! assert_eq!(formatter.shared_strings().len(), 1);
//! ```

use crate::{Error, ExcelSerializerOptions, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::io::Write;

// Style indices into the fixed cellXfs block of styles.xml.
pub(crate) const XF_WRAP_TEXT: u8 = 1;
pub(crate) const XF_DATETIME: u8 = 2;
pub(crate) const XF_DATE: u8 = 3;
pub(crate) const XF_TIME: u8 = 4;
pub(crate) const XF_INT: u8 = 5;
pub(crate) const XF_NUM: u8 = 6;

const LEN_DATE: usize = 10;
const LEN_DATETIME: usize = 18;
const LEN_TIME: usize = 8;

const EMPTY_CELL: &[u8] = b"<c></c>";
const CELL_START_BOOL: &[u8] = b"<c t=\"b\"><v>";
const CELL_START_INT: &[u8] = b"<c t=\"n\" s=\"5\"><v>";
const CELL_START_NUM: &[u8] = b"<c t=\"n\" s=\"6\"><v>";
const CELL_START_STRING: &[u8] = b"<c t=\"s\"><v>";
const CELL_START_STRING_WRAP: &[u8] = b"<c t=\"s\" s=\"1\"><v>";
const CELL_END: &[u8] = b"</v></c>";

/// Streaming writer for cell and row markup fragments.
///
/// One formatter serves exactly one output session (one file). It is
/// deliberately not `Clone` and must never be shared across concurrent
/// sessions; the serializer registry, by contrast, is safe to share.
pub struct ExcelFormatter {
    shared_strings: IndexMap<String, usize>,
    column_lengths: BTreeMap<usize, usize>,
    column_index: usize,
    depth: usize,
    max_depth: usize,
    counting_char_length: bool,
}

impl ExcelFormatter {
    /// Creates a formatter for one output session.
    ///
    /// Column-length tracking starts enabled only when
    /// [`auto_fit_columns`](ExcelSerializerOptions::with_auto_fit_columns)
    /// is configured.
    #[must_use]
    pub fn new(options: &ExcelSerializerOptions) -> Self {
        ExcelFormatter {
            shared_strings: IndexMap::new(),
            column_lengths: BTreeMap::new(),
            column_index: 0,
            depth: 0,
            max_depth: options.max_depth,
            counting_char_length: options.auto_fit_columns,
        }
    }

    /// The deduplicated string pool, in insertion order. Slot `i` of the
    /// shared-strings part is the `i`-th key of this map.
    #[must_use]
    pub fn shared_strings(&self) -> &IndexMap<String, usize> {
        &self.shared_strings
    }

    /// Maximum character length observed per zero-based column index.
    /// Populated only while length tracking is active.
    #[must_use]
    pub fn column_lengths(&self) -> &BTreeMap<usize, usize> {
        &self.column_lengths
    }

    /// Stops column-length tracking. Called once the probing pass completes
    /// so the real write pass no longer pays the bookkeeping cost.
    pub fn stop_counting_char_length(&mut self) {
        self.counting_char_length = false;
    }

    /// Resets the per-row column cursor and the depth counter.
    ///
    /// The shared string table and the column length map survive: repeated
    /// probing passes keep landing length observations in the same column
    /// slots, and string indices assigned while probing stay valid.
    pub fn clear(&mut self) {
        self.column_index = 0;
        self.depth = 0;
    }

    /// Enters one level of composite traversal and validates the nesting
    /// bound.
    ///
    /// Every composite serializer (record, sequence, map, tuple) must call
    /// this on entry and [`exit`](Self::exit) on every exit path.
    ///
    /// # Errors
    ///
    /// [`Error::MaxDepthExceeded`] when the incremented depth reaches the
    /// configured maximum.
    #[inline]
    pub fn enter_and_validate(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth >= self.max_depth {
            return Err(Error::max_depth(self.depth));
        }
        Ok(())
    }

    /// Leaves one level of composite traversal.
    #[inline]
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Emits an empty cell and advances the column cursor.
    #[inline]
    pub fn write_empty(&mut self, sink: &mut dyn Write) -> Result<()> {
        self.column_index += 1;
        sink.write_all(EMPTY_CELL)?;
        Ok(())
    }

    /// Emits a shared-string cell.
    ///
    /// An empty string becomes an empty cell without a table entry. Otherwise
    /// the string is looked up in the shared string table, inserted at the
    /// next sequential index if absent, and the cell references that index.
    /// Strings containing a line break use the wrap-style cell variant.
    pub fn write_string(&mut self, s: &str, sink: &mut dyn Write) -> Result<()> {
        if s.is_empty() {
            return self.write_empty(sink);
        }

        let index = match self.shared_strings.get(s) {
            Some(&index) => index,
            None => {
                let index = self.shared_strings.len();
                self.shared_strings.insert(s.to_string(), index);
                index
            }
        };

        let start = if s.contains('\n') {
            CELL_START_STRING_WRAP
        } else {
            CELL_START_STRING
        };
        sink.write_all(start)?;
        write!(sink, "{index}")?;
        sink.write_all(CELL_END)?;
        self.record_length(s.chars().count());
        Ok(())
    }

    /// Emits a boolean cell (`1` or `0`).
    pub fn write_bool(&mut self, value: bool, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(CELL_START_BOOL)?;
        sink.write_all(if value { b"1" } else { b"0" })?;
        sink.write_all(CELL_END)?;
        self.record_length(1);
        Ok(())
    }

    /// Emits an integer-styled numeric cell from pre-formatted text.
    pub fn write_integer(&mut self, text: &str, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(CELL_START_INT)?;
        sink.write_all(text.as_bytes())?;
        sink.write_all(CELL_END)?;
        self.record_length(text.len());
        Ok(())
    }

    /// Emits a number-styled numeric cell from pre-formatted text.
    pub fn write_number(&mut self, text: &str, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(CELL_START_NUM)?;
        sink.write_all(text.as_bytes())?;
        sink.write_all(CELL_END)?;
        self.record_length(text.len());
        Ok(())
    }

    /// Emits a date/datetime cell.
    ///
    /// A value at exact midnight uses the date-only style and counts a
    /// 10-character width; any other time-of-day uses the date-time style and
    /// counts an 18-character width.
    pub fn write_datetime(&mut self, value: NaiveDateTime, sink: &mut dyn Write) -> Result<()> {
        let style = if value.time() == NaiveTime::MIN {
            XF_DATE
        } else {
            XF_DATETIME
        };
        write!(
            sink,
            "<c t=\"d\" s=\"{style}\"><v>{}</v></c>",
            value.format("%Y-%m-%dT%H:%M:%S")
        )?;
        self.record_length(if style == XF_DATE { LEN_DATE } else { LEN_DATETIME });
        Ok(())
    }

    /// Emits a date-only cell with a fixed midnight time component.
    pub fn write_date(&mut self, value: NaiveDate, sink: &mut dyn Write) -> Result<()> {
        write!(
            sink,
            "<c t=\"d\" s=\"{XF_DATE}\"><v>{}T00:00:00</v></c>",
            value.format("%Y-%m-%d")
        )?;
        self.record_length(LEN_DATE);
        Ok(())
    }

    /// Emits a time-only cell anchored at the 1900-01-01 epoch.
    ///
    /// Sub-second precision is dropped.
    pub fn write_time(&mut self, value: NaiveTime, sink: &mut dyn Write) -> Result<()> {
        write!(
            sink,
            "<c t=\"d\" s=\"{XF_TIME}\"><v>1900-01-01T{:02}:{:02}:{:02}</v></c>",
            value.hour(),
            value.minute(),
            value.second()
        )?;
        self.record_length(LEN_TIME);
        Ok(())
    }

    // The cursor advances on every cell; the length lands in the map only
    // while the probing pass is active.
    #[inline]
    fn record_length(&mut self, length: usize) {
        if self.counting_char_length {
            let entry = self.column_lengths.entry(self.column_index).or_insert(0);
            if *entry < length {
                *entry = length;
            }
        }
        self.column_index += 1;
    }
}
