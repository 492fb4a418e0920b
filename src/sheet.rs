//! Workbook part assembly.
//!
//! An output file is a flat OOXML package: six fixed parts plus the sheet
//! data, zipped with deflate. Everything except the sheet and the shared
//! strings is boilerplate; the sheet part is streamed row by row straight
//! into its ZIP entry, so no intermediate files or whole-sheet buffers
//! exist at any point.
//!
//! Column auto-fit is a two-pass scheme: a probe pass serializes the header
//! and the first [`auto_fit_depth`](crate::ExcelSerializerOptions::with_auto_fit_depth)
//! rows into a discarding sink purely to populate the formatter's column
//! length map, then the real pass writes the actual rows. Shared-string
//! indices assigned while probing are the same ones the real pass uses, so
//! probing never perturbs the string part.

use crate::formatter::ExcelFormatter;
use crate::{ExcelSerialize, ExcelSerializerOptions, Result};
use std::io::{self, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &[u8] = br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Override PartName="/book.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/sheet.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/strings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#;

const RELS: &[u8] = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Target="book.xml" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"/>
</Relationships>"#;

const BOOK: &[u8] = br#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView/></bookViews>
<sheets><sheet name="Sheet" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const BOOK_RELS: &[u8] = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Target="sheet.xml" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"/>
<Relationship Id="rId2" Target="strings.xml" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings"/>
<Relationship Id="rId3" Target="styles.xml" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles"/>
</Relationships>"#;

const SHEET_START: &[u8] = br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#;
const SHEET_END: &[u8] = b"</worksheet>";
const DATA_START: &[u8] = b"<sheetData>";
const DATA_END: &[u8] = b"</sheetData>";
const ROW_START: &[u8] = b"<row>";
const ROW_END: &[u8] = b"</row>";
const COLS_START: &[u8] = b"<cols>";
const COLS_END: &[u8] = b"</cols>";

const FROZEN_TITLE_ROW: &[u8] = br#"<sheetViews>
<sheetView tabSelected="1" workbookViewId="0">
<pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/>
</sheetView>
</sheetViews>"#;

const SST_START: &[u8] =
    br#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#;
const SST_END: &[u8] = b"</sst>";
const SI_START: &[u8] = b"<si><t>";
const SI_END: &[u8] = b"</t></si>";

const COLUMN_WIDTH_MARGIN: usize = 2;

/// The styles part: five configurable number formats and the fixed seven-slot
/// `cellXfs` block the cell writers index into.
pub(crate) fn styles_xml(options: &ExcelSerializerOptions) -> String {
    format!(
        r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="5">
<numFmt numFmtId="1" formatCode="{}"/>
<numFmt numFmtId="2" formatCode="{}"/>
<numFmt numFmtId="3" formatCode="{}"/>
<numFmt numFmtId="4" formatCode="{}"/>
<numFmt numFmtId="5" formatCode="{}"/>
</numFmts>
<fonts count="1">
<font/>
</fonts>
<fills count="1">
<fill/>
</fills>
<borders count="1">
<border/>
</borders>
<cellStyleXfs count="1">
<xf/>
</cellStyleXfs>
<cellXfs count="7">
<xf/>
<xf><alignment wrapText="true"/></xf>
<xf numFmtId="1" applyNumberFormat="1"></xf>
<xf numFmtId="2" applyNumberFormat="1"></xf>
<xf numFmtId="3" applyNumberFormat="1"></xf>
<xf numFmtId="4" applyNumberFormat="1"></xf>
<xf numFmtId="5" applyNumberFormat="1"></xf>
</cellXfs>
</styleSheet>"#,
        escape_xml(&options.datetime_format),
        escape_xml(&options.date_format),
        escape_xml(&options.time_format),
        escape_xml(&options.integer_format),
        escape_xml(&options.number_format),
    )
}

/// Spreadsheet-style column naming: 1→`A`, 26→`Z`, 27→`AA`, 53→`BA`.
/// Base-26 with no zero digit; indices below 1 name nothing.
#[must_use]
pub fn column_name(index: usize) -> String {
    if index < 1 {
        return String::new();
    }
    let mut index = index - 1;
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        match (index / 26).checked_sub(1) {
            Some(next) => index = next,
            None => break,
        }
    }
    letters.iter().rev().collect()
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Streams the worksheet part: optional frozen header pane, optional
/// auto-fit column widths, the header row, then every data row.
pub(crate) fn write_sheet<T: ExcelSerialize>(
    rows: &[T],
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    options: &ExcelSerializerOptions,
) -> Result<()> {
    sink.write_all(SHEET_START)?;

    if options.has_header_record {
        sink.write_all(FROZEN_TITLE_ROW)?;
    }

    if options.auto_fit_columns {
        write_column_widths(rows, formatter, sink, options)?;
    }

    sink.write_all(DATA_START)?;

    let serializer = options.serializer::<T>();
    if options.has_header_record {
        sink.write_all(ROW_START)?;
        match &options.header_titles {
            Some(titles) if !titles.is_empty() => {
                for title in titles {
                    formatter.write_string(title, sink)?;
                }
            }
            _ => {
                if let Some(first) = rows.first() {
                    serializer.write_title(formatter, sink, first, options, "value")?;
                }
            }
        }
        sink.write_all(ROW_END)?;
        formatter.clear();
    }

    for row in rows {
        sink.write_all(ROW_START)?;
        serializer.serialize(formatter, sink, row, options)?;
        sink.write_all(ROW_END)?;
        formatter.clear();
    }

    sink.write_all(DATA_END)?;

    if options.auto_filter {
        let column_count = match &options.header_titles {
            Some(titles) if !titles.is_empty() => titles.len(),
            _ => formatter.column_lengths().len(),
        };
        let name = column_name(column_count);
        if !name.is_empty() {
            // The filter range spans the header row plus every data row.
            write!(sink, "<autoFilter ref=\"A1:{}{}\"/>", name, rows.len() + 1)?;
        }
    }

    sink.write_all(SHEET_END)?;
    Ok(())
}

/// The auto-fit probe pass plus the `<cols>` block.
///
/// Probe output goes to a discarding sink; only the formatter's column
/// length map matters here. Each probed row is followed by
/// [`ExcelFormatter::clear`] so lengths land in the right column slots, and
/// tracking is switched off afterwards so the real pass skips it.
fn write_column_widths<T: ExcelSerialize>(
    rows: &[T],
    formatter: &mut ExcelFormatter,
    sink: &mut dyn Write,
    options: &ExcelSerializerOptions,
) -> Result<()> {
    let serializer = options.serializer::<T>();
    let mut probe = io::sink();

    if options.has_header_record {
        match &options.header_titles {
            Some(titles) if !titles.is_empty() => {
                for title in titles {
                    formatter.write_string(title, &mut probe)?;
                }
            }
            _ => {
                if let Some(first) = rows.first() {
                    serializer.write_title(formatter, &mut probe, first, options, "value")?;
                }
            }
        }
        formatter.clear();
    }

    for row in rows.iter().take(options.auto_fit_depth) {
        serializer.serialize(formatter, &mut probe, row, options)?;
        formatter.clear();
    }
    formatter.stop_counting_char_length();

    sink.write_all(COLS_START)?;
    for (&column, &length) in formatter.column_lengths() {
        let id = column + 1;
        let width = options
            .auto_fit_width_max
            .min((length + COLUMN_WIDTH_MARGIN) as f64);
        write!(
            sink,
            "<col min=\"{id}\" max=\"{id}\" width=\"{width:.1}\" bestFit=\"1\" customWidth=\"1\"/>"
        )?;
    }
    sink.write_all(COLS_END)?;
    Ok(())
}

/// The shared-strings part: one `<si>` per pooled string, in index order.
pub(crate) fn write_shared_strings(formatter: &ExcelFormatter, sink: &mut dyn Write) -> Result<()> {
    sink.write_all(SST_START)?;
    for s in formatter.shared_strings().keys() {
        sink.write_all(SI_START)?;
        sink.write_all(escape_xml(s).as_bytes())?;
        sink.write_all(SI_END)?;
    }
    sink.write_all(SST_END)?;
    Ok(())
}

/// Serializes `rows` as a complete workbook package into `writer`.
///
/// An empty slice writes nothing and succeeds. The sheet part streams
/// directly into its ZIP entry; nothing is spooled to disk.
pub fn to_writer<T, W>(rows: &[T], writer: W, options: &ExcelSerializerOptions) -> Result<()>
where
    T: ExcelSerialize,
    W: Write + Seek,
{
    if rows.is_empty() {
        return Ok(());
    }

    let entry = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    let mut formatter = ExcelFormatter::new(options);

    zip.start_file("sheet.xml", entry)?;
    write_sheet(rows, &mut formatter, &mut zip, options)?;

    zip.start_file("strings.xml", entry)?;
    write_shared_strings(&formatter, &mut zip)?;

    zip.start_file("[Content_Types].xml", entry)?;
    zip.write_all(CONTENT_TYPES)?;

    zip.start_file("_rels/.rels", entry)?;
    zip.write_all(RELS)?;

    zip.start_file("book.xml", entry)?;
    zip.write_all(BOOK)?;

    zip.start_file("_rels/book.xml.rels", entry)?;
    zip.write_all(BOOK_RELS)?;

    zip.start_file("styles.xml", entry)?;
    zip.write_all(styles_xml(options).as_bytes())?;

    zip.finish()?;
    Ok(())
}
