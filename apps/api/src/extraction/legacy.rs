//! Legacy Word (`application/msword`) extraction.
//!
//! Browsers often label DOCX uploads as `application/msword`, so zip
//! containers are handed to the DOCX decoder. Genuine Word 97-2003 files are
//! OLE2 compound documents; their text is recovered by scanning for runs of
//! printable UTF-16LE code units and for 8-bit runs (Word stores body text
//! compressed to single bytes when it fits). Both scans are merged in file
//! order, minus the style, font and stream names every Word file carries.

use super::{docx, ExtractError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const MIN_WIDE_RUN: usize = 4;
const MIN_NARROW_RUN: usize = 6;

/// Stream, style and font names stored alongside the body in every Word file.
const BOILERPLATE: &[&str] = &[
    "Root Entry",
    "WordDocument",
    "SummaryInformation",
    "DocumentSummaryInformation",
    "CompObj",
    "1Table",
    "0Table",
    "Data",
    "ObjectPool",
    "Normal",
    "Default Paragraph Font",
    "Table Normal",
    "No List",
    "Title",
    "Subtitle",
    "Body Text",
    "List Paragraph",
    "Header",
    "Footer",
    "Hyperlink",
    "Times New Roman",
    "Arial",
    "Calibri",
    "Cambria",
    "Cambria Math",
    "Courier New",
    "Symbol",
    "Wingdings",
    "Helvetica",
    "Tahoma",
    "Verdana",
    "Georgia",
    "Garamond",
    "Microsoft Word Document",
    "Microsoft Word 97-2003 Document",
    "Microsoft Office Word",
    "MSWordDoc",
    "Word.Document.8",
];

fn is_boilerplate(run: &str) -> bool {
    let run = run.trim();
    BOILERPLATE.contains(&run)
        || run
            .strip_prefix("Heading ")
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.starts_with(ZIP_MAGIC) {
        return docx::extract_text(bytes);
    }
    if !bytes.starts_with(OLE_MAGIC) {
        return Err(ExtractError::ExtractionFailed(
            "file is not a Word document".to_string(),
        ));
    }

    let body = &bytes[OLE_MAGIC.len()..];
    let mut runs = wide_runs(body);
    runs.extend(narrow_runs(body));
    runs.sort_by_key(|(offset, _)| *offset);

    let text = runs
        .into_iter()
        .map(|(_, run)| run)
        .filter(|run| !is_boilerplate(run))
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(ExtractError::ExtractionFailed(
            "no readable text found in Word document".to_string(),
        ));
    }
    Ok(text)
}

fn is_text_char(c: char) -> bool {
    matches!(c, '\t' | '\r' | '\n') || (!c.is_control() && c != '\u{FFFD}')
}

/// Word marks paragraph ends with `\r` and cell ends with `\x07`.
fn push_char(run: &mut String, c: char) {
    match c {
        '\r' | '\x07' => run.push('\n'),
        other => run.push(other),
    }
}

/// A run of text and the byte offset it started at.
type Run = (usize, String);

fn flush(runs: &mut Vec<Run>, run: &mut String, start: usize, min: usize) {
    if run.trim().chars().count() >= min {
        runs.push((start, run.trim().to_string()));
    }
    run.clear();
}

/// Runs of Latin-1 range UTF-16LE code units (low byte printable, high byte zero).
fn wide_runs(bytes: &[u8]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut run = String::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        let c = char::from(bytes[i]);
        if bytes[i + 1] == 0 && (is_text_char(c) || c == '\x07') {
            if run.is_empty() {
                start = i;
            }
            push_char(&mut run, c);
            i += 2;
        } else {
            flush(&mut runs, &mut run, start, MIN_WIDE_RUN);
            i += 1;
        }
    }
    flush(&mut runs, &mut run, start, MIN_WIDE_RUN);
    runs
}

/// Runs of printable ASCII bytes. UTF-16 text never forms one, since every
/// other byte is zero.
fn narrow_runs(bytes: &[u8]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut run = String::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let c = char::from(b);
        if b.is_ascii() && (is_text_char(c) || c == '\x07') {
            if run.is_empty() {
                start = i;
            }
            push_char(&mut run, c);
        } else {
            flush(&mut runs, &mut run, start, MIN_NARROW_RUN);
        }
    }
    flush(&mut runs, &mut run, start, MIN_NARROW_RUN);
    runs
}
