//! DOCX text extraction using docx-rs.
//!
//! Paragraph text is kept in document order. Hyperlink runs are inlined and
//! table rows become one line each, cells separated by ` | `.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use super::ExtractError;

pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractError::ExtractionFailed(format!("could not read DOCX: {e}")))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(paragraph_text(p)),
            DocumentChild::Table(t) => lines.extend(table_lines(t)),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn paragraph_text(p: &Paragraph) -> String {
    let mut text = String::new();
    for child in &p.children {
        match child {
            ParagraphChild::Run(run) => push_run(&mut text, &run.children),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(&mut text, &run.children);
                    }
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run(text: &mut String, children: &[RunChild]) {
    for child in children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn table_lines(table: &Table) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|row| {
            let TableChild::TableRow(row) = row;
            row.cells
                .iter()
                .map(|cell| {
                    let TableRowChild::TableCell(cell) = cell;
                    cell.children
                        .iter()
                        .filter_map(|content| match content {
                            TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                            _ => None,
                        })
                        .filter(|t| !t.trim().is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::fixtures;

    #[test]
    fn test_paragraphs_and_tables_in_order() {
        let bytes = fixtures::docx(&["First line", "Second line"], &["Skill", "Rust"]);
        let text = extract_text(&bytes).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines, vec!["First line", "Second line", "Skill | Rust"]);
    }

    #[test]
    fn test_garbage_is_extraction_failure() {
        assert!(matches!(
            extract_text(b"definitely not a zip archive"),
            Err(ExtractError::ExtractionFailed(_))
        ));
    }
}
