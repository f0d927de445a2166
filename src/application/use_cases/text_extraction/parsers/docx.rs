use crate::domain::error::{AppError, Result};
use docx_rs::{
    DocumentChild, Docx, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCell, TableCellContent, TableChild, TableRowChild,
};

pub fn extract_docx(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| AppError::ExtractionError(format!("Failed to read DOCX: {}", e)))?;
    let text = docx_plain_text(&docx);
    if text.trim().is_empty() {
        return Err(AppError::ExtractionError("DOCX contains no text".to_string()));
    }
    Ok(text)
}

/// Non-blank body paragraphs first, then every non-blank table cell, one per line.
pub(crate) fn docx_plain_text(docx: &Docx) -> String {
    let mut lines = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let text = paragraph_text(paragraph);
            if !text.trim().is_empty() {
                lines.push(text);
            }
        }
    }
    for child in &docx.document.children {
        if let DocumentChild::Table(table) = child {
            collect_cell_lines(table, &mut lines);
        }
    }
    lines.join("\n")
}

fn collect_cell_lines(table: &Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            let text = cell_text(cell);
            if !text.trim().is_empty() {
                lines.push(text);
            }
        }
    }
}

pub(crate) fn cell_text(cell: &TableCell) -> String {
    let mut parts = Vec::new();
    for content in &cell.children {
        match content {
            TableCellContent::Paragraph(paragraph) => parts.push(paragraph_text(paragraph)),
            TableCellContent::Table(table) => {
                let mut nested = Vec::new();
                collect_cell_lines(table, &mut nested);
                parts.push(nested.join(" "));
            }
            _ => {}
        }
    }
    parts.join("\n").trim().to_string()
}

pub(crate) fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        push_paragraph_child(child, &mut buffer);
    }
    buffer
}

fn push_paragraph_child(child: &ParagraphChild, buffer: &mut String) {
    match child {
        ParagraphChild::Run(run) => push_run(run, buffer),
        ParagraphChild::Hyperlink(link) => {
            for link_child in &link.children {
                push_paragraph_child(link_child, buffer);
            }
        }
        ParagraphChild::Insert(insert) => {
            for insert_child in &insert.children {
                if let InsertChild::Run(run) = insert_child {
                    push_run(run, buffer);
                }
            }
        }
        _ => {}
    }
}

fn push_run(run: &Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => buffer.push_str(&text.text),
            RunChild::Tab(_) => buffer.push('\t'),
            RunChild::Break(_) => buffer.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::docx_writer::{pack_docx, text_cell};
    use docx_rs::TableRow;

    #[test]
    fn paragraphs_come_before_table_cells() {
        let docx = Docx::new()
            .add_table(Table::new(vec![TableRow::new(vec![
                text_cell("REQ-1"),
                text_cell(""),
                text_cell("Audit trail"),
            ])]))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("User Requirements")))
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("1. Log in users")));
        let bytes = pack_docx(docx).unwrap();

        let text = extract_docx(&bytes).unwrap();
        assert_eq!(text, "User Requirements\n1. Log in users\nREQ-1\nAudit trail");
    }

    #[test]
    fn document_without_text_fails() {
        let bytes = pack_docx(Docx::new().add_paragraph(Paragraph::new())).unwrap();
        assert!(matches!(
            extract_docx(&bytes),
            Err(AppError::ExtractionError(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail() {
        assert!(matches!(
            extract_docx(b"not a zip"),
            Err(AppError::ExtractionError(_))
        ));
    }
}
