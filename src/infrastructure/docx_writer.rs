use crate::domain::error::{AppError, Result};
use docx_rs::{AlignmentType, Docx, Paragraph, Run, Shading, Table, TableCell, TableRow};
use std::io::Cursor;

pub const HEADER_FILL: &str = "2E75B5";

/// Small fluent layer over `docx_rs::Docx` for the narrative documents.
pub struct DocumentBuilder {
    docx: Docx,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self { docx: Docx::new() }
    }

    pub fn title(mut self, text: &str) -> Self {
        self.docx = self.docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(text).bold().size(36)),
        );
        self
    }

    pub fn heading(mut self, text: &str, level: u8) -> Self {
        let size = match level {
            0 | 1 => 32,
            2 => 28,
            _ => 24,
        };
        self.docx = self
            .docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text).bold().size(size)));
        self
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.docx = self
            .docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
        self
    }

    /// `Label: value` with the label in bold.
    pub fn labeled(mut self, label: &str, value: &str) -> Self {
        self.docx = self.docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("{}: ", label)).bold())
                .add_run(Run::new().add_text(value)),
        );
        self
    }

    pub fn bullet(self, text: &str) -> Self {
        self.paragraph(&format!("• {}", text))
    }

    pub fn bullets<S: AsRef<str>>(self, items: &[S]) -> Self {
        items.iter().fold(self, |doc, item| doc.bullet(item.as_ref()))
    }

    pub fn table(mut self, headers: &[&str], rows: &[Vec<String>]) -> Self {
        let mut table_rows = Vec::with_capacity(rows.len() + 1);
        table_rows.push(TableRow::new(
            headers.iter().map(|h| header_cell(h)).collect(),
        ));
        for row in rows {
            table_rows.push(TableRow::new(row.iter().map(|c| text_cell(c)).collect()));
        }
        self.docx = self.docx.add_table(Table::new(table_rows));
        self
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        pack_docx(self.docx)
    }
}

pub fn text_cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
}

pub fn header_cell(text: &str) -> TableCell {
    TableCell::new()
        .shading(Shading::new().fill(HEADER_FILL))
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(text).bold().color("FFFFFF")),
        )
}

pub fn pack_docx(docx: Docx) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| AppError::Internal(format!("Failed to write DOCX: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Truncates to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
