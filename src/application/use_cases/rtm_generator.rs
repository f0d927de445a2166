//! Requirements Traceability Matrix export.
//!
//! Every test step maps 1:1 to one requirement, so coverage is always
//! reported as complete. Gaps are not computed.

use crate::domain::error::{AppError, Result};
use crate::domain::test_step::TestStep;
use crate::infrastructure::docx_writer::{truncate_chars, DocumentBuilder};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use serde::{Deserialize, Serialize};

/// Same blue as the Word header cells.
const HEADER_FILL_RGB: u32 = 0x2E75B5;
const TEST_DESCRIPTION_CHARS: usize = 100;
/// Excerpt length for long text in the Word variant only.
const DOCX_EXCERPT_CHARS: usize = 200;

const XLSX_COLUMNS: [(&str, f64); 7] = [
    ("Requirement ID", 15.0),
    ("Requirement Description", 40.0),
    ("Test Case ID", 15.0),
    ("Test Description", 40.0),
    ("Expected Result", 40.0),
    ("Traceability Status", 18.0),
    ("Coverage", 12.0),
];

const DOCX_HEADERS: [&str; 7] = [
    "Req ID",
    "Requirement",
    "Test Case",
    "Test Description",
    "Expected Result",
    "Status",
    "Coverage",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtmEntry {
    pub requirement_id: String,
    pub requirement_description: String,
    pub test_case_id: String,
    pub test_description: String,
    pub expected_result: String,
    pub traceability_status: String,
    pub coverage: String,
}

pub fn build_rtm_entries(steps: &[TestStep]) -> Vec<RtmEntry> {
    steps
        .iter()
        .map(|step| RtmEntry {
            requirement_id: step.requirement_id.clone(),
            requirement_description: step.description.clone(),
            test_case_id: format!("TC-{}", step.step_no),
            test_description: format!(
                "Verify: {}...",
                truncate_chars(&step.description, TEST_DESCRIPTION_CHARS)
            ),
            expected_result: step.expected_result.clone(),
            traceability_status: "Mapped".to_string(),
            coverage: "1:1".to_string(),
        })
        .collect()
}

pub fn generate_rtm_xlsx(steps: &[TestStep]) -> Result<Vec<u8>> {
    write_rtm_workbook(&build_rtm_entries(steps))
        .map_err(|e| AppError::Internal(format!("Failed to write RTM workbook: {}", e)))
}

fn write_rtm_workbook(entries: &[RtmEntry]) -> std::result::Result<Vec<u8>, XlsxError> {
    let border = FormatBorder::Thin;
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL_RGB))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(border);
    let body = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap()
        .set_border(border);
    let centered = Format::new().set_align(FormatAlign::Center).set_border(border);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("RTM")?;

    for (col, (title, width)) in XLSX_COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (idx, entry) in entries.iter().enumerate() {
        let row = idx as u32 + 1;
        worksheet.write_string_with_format(row, 0, &entry.requirement_id, &body)?;
        worksheet.write_string_with_format(row, 1, &entry.requirement_description, &body)?;
        worksheet.write_string_with_format(row, 2, &entry.test_case_id, &body)?;
        worksheet.write_string_with_format(row, 3, &entry.test_description, &body)?;
        worksheet.write_string_with_format(row, 4, &entry.expected_result, &body)?;
        worksheet.write_string_with_format(row, 5, &entry.traceability_status, &centered)?;
        worksheet.write_string_with_format(row, 6, &entry.coverage, &centered)?;
    }

    workbook.save_to_buffer()
}

pub fn generate_rtm_docx(steps: &[TestStep], generated_at: &str) -> Result<Vec<u8>> {
    let entries = build_rtm_entries(steps);
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.requirement_id.clone(),
                truncate_chars(&entry.requirement_description, DOCX_EXCERPT_CHARS).to_string(),
                entry.test_case_id.clone(),
                entry.test_description.clone(),
                truncate_chars(&entry.expected_result, DOCX_EXCERPT_CHARS).to_string(),
                entry.traceability_status.clone(),
                entry.coverage.clone(),
            ]
        })
        .collect();

    DocumentBuilder::new()
        .title("Requirements Traceability Matrix")
        .paragraph(&format!("Generated: {}", generated_at))
        .paragraph(&format!("Total Requirements: {}", entries.len()))
        .heading("Purpose", 2)
        .paragraph(
            "This Requirements Traceability Matrix (RTM) links each user requirement to the \
             test case that verifies it, providing the bidirectional traceability expected \
             during regulatory review.",
        )
        .heading("Traceability Matrix", 2)
        .table(&DOCX_HEADERS, &rows)
        .heading("Coverage Summary", 2)
        .paragraph(&format!("Total Requirements: {}", entries.len()))
        .paragraph(&format!("Total Test Cases: {}", entries.len()))
        .paragraph("Coverage: 100%")
        .into_bytes()
}
