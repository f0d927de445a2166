use crate::domain::error::{AppError, Result};
use crate::domain::test_step::TestStep;
use crate::infrastructure::docx_writer::{pack_docx, text_cell};
use docx_rs::{DocumentChild, Docx, Table, TableChild, TableRow};
use tracing::{debug, info};

/// Step, requirement, description, expected result.
pub const POPULATED_COLUMNS: usize = 4;

/// Appends one row per step to the first table of `docx`, in input order.
/// Columns past the fourth (pass/fail, initials, date on the standard
/// template) are left blank for manual completion.
pub fn populate(docx: &mut Docx, steps: &[TestStep]) -> Result<usize> {
    let table = first_table_mut(docx)
        .ok_or_else(|| AppError::TemplateError("no table found".to_string()))?;

    let columns = column_count(table);
    if columns < POPULATED_COLUMNS {
        return Err(AppError::TemplateError(format!(
            "first table has {} columns, at least {} are required",
            columns, POPULATED_COLUMNS
        )));
    }
    debug!(columns, steps = steps.len(), "Populating template table");

    for step in steps {
        let values = [
            step.step_no.to_string(),
            step.requirement_id.clone(),
            step.description.clone(),
            step.expected_result.clone(),
        ];
        let cells = (0..columns)
            .map(|idx| text_cell(values.get(idx).map(String::as_str).unwrap_or("")))
            .collect();
        table.rows.push(TableChild::TableRow(TableRow::new(cells)));
    }

    Ok(steps.len())
}

/// Reads a DOCX template, populates it and returns the packed document.
pub fn populate_template(template_bytes: &[u8], steps: &[TestStep]) -> Result<Vec<u8>> {
    let mut docx = docx_rs::read_docx(template_bytes)
        .map_err(|e| AppError::TemplateError(format!("unreadable template: {}", e)))?;
    let rows = populate(&mut docx, steps)?;
    let bytes = pack_docx(docx)?;
    info!(rows, bytes = bytes.len(), "Rendered test script");
    Ok(bytes)
}

fn first_table_mut(docx: &mut Docx) -> Option<&mut Table> {
    docx.document.children.iter_mut().find_map(|child| match child {
        DocumentChild::Table(table) => Some(&mut **table),
        _ => None,
    })
}

fn column_count(table: &Table) -> usize {
    let widest_row = table
        .rows
        .iter()
        .map(|row| {
            let TableChild::TableRow(row) = row;
            row.cells.len()
        })
        .max()
        .unwrap_or(0);
    widest_row.max(table.grid.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::use_cases::text_extraction::parsers::docx::cell_text;
    use crate::domain::test_step::step;
    use crate::infrastructure::docx_writer::header_cell;
    use docx_rs::{Paragraph, Run, TableRowChild};

    pub(crate) const STANDARD_HEADERS: [&str; 8] = [
        "Step",
        "Requirement #",
        "Description",
        "Expected Result",
        "Actual Result",
        "Pass/Fail",
        "Initial",
        "Date",
    ];

    pub(crate) fn template_bytes(headers: &[&str], extra_table: bool) -> Vec<u8> {
        let mut docx = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Test Script")))
            .add_table(Table::new(vec![TableRow::new(
                headers.iter().map(|h| header_cell(h)).collect(),
            )]));
        if extra_table {
            docx = docx.add_table(Table::new(vec![TableRow::new(vec![
                text_cell("Approved by"),
                text_cell(""),
            ])]));
        }
        pack_docx(docx).unwrap()
    }

    pub(crate) fn tables_text(bytes: &[u8]) -> Vec<Vec<Vec<String>>> {
        let docx = docx_rs::read_docx(bytes).unwrap();
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Table(table) => Some(
                    table
                        .rows
                        .iter()
                        .map(|row| {
                            let TableChild::TableRow(row) = row;
                            row.cells
                                .iter()
                                .map(|cell| {
                                    let TableRowChild::TableCell(cell) = cell;
                                    cell_text(cell)
                                })
                                .collect()
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn eight_column_table_gets_one_row_with_trailing_columns_blank() {
        let template = template_bytes(&STANDARD_HEADERS, true);
        let steps = vec![step(1, "REQ-1", "Login", "User logs in")];

        let output = populate_template(&template, &steps).unwrap();
        let tables = tables_text(&output);

        assert_eq!(tables[0].len(), 2);
        assert_eq!(
            tables[0][1],
            vec!["1", "REQ-1", "Login", "User logs in", "", "", "", ""]
        );
        assert_eq!(tables[1], vec![vec!["Approved by".to_string(), String::new()]]);
    }

    #[test]
    fn rows_follow_input_order() {
        let template = template_bytes(&STANDARD_HEADERS[..4], false);
        let steps = vec![
            step(1, "REQ-1", "Login", "User logs in"),
            step(2, "REQ-1.1", "Password length", "Rejects short passwords"),
        ];

        let tables = tables_text(&populate_template(&template, &steps).unwrap());
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0][1][1], "REQ-1");
        assert_eq!(tables[0][2][1], "REQ-1.1");
    }

    #[test]
    fn template_without_table_is_rejected() {
        let bytes = pack_docx(
            Docx::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("No table"))),
        )
        .unwrap();
        match populate_template(&bytes, &[step(1, "R1", "d", "e")]) {
            Err(AppError::TemplateError(msg)) => assert_eq!(msg, "no table found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn narrow_table_is_a_template_shape_error() {
        let template = template_bytes(&["Step", "Requirement", "Result"], false);
        assert!(matches!(
            populate_template(&template, &[step(1, "R1", "d", "e")]),
            Err(AppError::TemplateError(_))
        ));
    }
}
