use crate::domain::error::{AppError, Result};
use crate::domain::test_step::TestStep;
use crate::infrastructure::docx_writer::DocumentBuilder;
use serde::{Deserialize, Serialize};

const APPROVERS: [&str; 3] = ["Validation Lead", "QA Reviewer", "System Owner"];
const PENDING_EXECUTION: &str = "TBD (Execute tests to populate)";

/// Pass/fail counts recorded after manual execution of the test script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExecutionResults {
    pub passed: usize,
    pub failed: usize,
}

fn approvals(doc: DocumentBuilder) -> DocumentBuilder {
    let rows: Vec<Vec<String>> = APPROVERS
        .iter()
        .map(|role| vec![role.to_string(), "_".repeat(30), "_".repeat(15)])
        .collect();
    doc.table(&["Role", "Signature", "Date"], &rows)
}

/// Validation Master Plan. `document_date` is printed as given.
pub fn generate_validation_plan(steps: &[TestStep], document_date: &str) -> Result<Vec<u8>> {
    let count = steps.len();
    let roles: Vec<Vec<String>> = [
        ("Validation Lead", "Owns the validation effort and its compliance"),
        ("Test Engineer", "Executes test scripts and records results"),
        ("QA Reviewer", "Reviews results and approves the validation package"),
        ("System Owner", "Approves the plan and signs off on completion"),
    ]
    .iter()
    .map(|(role, duty)| vec![role.to_string(), duty.to_string()])
    .collect();

    let doc = DocumentBuilder::new()
        .title("Validation Master Plan")
        .paragraph(&format!("Document Date: {}", document_date))
        .paragraph("Version: 1.0")
        .heading("1. Document Control", 2)
        .labeled("Document ID", "VMP-001")
        .labeled("Effective Date", document_date)
        .labeled("Status", "Draft")
        .heading("2. Purpose", 2)
        .paragraph(
            "This Validation Master Plan (VMP) sets out the strategy and activities needed to \
             show that the system meets its user requirements and complies with FDA 21 CFR \
             Part 11 and applicable GxP regulations.",
        )
        .heading("3. Scope", 2)
        .paragraph(
            "The plan covers the functional and non-functional requirements in the User \
             Requirements Specification (URS) through Installation Qualification (IQ), \
             Operational Qualification (OQ) and Performance Qualification (PQ).",
        )
        .heading("4. Validation Approach", 2)
        .paragraph("Validation follows a risk-based approach in these phases:")
        .bullets(&[
            "Planning: define the strategy and prepare test protocols",
            "Execution: run the test scripts and record results",
            "Review: assess results and resolve deviations",
            "Approval: collect stakeholder sign-off",
            "Archival: retain the validation package for inspection",
        ])
        .heading("5. Test Strategy", 2)
        .paragraph(&format!("Total Requirements: {}", count))
        .paragraph(&format!("Total Test Cases: {}", count))
        .paragraph("Coverage: 100% (1:1 mapping of requirements to test cases)")
        .paragraph("Test Categories:")
        .bullets(&[
            "Functional Testing: verify the functional requirements",
            "Non-Functional Testing: verify performance, security and usability",
            "Integration Testing: verify integration points",
            "User Acceptance Testing: verify end-user workflows",
        ])
        .heading("6. Roles and Responsibilities", 2)
        .table(&["Role", "Responsibility"], &roles)
        .heading("7. Validation Deliverables", 2)
        .bullets(&[
            "Validation Master Plan (VMP)",
            "User Requirements Specification (URS)",
            "Requirements Traceability Matrix (RTM)",
            "Test Scripts",
            "Test Execution Records",
            "Deviation Reports (if any)",
            "Validation Summary Report (VSR)",
        ])
        .heading("8. Validation Schedule", 2)
        .paragraph("Estimated Timeline:")
        .bullets(&[
            "Planning Phase: 2 weeks",
            "Execution Phase: 4 weeks",
            "Review & Approval: 1 week",
            "Total Duration: 7 weeks",
        ])
        .heading("9. Approvals", 2);

    approvals(doc).into_bytes()
}

/// Validation Summary Report. Without execution results the pass/fail rows
/// are left as placeholders. Results must account for every test case.
pub fn generate_validation_summary(
    steps: &[TestStep],
    results: Option<ExecutionResults>,
    report_date: &str,
) -> Result<Vec<u8>> {
    let count = steps.len();
    if let Some(r) = results {
        if r.passed + r.failed != count {
            return Err(AppError::ValidationError(format!(
                "execution results cover {} test cases ({} passed, {} failed) but the script has {}",
                r.passed + r.failed,
                r.passed,
                r.failed,
                count
            )));
        }
    }

    let (executed, passed, failed) = match results {
        Some(r) => (
            (r.passed + r.failed).to_string(),
            r.passed.to_string(),
            r.failed.to_string(),
        ),
        None => (
            PENDING_EXECUTION.to_string(),
            PENDING_EXECUTION.to_string(),
            PENDING_EXECUTION.to_string(),
        ),
    };
    let coverage = match results {
        Some(_) => "100%".to_string(),
        None => PENDING_EXECUTION.to_string(),
    };
    let metrics = vec![
        vec!["Total Requirements".to_string(), count.to_string()],
        vec!["Total Test Cases".to_string(), count.to_string()],
        vec!["Test Cases Executed".to_string(), executed],
        vec!["Test Cases Passed".to_string(), passed],
        vec!["Test Cases Failed".to_string(), failed],
        vec!["Execution Coverage".to_string(), coverage],
    ];

    let failures = results.map_or(0, |r| r.failed);
    let deviations = if failures > 0 {
        format!(
            "{} test case(s) failed. Each failure must be documented in a deviation report \
             and resolved before release.",
            failures
        )
    } else {
        "No deviations or exceptions were recorded during validation execution.".to_string()
    };

    let (conclusion, recommendations): (String, [&str; 3]) = if failures > 0 {
        (
            format!(
                "Validation is not complete: {} of {} test cases failed. The system must not be \
                 released until every failure is resolved and the affected tests are re-executed.",
                failures, count
            ),
            [
                "The system not be approved for production use until all deviations are closed",
                "Failed test cases be re-executed after corrective action",
                "This report be reissued once all test cases pass",
            ],
        )
    } else {
        (
            "Validation activities were carried out in line with the approved Validation \
             Master Plan and the requirements have been verified through testing."
                .to_string(),
            [
                "The system be approved for production use",
                "Change control procedures be followed for any later system change",
                "Periodic reviews be held to confirm continued compliance",
            ],
        )
    };

    let doc = DocumentBuilder::new()
        .title("Validation Summary Report")
        .paragraph(&format!("Report Date: {}", report_date))
        .paragraph("Version: 1.0")
        .heading("1. Executive Summary", 2)
        .paragraph(&format!(
            "This report summarises the validation activities for the system. {} test cases \
             cover all {} requirements in the URS.",
            count, count
        ))
        .heading("2. Validation Scope", 2)
        .paragraph(
            "Validation covered the functional and non-functional requirements defined in the \
             User Requirements Specification (URS), executed according to the approved test \
             scripts.",
        )
        .heading("3. Test Execution Summary", 2)
        .table(&["Metric", "Value"], &metrics)
        .heading("4. Requirements Traceability", 2)
        .paragraph(
            "Each requirement is traced to a test case. See the Requirements Traceability \
             Matrix (RTM) for the detailed mapping.",
        )
        .paragraph(&format!(
            "Requirements Coverage: 100% ({} of {} requirements tested)",
            count, count
        ))
        .heading("5. Deviations and Exceptions", 2)
        .paragraph(&deviations)
        .heading("6. Conclusion", 2)
        .paragraph(&conclusion)
        .heading("7. Recommendations", 2)
        .paragraph("Based on the validation results it is recommended that:")
        .bullets(&recommendations)
        .heading("8. Approvals", 2);

    approvals(doc).into_bytes()
}
