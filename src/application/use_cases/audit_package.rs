//! Audit package export.
//!
//! Every artifact is generated independently. A failing artifact is logged,
//! left out of the archive and listed in the manifest; it never aborts the
//! package. The six numbered folders, `README.txt` and the manifest are
//! always present.

use crate::application::use_cases::quality_checker::format_quality_report;
use crate::application::use_cases::rtm_generator::{generate_rtm_docx, generate_rtm_xlsx};
use crate::application::use_cases::template_populator::populate_template;
use crate::application::use_cases::validation_docs::{
    generate_validation_plan, generate_validation_summary, ExecutionResults,
};
use crate::domain::baseline::ChangeAnalysis;
use crate::domain::error::{AppError, Result};
use crate::domain::quality::QualityReport;
use crate::domain::test_step::TestStep;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};
use tracing::{info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

pub const REQUIREMENTS_DIR: &str = "01_Requirements/";
pub const TEST_SCRIPTS_DIR: &str = "02_Test_Scripts/";
pub const TRACEABILITY_DIR: &str = "03_Traceability/";
pub const VALIDATION_DOCS_DIR: &str = "04_Validation_Docs/";
pub const QUALITY_REPORTS_DIR: &str = "05_Quality_Reports/";
pub const METADATA_DIR: &str = "06_Metadata/";

pub const PACKAGE_FOLDERS: [&str; 6] = [
    REQUIREMENTS_DIR,
    TEST_SCRIPTS_DIR,
    TRACEABILITY_DIR,
    VALIDATION_DOCS_DIR,
    QUALITY_REPORTS_DIR,
    METADATA_DIR,
];

pub struct UrsSource<'a> {
    pub bytes: &'a [u8],
    pub extension: &'a str,
}

pub struct AuditPackageInput<'a> {
    pub urs_source: Option<UrsSource<'a>>,
    pub urs_text: &'a str,
    pub test_steps: &'a [TestStep],
    pub template: Option<&'a [u8]>,
    pub quality_report: Option<&'a QualityReport>,
    pub change_analysis: Option<&'a ChangeAnalysis>,
    pub execution_results: Option<ExecutionResults>,
    /// Why the quality check could not be produced, when it was requested.
    pub quality_check_error: Option<&'a str>,
    /// Why change analysis could not be produced, when it was requested.
    pub change_analysis_error: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFlags {
    pub urs_included: bool,
    pub test_scripts_included: bool,
    pub rtm_included: bool,
    pub validation_docs_included: bool,
    pub quality_reports_included: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageStatistics {
    pub total_requirements: usize,
    pub total_test_cases: usize,
    pub urs_text_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub path: String,
    pub sha256: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmittedArtifact {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub package_id: String,
    pub generation_timestamp: String,
    pub generator_version: String,
    pub contents: ContentFlags,
    pub statistics: PackageStatistics,
    pub artifacts: Vec<ArtifactRecord>,
    pub omitted: Vec<OmittedArtifact>,
}

pub struct AuditPackage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metadata: PackageMetadata,
}

struct Artifact {
    path: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct Collected {
    artifacts: Vec<Artifact>,
    omitted: Vec<OmittedArtifact>,
}

impl Collected {
    /// Runs one generator and records its output or its failure.
    fn add(&mut self, path: String, generate: impl FnOnce() -> Result<Vec<u8>>) -> bool {
        match generate() {
            Ok(bytes) => {
                self.artifacts.push(Artifact { path, bytes });
                true
            }
            Err(err) => {
                warn!(artifact = %path, error = %err, "Audit artifact generation failed, omitting");
                self.omitted.push(OmittedArtifact {
                    path,
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Records an artifact whose upstream input never materialized.
    fn omit(&mut self, path: String, reason: &str) {
        warn!(artifact = %path, error = %reason, "Audit artifact input unavailable, omitting");
        self.omitted.push(OmittedArtifact {
            path,
            reason: reason.to_string(),
        });
    }
}

pub fn build_audit_package(input: &AuditPackageInput<'_>, now: DateTime<Local>) -> Result<AuditPackage> {
    let ts = now.format("%Y%m%d_%H%M%S").to_string();
    let doc_date = now.format("%Y-%m-%d").to_string();
    let generated_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut collected = Collected::default();
    let mut contents = ContentFlags::default();

    if let Some(source) = &input.urs_source {
        contents.urs_included = collected.add(
            format!("{}URS_{}.{}", REQUIREMENTS_DIR, ts, source.extension),
            || Ok(source.bytes.to_vec()),
        );
    }

    if let Some(template) = input.template {
        contents.test_scripts_included = collected.add(
            format!("{}Test_Script_{}.docx", TEST_SCRIPTS_DIR, ts),
            || populate_template(template, input.test_steps),
        );
    }

    let rtm_xlsx = collected.add(format!("{}RTM_{}.xlsx", TRACEABILITY_DIR, ts), || {
        generate_rtm_xlsx(input.test_steps)
    });
    let rtm_docx = collected.add(format!("{}RTM_{}.docx", TRACEABILITY_DIR, ts), || {
        generate_rtm_docx(input.test_steps, &generated_at)
    });
    contents.rtm_included = rtm_xlsx || rtm_docx;

    let plan = collected.add(
        format!("{}Validation_Plan_{}.docx", VALIDATION_DOCS_DIR, ts),
        || generate_validation_plan(input.test_steps, &doc_date),
    );
    let summary = collected.add(
        format!("{}Validation_Summary_{}.docx", VALIDATION_DOCS_DIR, ts),
        || generate_validation_summary(input.test_steps, input.execution_results, &doc_date),
    );
    contents.validation_docs_included = plan && summary;

    if let Some(report) = input.quality_report {
        let json = collected.add(
            format!("{}Quality_Check_{}.json", QUALITY_REPORTS_DIR, ts),
            || to_pretty_json(report),
        );
        let text = collected.add(
            format!("{}Quality_Check_{}.txt", QUALITY_REPORTS_DIR, ts),
            || Ok(format_quality_report(report).into_bytes()),
        );
        contents.quality_reports_included |= json || text;
    } else if let Some(reason) = input.quality_check_error {
        collected.omit(format!("{}Quality_Check_{}.json", QUALITY_REPORTS_DIR, ts), reason);
        collected.omit(format!("{}Quality_Check_{}.txt", QUALITY_REPORTS_DIR, ts), reason);
    }

    if let Some(analysis) = input.change_analysis {
        contents.quality_reports_included |= collected.add(
            format!("{}Change_Analysis_{}.json", QUALITY_REPORTS_DIR, ts),
            || to_pretty_json(analysis),
        );
    } else if let Some(reason) = input.change_analysis_error {
        collected.omit(format!("{}Change_Analysis_{}.json", QUALITY_REPORTS_DIR, ts), reason);
    }

    let metadata = PackageMetadata {
        package_id: format!("AUDIT_{}", ts),
        generation_timestamp: now.to_rfc3339(),
        generator_version: env!("CARGO_PKG_VERSION").to_string(),
        contents,
        statistics: PackageStatistics {
            total_requirements: input.test_steps.len(),
            total_test_cases: input.test_steps.len(),
            urs_text_length: input.urs_text.chars().count(),
        },
        artifacts: collected
            .artifacts
            .iter()
            .map(|artifact| ArtifactRecord {
                path: artifact.path.clone(),
                sha256: hex::encode(Sha256::digest(&artifact.bytes)),
                size_bytes: artifact.bytes.len(),
            })
            .collect(),
        omitted: collected.omitted,
    };

    let readme = render_readme(&metadata, &generated_at);
    let metadata_path = format!("{}package_metadata_{}.json", METADATA_DIR, ts);
    let metadata_json = to_pretty_json(&metadata)?;

    let bytes = write_zip(&collected.artifacts, &readme, &metadata_path, &metadata_json)
        .map_err(|e| AppError::Internal(format!("Failed to write audit package: {}", e)))?;

    info!(
        package_id = %metadata.package_id,
        artifacts = metadata.artifacts.len(),
        omitted = metadata.omitted.len(),
        bytes = bytes.len(),
        "Built audit package"
    );

    Ok(AuditPackage {
        file_name: format!("Audit_Package_{}.zip", ts),
        bytes,
        metadata,
    })
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize JSON: {}", e)))
}

fn write_zip(
    artifacts: &[Artifact],
    readme: &str,
    metadata_path: &str,
    metadata_json: &[u8],
) -> zip::result::ZipResult<Vec<u8>> {
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    for folder in PACKAGE_FOLDERS {
        zw.add_directory(folder, opts)?;
    }

    zw.start_file("README.txt", opts)?;
    zw.write_all(readme.as_bytes())?;

    for artifact in artifacts {
        zw.start_file(artifact.path.as_str(), opts)?;
        zw.write_all(&artifact.bytes)?;
    }

    zw.start_file(metadata_path, opts)?;
    zw.write_all(metadata_json)?;

    Ok(zw.finish()?.into_inner())
}

fn render_readme(metadata: &PackageMetadata, generated_at: &str) -> String {
    const RULE: &str = "===============================================================";
    let mut lines = vec![
        RULE.to_string(),
        "                 VALIDATION AUDIT PACKAGE".to_string(),
        RULE.to_string(),
        String::new(),
        format!("Package Generated: {}", generated_at),
        format!("Package ID: {}", metadata.package_id),
        String::new(),
        RULE.to_string(),
        "CONTENTS".to_string(),
        RULE.to_string(),
        String::new(),
    ];

    let folders: [(&str, &[&str]); 6] = [
        (REQUIREMENTS_DIR, &["User Requirements Specification (URS) as uploaded"]),
        (TEST_SCRIPTS_DIR, &["Populated test script, one step per requirement"]),
        (TRACEABILITY_DIR, &["Requirements Traceability Matrix (Excel and Word)"]),
        (VALIDATION_DOCS_DIR, &["Validation Master Plan (VMP)", "Validation Summary Report (VSR)"]),
        (QUALITY_REPORTS_DIR, &["Requirements quality analysis (JSON and text)", "Change impact analysis, when a baseline exists"]),
        (METADATA_DIR, &["Package manifest with SHA-256 checksums of every artifact"]),
    ];
    for (folder, notes) in folders {
        lines.push(folder.to_string());
        for note in notes {
            lines.push(format!("  - {}", note));
        }
        lines.push(String::new());
    }

    if !metadata.omitted.is_empty() {
        lines.push(RULE.to_string());
        lines.push("OMITTED ARTIFACTS".to_string());
        lines.push(RULE.to_string());
        lines.push(String::new());
        for omitted in &metadata.omitted {
            lines.push(format!("  - {}: {}", omitted.path, omitted.reason));
        }
        lines.push(String::new());
    }

    lines.extend(
        [
            RULE,
            "COMPLIANCE",
            RULE,
            "",
            "Prepared to support:",
            "- FDA 21 CFR Part 11",
            "- EU Annex 11",
            "- GAMP 5 guidelines",
            "- GxP validation requirements",
            "",
            "Review and approve every document under your organization's",
            "validation procedures before use.",
            RULE,
        ]
        .iter()
        .map(|line| line.to_string()),
    );

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::template_populator::tests::{template_bytes, STANDARD_HEADERS};
    use crate::domain::quality::QualityScore;
    use crate::domain::test_step::step;
    use chrono::TimeZone;
    use std::io::Read;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn full_package_has_fixed_layout_and_checksums() {
        let steps = vec![step(1, "REQ-1", "Login", "User logs in")];
        let template = template_bytes(&STANDARD_HEADERS, false);
        let quality = QualityReport {
            overall_quality_score: QualityScore::Good,
            total_requirements: 1,
            issues_found: None,
            issues: vec![],
            strengths: vec!["Clear".to_string()],
            recommendations: vec![],
        };
        let first_version = ChangeAnalysis::FirstVersion;
        let input = AuditPackageInput {
            urs_source: Some(UrsSource {
                bytes: b"1. Login",
                extension: "txt",
            }),
            urs_text: "1. Login",
            test_steps: &steps,
            template: Some(template.as_slice()),
            quality_report: Some(&quality),
            change_analysis: Some(&first_version),
            execution_results: None,
            quality_check_error: None,
            change_analysis_error: None,
        };

        let package = build_audit_package(&input, fixed_now()).unwrap();
        let names = entry_names(&package.bytes);

        for folder in PACKAGE_FOLDERS {
            assert!(names.iter().any(|n| n == folder), "missing {}", folder);
        }
        for expected in [
            "README.txt",
            "01_Requirements/URS_20240315_123000.txt",
            "02_Test_Scripts/Test_Script_20240315_123000.docx",
            "03_Traceability/RTM_20240315_123000.xlsx",
            "03_Traceability/RTM_20240315_123000.docx",
            "04_Validation_Docs/Validation_Plan_20240315_123000.docx",
            "04_Validation_Docs/Validation_Summary_20240315_123000.docx",
            "05_Quality_Reports/Quality_Check_20240315_123000.json",
            "05_Quality_Reports/Quality_Check_20240315_123000.txt",
            "05_Quality_Reports/Change_Analysis_20240315_123000.json",
            "06_Metadata/package_metadata_20240315_123000.json",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }

        let meta = &package.metadata;
        assert_eq!(meta.package_id, "AUDIT_20240315_123000");
        assert!(meta.contents.urs_included && meta.contents.test_scripts_included);
        assert!(meta.contents.rtm_included && meta.contents.validation_docs_included);
        assert!(meta.contents.quality_reports_included);
        assert!(meta.omitted.is_empty());

        let urs = meta
            .artifacts
            .iter()
            .find(|a| a.path.starts_with(REQUIREMENTS_DIR))
            .unwrap();
        assert_eq!(urs.sha256, hex::encode(Sha256::digest(b"1. Login")));
        assert_eq!(urs.size_bytes, 8);

        let manifest: PackageMetadata = serde_json::from_str(&read_entry(
            &package.bytes,
            "06_Metadata/package_metadata_20240315_123000.json",
        ))
        .unwrap();
        assert_eq!(manifest.artifacts.len(), meta.artifacts.len());
        assert!(read_entry(&package.bytes, "README.txt").contains("21 CFR Part 11"));
    }

    #[test]
    fn failing_artifact_is_omitted_without_aborting() {
        let steps = vec![step(1, "REQ-1", "Login", "User logs in")];
        let input = AuditPackageInput {
            urs_source: None,
            urs_text: "1. Login",
            test_steps: &steps,
            template: Some(&b"definitely not a docx"[..]),
            quality_report: None,
            change_analysis: None,
            execution_results: None,
            quality_check_error: None,
            change_analysis_error: None,
        };

        let package = build_audit_package(&input, fixed_now()).unwrap();
        let names = entry_names(&package.bytes);

        assert!(!package.metadata.contents.test_scripts_included);
        assert!(!package.metadata.contents.urs_included);
        assert!(!package.metadata.contents.quality_reports_included);
        assert_eq!(package.metadata.omitted.len(), 1);
        assert_eq!(
            package.metadata.omitted[0].path,
            "02_Test_Scripts/Test_Script_20240315_123000.docx"
        );
        assert!(!names.iter().any(|n| n.starts_with("02_Test_Scripts/Test_Script")));
        assert!(names.iter().any(|n| n == "02_Test_Scripts/"));
        assert!(names.iter().any(|n| n == "03_Traceability/RTM_20240315_123000.xlsx"));
        assert!(read_entry(&package.bytes, "README.txt").contains("OMITTED ARTIFACTS"));
    }

    #[test]
    fn upstream_failures_are_listed_as_omitted() {
        let steps = vec![step(1, "REQ-1", "Login", "User logs in")];
        let input = AuditPackageInput {
            urs_source: None,
            urs_text: "1. Login",
            test_steps: &steps,
            template: None,
            quality_report: None,
            change_analysis: None,
            execution_results: None,
            quality_check_error: Some("LLM error: quota exceeded"),
            change_analysis_error: Some("Not found: baseline store unreadable"),
        };

        let package = build_audit_package(&input, fixed_now()).unwrap();
        let omitted: Vec<&str> = package
            .metadata
            .omitted
            .iter()
            .map(|o| o.path.as_str())
            .collect();

        assert_eq!(
            omitted,
            vec![
                "05_Quality_Reports/Quality_Check_20240315_123000.json",
                "05_Quality_Reports/Quality_Check_20240315_123000.txt",
                "05_Quality_Reports/Change_Analysis_20240315_123000.json",
            ]
        );
        assert_eq!(package.metadata.omitted[0].reason, "LLM error: quota exceeded");
        assert!(!package.metadata.contents.quality_reports_included);

        let readme = read_entry(&package.bytes, "README.txt");
        assert!(readme.contains("OMITTED ARTIFACTS"));
        assert!(readme.contains("quota exceeded"));
    }
}
