use crate::application::use_cases::llm_reply::{optional_field, parse_reply_object, required_field};
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::quality::{QualityReport, QualityScore};
use crate::infrastructure::docx_writer::truncate_chars;
use crate::infrastructure::llm_clients::LLMClient;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// Characters of URS text sent for review. The cut is not sentence-aware.
pub const QUALITY_CHECK_MAX_CHARS: usize = 8000;
pub const QUALITY_CHECK_MAX_TOKENS: u32 = 4000;

const QUALITY_INSTRUCTIONS: &str = r#"You are a validation expert reviewing a User Requirements Specification (URS) for quality problems.

Look for:
1. Ambiguous requirements: vague or subjective wording.
2. Non-testable requirements: nothing that can be objectively verified.
3. Missing acceptance criteria: no clear pass condition.
4. Conflicting requirements: statements that contradict each other.
5. Incomplete requirements: essential details left out.

For every issue give the requirement ID or an excerpt, the category, what is wrong, a severity of High, Medium or Low, and a concrete improvement.

Output MUST be valid JSON only, with no markdown or commentary, in this format:
{
  "overall_quality_score": "Good|Fair|Poor",
  "total_requirements": <number>,
  "issues_found": <number>,
  "issues": [
    {
      "requirement_excerpt": "excerpt or ID",
      "category": "Ambiguous|Non-Testable|Missing Acceptance|Conflicting|Incomplete",
      "description": "what is wrong",
      "severity": "High|Medium|Low",
      "suggestion": "how to improve"
    }
  ],
  "strengths": ["good aspects of the document"],
  "recommendations": ["overall recommendations"]
}

URS Text:
"#;

pub fn build_quality_prompt(urs_text: &str) -> String {
    format!(
        "{}{}\n\nGenerate the JSON quality report now:",
        QUALITY_INSTRUCTIONS,
        truncate_chars(urs_text, QUALITY_CHECK_MAX_CHARS)
    )
}

pub fn parse_quality_report(raw_reply: &str) -> Result<QualityReport> {
    let object = parse_reply_object(raw_reply)?;
    Ok(QualityReport {
        overall_quality_score: required_field::<QualityScore>(&object, "overall_quality_score", raw_reply)?,
        total_requirements: required_field(&object, "total_requirements", raw_reply)?,
        issues_found: optional_field(&object, "issues_found", raw_reply)?,
        issues: optional_field(&object, "issues", raw_reply)?,
        strengths: optional_field(&object, "strengths", raw_reply)?,
        recommendations: optional_field(&object, "recommendations", raw_reply)?,
    })
}

pub struct QualityCheckUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
}

impl QualityCheckUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self { llm_client }
    }

    pub async fn analyze_requirements(&self, config: &LLMConfig, urs_text: &str) -> Result<QualityReport> {
        let total_chars = urs_text.chars().count();
        if total_chars > QUALITY_CHECK_MAX_CHARS {
            debug!(total_chars, kept = QUALITY_CHECK_MAX_CHARS, "Truncating URS for quality check");
        }

        let prompt = build_quality_prompt(urs_text);
        let config = config.with_max_tokens(QUALITY_CHECK_MAX_TOKENS);
        let raw_reply = self.llm_client.complete(&config, &prompt).await?;

        let report = parse_quality_report(&raw_reply)?;
        info!(
            score = ?report.overall_quality_score,
            issues = report.issue_count(),
            "Quality check complete"
        );
        Ok(report)
    }
}

/// Plain-text rendering used in audit packages.
pub fn format_quality_report(report: &QualityReport) -> String {
    const RULE: &str = "===============================================================";
    let mut text = String::new();

    let _ = writeln!(text, "{}", RULE);
    let _ = writeln!(text, "           REQUIREMENTS QUALITY ANALYSIS REPORT");
    let _ = writeln!(text, "{}\n", RULE);
    let _ = writeln!(text, "Overall Quality Score: {:?}", report.overall_quality_score);
    let _ = writeln!(text, "Total Requirements: {}", report.total_requirements);
    let _ = writeln!(text, "Issues Found: {}\n", report.issue_count());

    if !report.issues.is_empty() {
        let _ = writeln!(text, "{}\nISSUES IDENTIFIED\n{}\n", RULE, RULE);
        for (idx, issue) in report.issues.iter().enumerate() {
            let _ = writeln!(text, "{}. {} [{:?}]", idx + 1, issue.category, issue.severity);
            let _ = writeln!(text, "   Requirement: {}", issue.requirement_excerpt);
            let _ = writeln!(text, "   Problem: {}", issue.description);
            let _ = writeln!(text, "   Suggestion: {}\n", issue.suggestion);
        }
    }

    for (title, items) in [
        ("STRENGTHS", &report.strengths),
        ("RECOMMENDATIONS", &report.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(text, "{}\n{}\n{}\n", RULE, title, RULE);
        for item in items {
            let _ = writeln!(text, "• {}", item);
        }
        text.push('\n');
    }

    text
}
