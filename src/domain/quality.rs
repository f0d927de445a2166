use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityScore {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub requirement_excerpt: String,
    /// Ambiguous, Non-testable, Missing Criteria and so on. Free text.
    pub category: String,
    pub description: String,
    pub severity: Severity,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_quality_score: QualityScore,
    pub total_requirements: u32,
    #[serde(default)]
    pub issues_found: Option<u32>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl QualityReport {
    pub fn issue_count(&self) -> u32 {
        self.issues_found.unwrap_or(self.issues.len() as u32)
    }
}
