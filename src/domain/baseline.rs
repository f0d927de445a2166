use crate::domain::test_step::TestStep;
use serde::{Deserialize, Serialize};

/// Saved snapshot of a URS and its test steps. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    pub baseline_id: String,
    pub project_name: String,
    /// `YYYYMMDD_HHMMSS`, sortable as a string.
    pub timestamp: String,
    pub urs_text: String,
    pub test_steps: Vec<TestStep>,
    #[serde(default)]
    pub requirements_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "LOW",
            ImpactLevel::Medium => "MEDIUM",
            ImpactLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedRequirement {
    pub requirement_id: String,
    pub old_description: String,
    pub new_description: String,
    pub old_expected: String,
    pub new_expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChanges {
    /// Added plus removed lines.
    pub total_changes: usize,
    pub has_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestImpact {
    pub tests_to_add: usize,
    pub tests_to_remove: usize,
    pub tests_to_update: usize,
    pub tests_to_reuse: usize,
    pub total_test_cases: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    pub baseline_id: String,
    pub baseline_timestamp: String,
    pub text_changes: TextChanges,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<ModifiedRequirement>,
    pub unchanged: Vec<String>,
    pub impact_level: ImpactLevel,
    pub test_impact: TestImpact,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeAnalysis {
    /// The project has no saved baseline yet.
    FirstVersion,
    Compared(ChangeReport),
}
