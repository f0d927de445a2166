//! Change control between a saved baseline and a fresh extraction.
//!
//! Requirements are joined on `requirement_id`. Descriptions and expected
//! results are compared exactly (case-sensitive, whitespace included).

use crate::domain::baseline::{
    Baseline, ChangeAnalysis, ChangeReport, ImpactLevel, ModifiedRequirement, TestImpact,
    TextChanges,
};
use crate::domain::error::Result;
use crate::domain::test_step::{ensure_unique_requirement_ids, TestStep};
use crate::infrastructure::storage::BaselineStore;
use similar::{DiffTag, TextDiff};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Combined added + removed + modified count still considered low impact.
pub const LOW_IMPACT_MAX_CHANGES: usize = 5;
/// Combined count still considered medium impact. Anything above is high.
pub const MEDIUM_IMPACT_MAX_CHANGES: usize = 10;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequirementChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<ModifiedRequirement>,
    pub unchanged: Vec<String>,
}

impl RequirementChanges {
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

pub fn analyze_text_changes(old_text: &str, new_text: &str) -> TextChanges {
    let old_lines: Vec<&str> = old_text.lines().collect();
    let new_lines: Vec<&str> = new_text.lines().collect();
    let diff = TextDiff::from_slices(&old_lines, &new_lines);

    let mut total_changes = 0;
    for op in diff.ops() {
        match op.tag() {
            DiffTag::Equal => {}
            DiffTag::Delete => total_changes += op.old_range().len(),
            DiffTag::Insert => total_changes += op.new_range().len(),
            DiffTag::Replace => total_changes += op.old_range().len() + op.new_range().len(),
        }
    }

    TextChanges {
        total_changes,
        has_changes: total_changes > 0,
    }
}

/// `added` follows the new list's order; the other buckets follow the old list's.
pub fn analyze_requirement_changes(
    old_steps: &[TestStep],
    new_steps: &[TestStep],
) -> Result<RequirementChanges> {
    ensure_unique_requirement_ids(old_steps)?;
    ensure_unique_requirement_ids(new_steps)?;

    let old_by_id: HashMap<&str, &TestStep> = old_steps
        .iter()
        .map(|step| (step.requirement_id.as_str(), step))
        .collect();
    let new_by_id: HashMap<&str, &TestStep> = new_steps
        .iter()
        .map(|step| (step.requirement_id.as_str(), step))
        .collect();

    let mut changes = RequirementChanges::default();

    for step in new_steps {
        if !old_by_id.contains_key(step.requirement_id.as_str()) {
            changes.added.push(step.requirement_id.clone());
        }
    }

    for old in old_steps {
        match new_by_id.get(old.requirement_id.as_str()) {
            None => changes.removed.push(old.requirement_id.clone()),
            Some(new) => {
                if old.description != new.description || old.expected_result != new.expected_result {
                    changes.modified.push(ModifiedRequirement {
                        requirement_id: old.requirement_id.clone(),
                        old_description: old.description.clone(),
                        new_description: new.description.clone(),
                        old_expected: old.expected_result.clone(),
                        new_expected: new.expected_result.clone(),
                    });
                } else {
                    changes.unchanged.push(old.requirement_id.clone());
                }
            }
        }
    }

    Ok(changes)
}

pub fn impact_level(change_count: usize) -> ImpactLevel {
    if change_count <= LOW_IMPACT_MAX_CHANGES {
        ImpactLevel::Low
    } else if change_count <= MEDIUM_IMPACT_MAX_CHANGES {
        ImpactLevel::Medium
    } else {
        ImpactLevel::High
    }
}

fn test_impact(changes: &RequirementChanges) -> TestImpact {
    let tests_to_add = changes.added.len();
    let tests_to_update = changes.modified.len();
    let tests_to_reuse = changes.unchanged.len();
    TestImpact {
        tests_to_add,
        tests_to_remove: changes.removed.len(),
        tests_to_update,
        tests_to_reuse,
        total_test_cases: tests_to_add + tests_to_update + tests_to_reuse,
    }
}

fn summarize(changes: &RequirementChanges, level: ImpactLevel, impact: &TestImpact) -> String {
    let mut lines = Vec::new();
    if !changes.added.is_empty() {
        lines.push(format!("• {} new requirement(s) added", changes.added.len()));
    }
    if !changes.removed.is_empty() {
        lines.push(format!("• {} requirement(s) removed", changes.removed.len()));
    }
    if !changes.modified.is_empty() {
        lines.push(format!("• {} requirement(s) modified", changes.modified.len()));
    }
    if !changes.unchanged.is_empty() {
        lines.push(format!("• {} requirement(s) unchanged", changes.unchanged.len()));
    }
    lines.push(format!("\nImpact Level: {}", level.as_str()));
    lines.push(format!("Test Cases to Add: {}", impact.tests_to_add));
    lines.push(format!("Test Cases to Update: {}", impact.tests_to_update));
    lines.push(format!("Test Cases to Reuse: {}", impact.tests_to_reuse));
    lines.join("\n")
}

/// Compares a baseline against a new extraction and its test steps.
pub fn analyze_changes(baseline: &Baseline, new_urs_text: &str, new_steps: &[TestStep]) -> Result<ChangeReport> {
    let text_changes = analyze_text_changes(&baseline.urs_text, new_urs_text);
    let changes = analyze_requirement_changes(&baseline.test_steps, new_steps)?;
    let level = impact_level(changes.change_count());
    let impact = test_impact(&changes);
    let summary = summarize(&changes, level, &impact);

    Ok(ChangeReport {
        baseline_id: baseline.baseline_id.clone(),
        baseline_timestamp: baseline.timestamp.clone(),
        text_changes,
        added: changes.added,
        removed: changes.removed,
        modified: changes.modified,
        unchanged: changes.unchanged,
        impact_level: level,
        test_impact: impact,
        summary,
    })
}

pub struct ChangeAnalyzerUseCase {
    store: Arc<BaselineStore>,
}

impl ChangeAnalyzerUseCase {
    pub fn new(store: Arc<BaselineStore>) -> Self {
        Self { store }
    }

    pub fn save_baseline(&self, urs_text: &str, steps: &[TestStep], project_name: &str) -> Result<Baseline> {
        self.store.save(project_name, urs_text, steps)
    }

    pub fn latest_baseline(&self, project_name: &str) -> Result<Option<Baseline>> {
        self.store.latest(project_name)
    }

    pub fn get_baseline(&self, baseline_id: &str) -> Result<Baseline> {
        self.store.get(baseline_id)
    }

    pub fn list_baselines(&self, project_name: &str) -> Result<Vec<String>> {
        self.store.list(project_name)
    }

    /// Compares against the project's latest baseline, if it has one.
    pub fn analyze_against_latest(
        &self,
        project_name: &str,
        new_urs_text: &str,
        new_steps: &[TestStep],
    ) -> Result<ChangeAnalysis> {
        let Some(baseline) = self.store.latest(project_name)? else {
            info!(project = %project_name, "No baseline yet, treating as first version");
            return Ok(ChangeAnalysis::FirstVersion);
        };

        let report = analyze_changes(&baseline, new_urs_text, new_steps)?;
        info!(
            project = %project_name,
            baseline_id = %report.baseline_id,
            impact = report.impact_level.as_str(),
            added = report.added.len(),
            removed = report.removed.len(),
            modified = report.modified.len(),
            "Analyzed requirement changes"
        );
        Ok(ChangeAnalysis::Compared(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::test_step::step;

    fn baseline(steps: Vec<TestStep>) -> Baseline {
        Baseline {
            baseline_id: "proj_20240101_090000".to_string(),
            project_name: "proj".to_string(),
            timestamp: "20240101_090000".to_string(),
            urs_text: "1. Login\n2. Logout".to_string(),
            requirements_count: steps.len(),
            test_steps: steps,
        }
    }

    fn numbered(prefix: &str, count: usize) -> Vec<TestStep> {
        (1..=count)
            .map(|i| step(i as u32, &format!("{}{}", prefix, i), "desc", "expected"))
            .collect()
    }

    #[test]
    fn identical_steps_are_all_unchanged_and_low_impact() {
        let steps = vec![step(1, "R1", "Login", "ok"), step(2, "R2", "Logout", "ok")];
        let report = analyze_changes(&baseline(steps.clone()), "1. Login\n2. Logout", &steps).unwrap();

        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert!(report.modified.is_empty());
        assert_eq!(report.unchanged, vec!["R1", "R2"]);
        assert_eq!(report.impact_level, ImpactLevel::Low);
        assert!(!report.text_changes.has_changes);
        assert_eq!(report.test_impact.total_test_cases, 2);
    }

    #[test]
    fn modified_and_added_requirements_are_classified() {
        let old = vec![step(1, "R1", "Original", "ok")];
        let new = vec![step(1, "R1", "X", "ok"), step(2, "R2", "Y", "ok")];

        let report = analyze_changes(&baseline(old), "text", &new).unwrap();

        assert_eq!(report.added, vec!["R2"]);
        assert!(report.removed.is_empty());
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.modified[0].requirement_id, "R1");
        assert_eq!(report.modified[0].old_description, "Original");
        assert_eq!(report.modified[0].new_description, "X");
        assert!(report.unchanged.is_empty());
    }

    #[test]
    fn comparison_is_exact_and_case_sensitive() {
        let old = vec![step(1, "R1", "Login", "ok")];
        let changed_case = vec![step(1, "R1", "login", "ok")];
        let trailing_space = vec![step(1, "R1", "Login", "ok ")];

        assert_eq!(analyze_requirement_changes(&old, &changed_case).unwrap().modified.len(), 1);
        assert_eq!(analyze_requirement_changes(&old, &trailing_space).unwrap().modified.len(), 1);
    }

    #[test]
    fn removed_requirements_keep_old_order() {
        let old = numbered("R", 3);
        let new = vec![step(1, "R2", "desc", "expected")];
        let changes = analyze_requirement_changes(&old, &new).unwrap();
        assert_eq!(changes.removed, vec!["R1", "R3"]);
        assert_eq!(changes.unchanged, vec!["R2"]);
    }

    #[test]
    fn impact_tier_boundaries() {
        for (added, expected) in [(5, ImpactLevel::Low), (6, ImpactLevel::Medium), (10, ImpactLevel::Medium), (11, ImpactLevel::High)] {
            let changes = analyze_requirement_changes(&[], &numbered("N", added)).unwrap();
            assert_eq!(changes.change_count(), added);
            assert_eq!(impact_level(changes.change_count()), expected, "{} changes", added);
        }
    }

    #[test]
    fn mixed_changes_count_towards_tier() {
        // 2 removed + 2 modified + 2 added = 6
        let old = numbered("R", 6);
        let mut new: Vec<TestStep> = old[2..].to_vec();
        new[0].description = "changed".to_string();
        new[1].expected_result = "changed".to_string();
        new.extend(numbered("N", 2));

        let report = analyze_changes(&baseline(old), "", &new).unwrap();
        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.modified.len(), 2);
        assert_eq!(report.added.len(), 2);
        assert_eq!(report.impact_level, ImpactLevel::Medium);
    }

    #[test]
    fn text_changes_count_added_and_removed_lines() {
        let changes = analyze_text_changes("a\nb\nc", "a\nB\nc\nd");
        // b -> B is one removed and one added line, d is added
        assert_eq!(changes.total_changes, 3);
        assert!(changes.has_changes);
        assert!(!analyze_text_changes("a\nb\n", "a\nb").has_changes);
    }

    #[test]
    fn summary_lists_non_empty_buckets_and_impact() {
        let old = vec![step(1, "R1", "Original", "ok")];
        let new = vec![step(1, "R1", "X", "ok"), step(2, "R2", "Y", "ok")];
        let report = analyze_changes(&baseline(old), "", &new).unwrap();
        assert_eq!(
            report.summary,
            "• 1 new requirement(s) added\n• 1 requirement(s) modified\n\nImpact Level: LOW\nTest Cases to Add: 1\nTest Cases to Update: 1\nTest Cases to Reuse: 0"
        );
    }

    #[test]
    fn duplicate_ids_fail_fast() {
        let dupes = vec![step(1, "R1", "a", "b"), step(2, "R1", "c", "d")];
        assert!(matches!(
            analyze_requirement_changes(&[], &dupes),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn first_analysis_without_baseline_then_compared() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = ChangeAnalyzerUseCase::new(Arc::new(BaselineStore::new(dir.path())));
        let steps = vec![step(1, "R1", "Login", "ok")];

        assert!(matches!(
            use_case.analyze_against_latest("proj", "1. Login", &steps).unwrap(),
            ChangeAnalysis::FirstVersion
        ));

        let saved = use_case.save_baseline("1. Login", &steps, "proj").unwrap();
        match use_case.analyze_against_latest("proj", "1. Login", &steps).unwrap() {
            ChangeAnalysis::Compared(report) => {
                assert_eq!(report.baseline_id, saved.baseline_id);
                assert_eq!(report.unchanged, vec!["R1"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
