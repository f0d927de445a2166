use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::{Validate, ValidationError};

/// One verifiable test derived from one requirement (or numbered sub-part).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TestStep {
    #[validate(range(min = 1))]
    pub step_no: u32,
    #[validate(custom(function = "not_blank"))]
    pub requirement_id: String,
    pub description: String,
    pub expected_result: String,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// `requirement_id` is the join key for change analysis and traceability, so a
/// list carrying the same id twice is rejected instead of letting one entry win.
pub fn ensure_unique_requirement_ids(steps: &[TestStep]) -> Result<()> {
    let mut seen = HashSet::with_capacity(steps.len());
    for step in steps {
        if !seen.insert(step.requirement_id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "duplicate requirement_id '{}' (step {})",
                step.requirement_id, step.step_no
            )));
        }
    }
    Ok(())
}

/// Field rules plus id uniqueness, for steps coming back from a client.
pub fn validate_steps(steps: &[TestStep]) -> Result<()> {
    for step in steps {
        step.validate().map_err(|e| {
            AppError::ValidationError(format!("Invalid step {}: {}", step.step_no, e))
        })?;
    }
    ensure_unique_requirement_ids(steps)
}

#[cfg(test)]
pub(crate) fn step(step_no: u32, requirement_id: &str, description: &str, expected: &str) -> TestStep {
    TestStep {
        step_no,
        requirement_id: requirement_id.to_string(),
        description: description.to_string(),
        expected_result: expected.to_string(),
    }
}
