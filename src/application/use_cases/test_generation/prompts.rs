use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_MASTER_PROMPT: &str = r#"You are a computer system validation specialist for pharmaceutical and medical device software.
Read the User Requirements Specification (URS) below, identify every individual requirement and write one executable test step for each.

Return exactly this JSON structure:
{
  "test_steps": [
    {
      "step_no": 1,
      "requirement_id": "REQ-001",
      "description": "What the tester does to verify the requirement",
      "expected_result": "The observable outcome that proves the requirement is met"
    }
  ]
}

Rules:
- One test step per requirement.
- Keep the order in which requirements appear in the URS.
- Numbered sub-parts (for example 1.1 and 1.2) are separate requirements and get separate steps.
- Reuse the requirement identifiers from the URS when present; otherwise number them REQ-001, REQ-002 and so on.
- Every requirement_id must be unique.
- step_no starts at 1 and increases by one.
- Write in clear, objective language suitable for GxP and 21 CFR Part 11 review.
- Output strictly valid JSON with a top-level "test_steps" array. No prose, no markdown, no code fences."#;

const GENERATION_DIRECTIVE: &str = "Generate the JSON output with test_steps array now:";

/// Reads the master instructions from `path`, falling back to the embedded
/// default when the file is absent, unreadable or blank.
pub fn load_master_prompt(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_MASTER_PROMPT.to_string();
    };

    match fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => {
            info!(path = %path.display(), "Loaded master prompt");
            content
        }
        Ok(_) => {
            warn!(path = %path.display(), "Master prompt file is empty, using embedded prompt");
            DEFAULT_MASTER_PROMPT.to_string()
        }
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "Failed to read master prompt");
            }
            DEFAULT_MASTER_PROMPT.to_string()
        }
    }
}

pub fn build_generation_prompt(master_prompt: &str, urs_text: &str) -> String {
    format!(
        "{}\n\nURS Text:\n{}\n\n{}",
        master_prompt.trim_end(),
        urs_text,
        GENERATION_DIRECTIVE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_keeps_urs_text_verbatim_between_instructions_and_directive() {
        let urs = "1. The system shall log in users.\n1.1 Passwords must be 8+ chars.";
        let prompt = build_generation_prompt("INSTRUCTIONS\n", urs);
        assert_eq!(
            prompt,
            format!("INSTRUCTIONS\n\nURS Text:\n{}\n\n{}", urs, GENERATION_DIRECTIVE)
        );
    }

    #[test]
    fn falls_back_when_file_missing_or_blank() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_master_prompt(Some(&dir.path().join("missing.md"))),
            DEFAULT_MASTER_PROMPT
        );

        let blank = dir.path().join("blank.md");
        fs::write(&blank, "  \n").unwrap();
        assert_eq!(load_master_prompt(Some(&blank)), DEFAULT_MASTER_PROMPT);

        let custom = dir.path().join("custom.md");
        fs::write(&custom, "Custom instructions").unwrap();
        assert_eq!(load_master_prompt(Some(&custom)), "Custom instructions");
        assert_eq!(load_master_prompt(None), DEFAULT_MASTER_PROMPT);
    }
}
