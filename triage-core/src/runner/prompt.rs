//! Markdown prompt construction for a single [`IterationVariation`].

use crate::types::{IterationVariation, TaskHandle};

const OUTPUT_REQUIREMENTS: &str = "## Output Requirements\n\nReport a confidence score from 0-100 \
indicating how confident you are in this answer, and explicitly list any \
limitations or assumptions you made.";

/// Build the full markdown prompt handed to the Worker Gateway for `variation`.
#[must_use]
pub fn build_prompt(task: &TaskHandle, variation: &IterationVariation) -> String {
    let mut doc = format!("# Task: {}\n\n", task.title);

    if let Some(description) = &task.description {
        doc.push_str(description);
        doc.push_str("\n\n");
    }

    doc.push_str("## Approach\n\n");
    doc.push_str(variation.additional_context.as_deref().unwrap_or("No additional guidance."));
    doc.push_str("\n\n");

    doc.push_str("## Constraints\n\n");
    if variation.constraints.is_empty() {
        doc.push_str("None specified.\n\n");
    } else {
        for constraint in &variation.constraints {
            doc.push_str(&format!("- {constraint}\n"));
        }
        doc.push('\n');
    }

    doc.push_str(OUTPUT_REQUIREMENTS);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskId, VariationId};

    fn task() -> TaskHandle {
        TaskHandle { id: TaskId::from("t1"), title: "Fix the flaky test".to_string(), description: None }
    }

    #[test]
    fn includes_title_and_sections() {
        let variation = IterationVariation::new(VariationId::from("v1"), "base", 0);
        let prompt = build_prompt(&task(), &variation);
        assert!(prompt.starts_with("# Task: Fix the flaky test"));
        assert!(prompt.contains("## Approach"));
        assert!(prompt.contains("## Constraints"));
        assert!(prompt.contains("## Output Requirements"));
        assert!(prompt.contains("confidence score"));
    }

    #[test]
    fn empty_constraints_render_none_specified() {
        let variation = IterationVariation::new(VariationId::from("v1"), "base", 0);
        let prompt = build_prompt(&task(), &variation);
        assert!(prompt.contains("None specified."));
    }

    #[test]
    fn constraints_render_as_bullets() {
        let mut variation = IterationVariation::new(VariationId::from("v1"), "base", 0);
        variation.constraints = vec!["no new deps".to_string(), "keep API stable".to_string()];
        let prompt = build_prompt(&task(), &variation);
        assert!(prompt.contains("- no new deps"));
        assert!(prompt.contains("- keep API stable"));
    }

    #[test]
    fn description_is_included_when_present() {
        let mut t = task();
        t.description = Some("Investigate the race condition.".to_string());
        let variation = IterationVariation::new(VariationId::from("v1"), "base", 0);
        let prompt = build_prompt(&t, &variation);
        assert!(prompt.contains("Investigate the race condition."));
    }
}
