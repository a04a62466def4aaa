//! Leonidas prompt renderer.
//!
//! Implements the [`workflow::ports::PromptRenderer`] trait with Handlebars
//! templates embedded at compile time.
//!
//! ## Architectural Layer
//!
//! **Infrastructure — template formatting only.** This crate makes no
//! decisions: which prompt to render, and with what context, is decided by
//! the phase controller. Templates render in strict mode so a context/template
//! drift fails loudly instead of producing a silently truncated prompt.

use handlebars::Handlebars;

use workflow::ports::{ExecutePromptContext, PlanPromptContext, PromptRenderer, RenderError};

const PLAN_TEMPLATE: &str = "plan";
const EXECUTE_TEMPLATE: &str = "execute";

/// Prompt renderer over embedded Handlebars templates.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Builds the renderer, registering every embedded template.
    ///
    /// Fails only when an embedded template does not parse, which a test
    /// catches at build time rather than mid-run.
    pub fn new() -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry
            .register_template_string(PLAN_TEMPLATE, include_str!("../templates/plan.hbs"))
            .map_err(|err| RenderError {
                template: PLAN_TEMPLATE,
                detail: err.to_string(),
            })?;
        registry
            .register_template_string(EXECUTE_TEMPLATE, include_str!("../templates/execute.hbs"))
            .map_err(|err| RenderError {
                template: EXECUTE_TEMPLATE,
                detail: err.to_string(),
            })?;

        Ok(Self { registry })
    }
}

impl PromptRenderer for HandlebarsRenderer {
    fn render_plan(&self, context: &PlanPromptContext) -> Result<String, RenderError> {
        self.registry
            .render(PLAN_TEMPLATE, context)
            .map_err(|err| RenderError {
                template: PLAN_TEMPLATE,
                detail: err.to_string(),
            })
    }

    fn render_execute(&self, context: &ExecutePromptContext) -> Result<String, RenderError> {
        self.registry
            .render(EXECUTE_TEMPLATE, context)
            .map_err(|err| RenderError {
                template: EXECUTE_TEMPLATE,
                detail: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workflow::{IssueNumber, SubIssueMetadata};

    fn renderer() -> HandlebarsRenderer {
        HandlebarsRenderer::new().unwrap()
    }

    #[test]
    fn plan_prompt_includes_issue_and_marker_instruction() {
        let prompt = renderer()
            .render_plan(&PlanPromptContext {
                issue_number: 42,
                issue_title: "Add retry logic".to_string(),
                issue_body: "Retries are missing & needed.".to_string(),
                sub_issue: None,
            })
            .unwrap();

        assert!(prompt.contains("issue #42"));
        assert!(prompt.contains("<!-- leonidas:plan -->"));
        // Raw insertion: markdown/ampersands must survive unescaped.
        assert!(prompt.contains("Retries are missing & needed."));
        assert!(!prompt.contains("Decomposition context"));
    }

    #[test]
    fn plan_prompt_scopes_to_the_sub_issue_when_metadata_present() {
        let prompt = renderer()
            .render_plan(&PlanPromptContext {
                issue_number: 102,
                issue_title: "Part two".to_string(),
                issue_body: String::new(),
                sub_issue: Some(SubIssueMetadata {
                    parent: IssueNumber::new(100),
                    order: 2,
                    total: 3,
                    depends_on: Some(IssueNumber::new(101)),
                }),
            })
            .unwrap();

        assert!(prompt.contains("sub-issue 2 of 3"));
        assert!(prompt.contains("parent issue #100"));
        assert!(prompt.contains("depends on #101"));
    }

    #[test]
    fn execute_prompt_carries_plan_deadline_and_rules_flag() {
        let prompt = renderer()
            .render_execute(&ExecutePromptContext {
                issue_number: 42,
                issue_title: "Add retry logic".to_string(),
                plan: "1. Do the thing".to_string(),
                branch: "leonidas/issue-42".to_string(),
                base_branch: "main".to_string(),
                push_deadline: 45,
                sub_issue: None,
                rules_present: true,
            })
            .unwrap();

        assert!(prompt.contains("1. Do the thing"));
        assert!(prompt.contains("`leonidas/issue-42`"));
        assert!(prompt.contains("no later than turn 45"));
        assert!(prompt.contains("Closes #42"));
        assert!(prompt.contains("Repository rules"));
    }

    #[test]
    fn execute_prompt_omits_rules_section_without_rules_file() {
        let prompt = renderer()
            .render_execute(&ExecutePromptContext {
                issue_number: 7,
                issue_title: "Small fix".to_string(),
                plan: "plan".to_string(),
                branch: "leonidas/issue-7".to_string(),
                base_branch: "main".to_string(),
                push_deadline: 25,
                sub_issue: None,
                rules_present: false,
            })
            .unwrap();

        assert!(!prompt.contains("Repository rules"));
    }
}
