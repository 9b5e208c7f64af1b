//! Rendering of candidate actions into a natural-language instruction.

use tracing::warn;

use crate::action::{ActionKind, CandidateAction};

/// Per-candidate validation outcome collected while rendering.
///
/// Candidates with roles the prompt cannot express are skipped rather than
/// erroring; each skip is recorded here so callers can inspect why the
/// model was offered fewer choices than the step derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDiagnostic {
    pub action_id: String,
    pub reason: String,
}

/// A rendered instruction string plus the diagnostics produced on the way.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    pub text: String,
    pub skipped: Vec<PromptDiagnostic>,
}

/// Renders the current candidate set, test objective, application name and
/// recent history into a single `user` message for the model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    test_goal: String,
    app_name: String,
}

impl PromptBuilder {
    pub fn new(test_goal: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            test_goal: test_goal.into(),
            app_name: app_name.into(),
        }
    }

    /// Build the instruction for one step.
    ///
    /// Candidates are rendered in the caller's iteration order and joined
    /// by a fixed delimiter; a set with zero supported actions still
    /// yields a valid prompt offering no choices. `history` is the block
    /// produced by [`crate::history::ActionHistoryWindow::render`].
    pub fn build(&self, candidates: &[CandidateAction], history: &str) -> RenderedPrompt {
        let mut skipped = Vec::new();
        let mut rendered = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match &candidate.kind {
                ActionKind::Click => {
                    rendered.push(format!(
                        "{}: Click on '{}'",
                        candidate.id, candidate.description
                    ));
                }
                ActionKind::TypeInto { field } => {
                    rendered.push(format!(
                        "{}: Type in {} '{}'",
                        candidate.id,
                        field.label(),
                        candidate.description
                    ));
                }
                ActionKind::PasteInto { field } => {
                    rendered.push(format!(
                        "{}: Paste in {} '{}'",
                        candidate.id,
                        field.label(),
                        candidate.description
                    ));
                }
                ActionKind::Unsupported { role } => {
                    warn!(
                        target: "prompt",
                        action_id = %candidate.id,
                        role = %role,
                        "unsupported action role for LLM selection, skipping"
                    );
                    skipped.push(PromptDiagnostic {
                        action_id: candidate.id.clone(),
                        reason: format!("unsupported action role '{role}'"),
                    });
                }
            }
        }

        let mut text = format!(
            "We are testing the \"{}\" application. The objective of the test is: {}. ",
            self.app_name, self.test_goal
        );
        text.push_str("The following actions are available: ");
        text.push_str(&rendered.join(", "));
        text.push_str(". ");
        text.push_str(history);
        text.push_str("Which action should be executed to accomplish the test goal?");

        RenderedPrompt { text, skipped }
    }
}
