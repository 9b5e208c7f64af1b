//! Candidate and resolved action models for LLM-driven selection.

use serde::{Deserialize, Serialize};

/// Semantic subtype of an input-capable widget, e.g. `text` or `password`.
///
/// Upstream action derivation reports the widget's declared type when it is
/// known; absent types fall back to a generic text field when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub web_type: Option<String>,
}

impl InputField {
    pub fn new(web_type: impl Into<String>) -> Self {
        Self {
            web_type: Some(web_type.into()),
        }
    }

    /// Human-readable label used in prompts, e.g. "Password Field".
    pub fn label(&self) -> String {
        let subtype = self.web_type.as_deref().unwrap_or("text");
        format!("{} Field", capitalize(subtype))
    }
}

/// Closed set of action kinds the selector knows how to offer to the model.
///
/// Only the two input-capable variants carry an [`InputField`] slot; roles
/// the prompt renderer cannot express are kept as `Unsupported` so they can
/// be skipped with a diagnostic instead of dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    TypeInto { field: InputField },
    PasteInto { field: InputField },
    Unsupported { role: String },
}

impl ActionKind {
    /// Whether the kind accepts typed input text.
    pub fn is_input_capable(&self) -> bool {
        matches!(self, Self::TypeInto { .. } | Self::PasteInto { .. })
    }
}

/// One selectable interface action offered to the model at a given step.
///
/// Produced by the upstream action-derivation component and borrowed by the
/// selector for the duration of a single selection call. The identifier is
/// unique within a step and stable across the same UI state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub id: String,
    pub kind: ActionKind,
    /// Free-text description of the origin widget.
    pub description: String,
}

impl CandidateAction {
    pub fn new(id: impl Into<String>, kind: ActionKind, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            description: description.into(),
        }
    }

    pub fn click(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(id, ActionKind::Click, description)
    }

    pub fn type_into(
        id: impl Into<String>,
        description: impl Into<String>,
        field: InputField,
    ) -> Self {
        Self::new(id, ActionKind::TypeInto { field }, description)
    }

    pub fn paste_into(
        id: impl Into<String>,
        description: impl Into<String>,
        field: InputField,
    ) -> Self {
        Self::new(id, ActionKind::PasteInto { field }, description)
    }

    pub fn unsupported(
        id: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            ActionKind::Unsupported { role: role.into() },
            description,
        )
    }
}

/// A candidate action with the model's input text bound into it, ready for
/// dispatch by the test-execution loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAction {
    pub id: String,
    pub kind: ActionKind,
    pub description: String,
    /// Bound input text; present only for input-capable kinds. The empty
    /// string is a valid binding meaning "no text to enter".
    pub input: Option<String>,
}

impl ResolvedAction {
    pub fn from_candidate(candidate: &CandidateAction, input: Option<String>) -> Self {
        Self {
            id: candidate.id.clone(),
            kind: candidate.kind.clone(),
            description: candidate.description.clone(),
            input,
        }
    }

    /// Summary line recorded into the action history window.
    pub fn summary(&self) -> String {
        match &self.kind {
            ActionKind::Click => format!("Click on '{}'", self.description),
            ActionKind::TypeInto { .. } => format!(
                "Type '{}' into '{}'",
                self.input.as_deref().unwrap_or(""),
                self.description
            ),
            ActionKind::PasteInto { .. } => format!(
                "Paste '{}' into '{}'",
                self.input.as_deref().unwrap_or(""),
                self.description
            ),
            ActionKind::Unsupported { role } => {
                format!("{} on '{}'", role, self.description)
            }
        }
    }
}

/// Outcome of one selection step handed back to the test-execution loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Dispatch this action against the system under test.
    Execute(ResolvedAction),
    /// The model reported the test objective accomplished; end the run.
    Terminate,
    /// Recoverable failure this step; perform nothing observable.
    NoOp,
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
