//! Classification of raw model replies into structured verdicts.

use serde::Deserialize;
use tracing::warn;

use crate::action::{CandidateAction, ResolvedAction};

/// Identifier substring the model uses to report the objective accomplished.
const FINISHED_SENTINEL: &str = "complete";

/// Shape the model is instructed to reply with.
#[derive(Debug, Deserialize)]
struct ModelSelection {
    #[serde(rename = "actionId")]
    action_id: String,
    #[serde(default)]
    input: Option<String>,
}

/// Classified outcome of parsing one model reply.
///
/// Keeping "we can't parse it" (`Malformed`), "it asked for something that
/// doesn't exist" (`OutOfRange`) and "it says it's done" (`Finished`)
/// distinct lets the orchestrator drive a different corrective message and
/// control outcome for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionVerdict {
    /// A candidate was matched; input text is bound for input-capable kinds.
    Selected(ResolvedAction),
    /// The model reports the test objective accomplished.
    Finished,
    /// The reply decoded but named an identifier outside the candidate set.
    OutOfRange { action_id: String },
    /// The reply could not be decoded into the required shape.
    Malformed,
}

/// Parse `raw` against the candidate set for this step.
///
/// The finished sentinel is checked before identifier lookup, so a
/// "complete" reply terminates the run even when no candidate matches.
pub fn classify(raw: &str, candidates: &[CandidateAction]) -> SelectionVerdict {
    let selection: ModelSelection = match serde_json::from_str(raw) {
        Ok(selection) => selection,
        Err(cause) => {
            warn!(target: "classifier", %cause, reply = %raw, "unable to parse model reply");
            return SelectionVerdict::Malformed;
        }
    };

    if selection
        .action_id
        .to_lowercase()
        .contains(FINISHED_SENTINEL)
    {
        return SelectionVerdict::Finished;
    }

    let Some(candidate) = candidates
        .iter()
        .find(|candidate| candidate.id == selection.action_id)
    else {
        warn!(
            target: "classifier",
            action_id = %selection.action_id,
            "model selected an identifier outside the candidate set"
        );
        return SelectionVerdict::OutOfRange {
            action_id: selection.action_id,
        };
    };

    // Input text binds only to input-capable kinds; supplied input on other
    // kinds is ignored rather than treated as an error.
    let input = if candidate.kind.is_input_capable() {
        Some(selection.input.unwrap_or_default())
    } else {
        None
    };

    SelectionVerdict::Selected(ResolvedAction::from_candidate(candidate, input))
}
