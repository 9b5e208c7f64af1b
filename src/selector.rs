//! Orchestration of one LLM-backed selection step.

use tracing::{debug, error, info, warn};

use crate::action::{CandidateAction, Selection};
use crate::classifier::{classify, SelectionVerdict};
use crate::config::SelectorConfig;
use crate::conversation::{ConversationStore, Role};
use crate::errors::SelectorError;
use crate::history::ActionHistoryWindow;
use crate::prompt::PromptBuilder;
use crate::transport::LlmTransport;

/// Corrective message restating the required reply shape after a reply the
/// classifier could not decode.
const MALFORMED_FORMAT_HINT: &str = "The output you provided was not formatted correctly. \
Please use the following format:\n\n{\n\"actionId\": \"ACT0K4\",\n\"input\": \"Text\"\n}";

/// Selects one interface action per test step by consulting the model.
///
/// The selector is inherently sequential: each prompt depends on the
/// accumulated conversation, which is mutated in place. One instance per
/// execution stream; the store and history are not safe for concurrent
/// mutation and no locking is provided.
pub struct ActionSelector {
    prompt: PromptBuilder,
    conversation: ConversationStore,
    history: ActionHistoryWindow,
    transport: LlmTransport,
    max_recovery_attempts: Option<u32>,
    consecutive_failures: u32,
    tokens_used: u64,
}

impl ActionSelector {
    /// Build a selector from validated configuration.
    ///
    /// Fails fast on caller-side contract violations (empty host, zero
    /// port, zero history capacity); nothing after construction returns an
    /// error.
    pub fn new(config: SelectorConfig) -> Result<Self, SelectorError> {
        config.validate()?;

        let transport = LlmTransport::new(
            &config.host,
            config.port,
            config.platform,
            config.connect_timeout(),
        )?;

        let conversation = match &config.fewshot_path {
            Some(path) => ConversationStore::primed(path, config.live_window),
            None => {
                warn!(
                    target: "selector",
                    "no few-shot priming script configured; selection quality may suffer"
                );
                ConversationStore::new(config.live_window)
            }
        };

        Ok(Self {
            prompt: PromptBuilder::new(config.test_goal, config.app_name),
            conversation,
            history: ActionHistoryWindow::new(config.history_size),
            transport,
            max_recovery_attempts: config.max_recovery_attempts,
            consecutive_failures: 0,
            tokens_used: 0,
        })
    }

    /// Select an action for the current step from `candidates`.
    ///
    /// The prompt is generated, sent to the model, and the reply is
    /// classified. Recoverable failures yield [`Selection::NoOp`] so the
    /// test run stays alive; a transport failure additionally rolls the
    /// just-appended prompt back so it cannot poison later turns.
    pub fn select(&mut self, candidates: &[CandidateAction]) -> Selection {
        let rendered = self.prompt.build(candidates, &self.history.render());
        if !rendered.skipped.is_empty() {
            debug!(
                target: "selector",
                skipped = rendered.skipped.len(),
                "some candidates were not offered to the model"
            );
        }
        debug!(target: "selector", prompt = %rendered.text, "generated prompt");
        self.conversation.append(Role::User, rendered.text);

        let reply = match self.transport.send(self.conversation.snapshot()) {
            Ok(reply) => reply,
            Err(cause) => {
                error!(target: "selector", %cause, "unable to communicate with the LLM");
                self.conversation.drop_last();
                return self.recovering_no_op();
            }
        };
        self.tokens_used = self.tokens_used.saturating_add(reply.total_tokens);
        debug!(target: "selector", reply = %reply.content, "model reply");

        match classify(&reply.content, candidates) {
            SelectionVerdict::Selected(resolved) => {
                info!(target: "selector", action_id = %resolved.id, "selected action");
                self.conversation.append(Role::Assistant, reply.content);
                self.history.push(resolved.summary());
                self.consecutive_failures = 0;
                Selection::Execute(resolved)
            }
            SelectionVerdict::Finished => {
                info!(target: "selector", "model reports the test objective accomplished");
                Selection::Terminate
            }
            SelectionVerdict::OutOfRange { action_id } => {
                self.conversation.append(
                    Role::User,
                    format!("The actionId '{action_id}' provided was invalid."),
                );
                self.recovering_no_op()
            }
            SelectionVerdict::Malformed => {
                self.conversation
                    .append(Role::User, MALFORMED_FORMAT_HINT);
                self.recovering_no_op()
            }
        }
    }

    /// Conversation log, exposed read-only for callers and tests.
    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    /// Executed-action history window.
    pub fn history(&self) -> &ActionHistoryWindow {
        &self.history
    }

    /// Cumulative usage tokens reported by the endpoint.
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    fn recovering_no_op(&mut self) -> Selection {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if let Some(limit) = self.max_recovery_attempts {
            if self.consecutive_failures > limit {
                error!(
                    target: "selector",
                    failures = self.consecutive_failures,
                    limit,
                    "consecutive recovery attempts exhausted; terminating run"
                );
                return Selection::Terminate;
            }
        }
        Selection::NoOp
    }
}
