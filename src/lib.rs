//! LLM-driven action selection for automated GUI testing.
//!
//! At each step of a test run the selector renders the current candidate
//! actions into a natural-language prompt, sends the rolling conversation to
//! an OpenAI-compatible chat-completion endpoint, classifies the reply, and
//! hands the test-execution loop exactly one of: an action to dispatch, a
//! terminate signal, or a harmless no-op when the exchange failed and was
//! recovered locally.

pub mod action;
pub mod classifier;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod history;
pub mod prompt;
pub mod selector;
pub mod transport;

pub use action::{ActionKind, CandidateAction, InputField, ResolvedAction, Selection};
pub use classifier::{classify, SelectionVerdict};
pub use config::SelectorConfig;
pub use conversation::{ConversationMessage, ConversationStore, Role};
pub use errors::SelectorError;
pub use history::ActionHistoryWindow;
pub use prompt::{PromptBuilder, PromptDiagnostic, RenderedPrompt};
pub use selector::ActionSelector;
pub use transport::{LlmTransport, Platform, RawModelReply, TransportError};
