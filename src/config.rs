//! Configuration for the LLM action selector.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::SelectorError;
use crate::transport::Platform;

/// Configuration for one [`crate::selector::ActionSelector`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Endpoint host including scheme, e.g. `http://127.0.0.1`. May embed
    /// `%NAME%` credential placeholders substituted from the environment.
    pub host: String,

    /// Endpoint port.
    pub port: u16,

    /// Wire-schema variant of the endpoint.
    pub platform: Platform,

    /// Objective of the test, e.g. "Log in with username john and password demo".
    pub test_goal: String,

    /// Display name of the application under test.
    pub app_name: String,

    /// Few-shot priming script (JSON array of `{role, content}` objects).
    /// A missing or unreadable script degrades quality but is not fatal.
    pub fewshot_path: Option<PathBuf>,

    /// Capacity of the executed-action history window.
    /// Default: 5
    pub history_size: usize,

    /// Connect timeout for the HTTP request in milliseconds.
    /// Default: 10000
    pub connect_timeout_ms: u64,

    /// Cap on the live conversation suffix (the few-shot prefix is always
    /// kept). `None` leaves growth unbounded.
    pub live_window: Option<usize>,

    /// Consecutive recoverable failures (malformed, out-of-range, transport)
    /// tolerated before the run is terminated. `None` retries forever.
    pub max_recovery_attempts: Option<u32>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1".to_string(),
            port: 1234,
            platform: Platform::OpenAi,
            test_goal: String::new(),
            app_name: String::new(),
            fewshot_path: None,
            history_size: 5,
            connect_timeout_ms: 10_000,
            live_window: None,
            max_recovery_attempts: None,
        }
    }
}

impl SelectorConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Builder: set the test objective.
    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.test_goal = goal.into();
        self
    }

    /// Builder: set the application display name.
    pub fn app(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Builder: set the wire-schema platform.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Builder: set the few-shot priming script path.
    pub fn fewshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.fewshot_path = Some(path.into());
        self
    }

    /// Builder: set the history window capacity.
    pub fn history(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Builder: cap the live conversation suffix.
    pub fn live_window(mut self, messages: usize) -> Self {
        self.live_window = Some(messages);
        self
    }

    /// Builder: bound consecutive recovery attempts.
    pub fn recovery_limit(mut self, attempts: u32) -> Self {
        self.max_recovery_attempts = Some(attempts);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Caller-side contract checks; failing here is the one unrecoverable
    /// condition at this layer.
    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.host.trim().is_empty() {
            return Err(SelectorError::config("endpoint host must not be empty"));
        }
        if self.port == 0 {
            return Err(SelectorError::config("endpoint port must not be zero"));
        }
        if self.history_size == 0 {
            return Err(SelectorError::config(
                "history window capacity must be at least 1",
            ));
        }
        Ok(())
    }
}
