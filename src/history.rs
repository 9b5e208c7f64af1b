//! Bounded window of recently executed actions.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of summaries of the last N executed actions.
///
/// Rendered into the prompt so the model can see what it already tried and
/// is discouraged from repeating itself. Only successfully selected and
/// dispatched actions are recorded; failed or unparseable turns never enter
/// the window, so the model is never shown phantom history.
#[derive(Debug)]
pub struct ActionHistoryWindow {
    entries: VecDeque<String>,
    capacity: usize,
}

impl ActionHistoryWindow {
    /// Create a window holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record the most recent action summary, evicting the oldest entry
    /// when the window is full.
    pub fn push(&mut self, entry: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    /// Deterministic text block for the prompt, or an empty string when no
    /// actions have been recorded yet.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let joined = self
            .entries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!("Previously executed: {}. ", joined)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_never_exceeds_capacity() {
        let mut window = ActionHistoryWindow::new(3);
        for i in 0..10 {
            window.push(format!("entry {i}"));
            assert!(window.len() <= 3);
        }
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_order() {
        let mut window = ActionHistoryWindow::new(5);
        for i in 0..6 {
            window.push(format!("entry {i}"));
        }
        let entries: Vec<&str> = window.iter().collect();
        assert_eq!(
            entries,
            vec!["entry 1", "entry 2", "entry 3", "entry 4", "entry 5"]
        );
    }

    #[test]
    fn render_is_empty_without_entries() {
        let window = ActionHistoryWindow::new(5);
        assert_eq!(window.render(), "");
    }

    #[test]
    fn render_lists_entries_in_insertion_order() {
        let mut window = ActionHistoryWindow::new(5);
        window.push("Click on 'Login button'");
        window.push("Type 'john' into 'Username'");
        assert_eq!(
            window.render(),
            "Previously executed: Click on 'Login button', Type 'john' into 'Username'. "
        );
    }
}
