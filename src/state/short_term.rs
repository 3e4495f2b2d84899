//! Bounded short-term turn log with FIFO eviction
//!
//! Holds the most recent conversational turns as `"Role: text"` lines.
//! When the log is full, the oldest line is evicted to make room.

use std::collections::VecDeque;
use std::fmt;

/// Default number of turns kept in the short-term log.
pub const DEFAULT_CAPACITY: usize = 10;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The human participant
    User,
    /// The assistant
    Ai,
}

impl Speaker {
    /// Prefix used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Ai => "AI",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A capacity-limited, insertion-ordered log of conversational turns.
#[derive(Debug, Clone)]
pub struct ShortTermLog {
    /// front = oldest, back = newest
    lines: VecDeque<String>,
    capacity: usize,
}

impl ShortTermLog {
    /// Create a log holding at most `capacity` turns (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn, returning the evicted line if the log was full.
    pub fn push(&mut self, speaker: Speaker, text: &str) -> Option<String> {
        let evicted = if self.lines.len() >= self.capacity {
            self.lines.pop_front()
        } else {
            None
        };
        self.lines.push_back(format!("{}: {}", speaker, text));
        evicted
    }

    /// The last `n` lines, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    /// All lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for ShortTermLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_formats_role() {
        let mut log = ShortTermLog::default();
        log.push(Speaker::User, "hello");
        log.push(Speaker::Ai, "Hi there!");
        assert_eq!(log.lines(), vec!["User: hello", "AI: Hi there!"]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut log = ShortTermLog::new(10);
        for i in 0..25 {
            log.push(Speaker::User, &format!("turn {}", i));
            assert!(log.len() <= 10);
        }
        assert_eq!(log.len(), 10);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut log = ShortTermLog::new(3);
        assert!(log.push(Speaker::User, "a").is_none());
        assert!(log.push(Speaker::User, "b").is_none());
        assert!(log.push(Speaker::User, "c").is_none());

        let evicted = log.push(Speaker::Ai, "d");
        assert_eq!(evicted.as_deref(), Some("User: a"));
        assert_eq!(log.lines(), vec!["User: b", "User: c", "AI: d"]);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = ShortTermLog::new(10);
        for i in 0..8 {
            log.push(Speaker::User, &i.to_string());
        }
        assert_eq!(
            log.recent(5),
            vec!["User: 3", "User: 4", "User: 5", "User: 6", "User: 7"]
        );
        assert_eq!(log.recent(20).len(), 8);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = ShortTermLog::new(0);
        log.push(Speaker::User, "x");
        log.push(Speaker::User, "y");
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.lines(), vec!["User: y"]);
    }

    #[test]
    fn test_clear() {
        let mut log = ShortTermLog::default();
        log.push(Speaker::User, "x");
        log.clear();
        assert!(log.is_empty());
    }
}
