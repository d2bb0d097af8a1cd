//! Run memory
//!
//! Short-term memory is the current run's turn-by-turn scratchpad, bounded by
//! a token budget. Long-term memory is an optional cross-run store behind the
//! [`MemoryStore`] trait.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod store;

pub use store::{KeywordStore, MemoryError, MemoryStore};

/// Default token budget for short-term memory
pub const DEFAULT_TOKEN_BUDGET: usize = 4000;

/// A single turn in short-term memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role: user, assistant, system
    pub role: String,
    /// Turn content
    pub content: String,
    /// Timestamp
    pub timestamp: DateTime<Local>,
}

/// Estimates the token cost of a piece of text.
///
/// The reference tokenizer is an external service; the default implementation
/// is a character heuristic, which is enough to keep the buffer bounded.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Roughly four characters per token.
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Bounded scratchpad of thoughts and observations for one run.
///
/// Seeded with one synthetic turn so the buffer is never empty; eviction
/// drops the oldest non-seed turns first and always preserves the seed.
pub struct ShortTermMemory {
    turns: Vec<Turn>,
    token_budget: usize,
    counter: Box<dyn TokenCounter>,
}

impl ShortTermMemory {
    /// Create with the default heuristic counter.
    pub fn new(token_budget: usize) -> Self {
        Self::with_counter(token_budget, Box::new(HeuristicCounter))
    }

    /// Create with a specific token counter.
    pub fn with_counter(token_budget: usize, counter: Box<dyn TokenCounter>) -> Self {
        let seed = Turn {
            role: "system".to_string(),
            content: "session opened".to_string(),
            timestamp: Local::now(),
        };
        Self {
            turns: vec![seed],
            token_budget,
            counter,
        }
    }

    /// Append a turn, evicting oldest non-seed turns if over budget.
    pub fn push(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.turns.push(Turn {
            role: role.into(),
            content: content.into(),
            timestamp: Local::now(),
        });
        self.enforce_budget();
    }

    /// Append one completed reasoning step: the model's response and the
    /// observation it produced.
    pub fn record_step(&mut self, response: &str, observation: &str) {
        self.push("assistant", response);
        self.push("user", observation);
    }

    fn enforce_budget(&mut self) {
        while self.token_count() > self.token_budget && self.turns.len() > 1 {
            let dropped = self.turns.remove(1);
            debug!(
                "evicted {} turn of {} chars",
                dropped.role,
                dropped.content.len()
            );
        }
    }

    /// Current token cost of all turns.
    pub fn token_count(&self) -> usize {
        self.turns.iter().map(|t| self.counter.count(&t.content)).sum()
    }

    /// Render the scratchpad for prompt injection: every turn after the seed,
    /// chronological, newline-separated. The seed itself is excluded.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .skip(1)
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of turns, seed included.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when only the seed turn is present.
    pub fn is_empty(&self) -> bool {
        self.turns.len() <= 1
    }

    /// All turns, seed first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}
