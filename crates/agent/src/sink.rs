//! Output sink
//!
//! Presentation is a caller concern, injected as a capability rather than
//! process-wide console state. The loop reports progress here; the sink
//! decides what, if anything, reaches the user.

use std::io::Write;

/// Receives intermediate run output.
pub trait OutputSink: Send + Sync {
    /// A new reasoning round is starting (1-based).
    fn round(&self, _index: usize) {}

    /// One chunk of the model's streamed thought.
    fn thought(&self, _chunk: &str) {}

    /// The observation produced by the last action.
    fn observation(&self, _text: &str) {}
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {}

/// Prints to stdout, flushing thought chunks as they arrive.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn round(&self, index: usize) {
        println!("\n>>>> Round {} <<<<", index);
    }

    fn thought(&self, chunk: &str) {
        print!("{}", chunk);
        std::io::stdout().flush().ok();
    }

    fn observation(&self, text: &str) {
        println!("\n----\n{}", text);
    }
}
