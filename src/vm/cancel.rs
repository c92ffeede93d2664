//! Cooperative cancellation.
//!
//! The engine polls a [`CancelToken`] before each instruction. Whoever holds a
//! clone (a signal watcher, a test, another thread) can request a stop.
//!
//! An instruction boundary never arrives while the engine sits in a blocking
//! input read, so the token also records when that is the case. A watcher
//! that sees the flag knows the stop can't be observed in-band and has to end
//! the run itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    reading: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop at the next instruction boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// True while the engine is blocked reading input.
    pub fn is_reading_input(&self) -> bool {
        self.reading.load(Ordering::SeqCst)
    }

    /// Mark the start of a blocking input read. The mark is cleared when the
    /// guard drops.
    pub fn reading_input(&self) -> InputRead<'_> {
        self.reading.store(true, Ordering::SeqCst);
        InputRead { token: self }
    }
}

/// Held for the duration of a blocking input read.
#[must_use]
pub struct InputRead<'a> {
    token: &'a CancelToken,
}

impl Drop for InputRead<'_> {
    fn drop(&mut self) {
        self.token.reading.store(false, Ordering::SeqCst);
    }
}
