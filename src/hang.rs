//! Cooperative time-budget guard for host-side loops over very large
//! collections (unit decode, row rendering). Poll it once per iteration and
//! bail out on `Abort`, keeping whatever partial output exists.
//!
//! The clock is injected so tests can advance time deterministically.

use std::time::{Duration, Instant};

/// Wall-clock budget for one guarded operation.
pub const HANG_LIMIT: Duration = Duration::from_millis(500);

/// Iterations between time checks; keeps the fast path to a counter bump.
pub const HANG_RESOLUTION: u32 = 100;

/// Monotonic time source, measured from an arbitrary fixed epoch.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// `Instant`-backed clock used outside of tests.
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// What the guarded loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    Continue,
    /// Budget exceeded; stop now and keep the partial result.
    Abort,
}

struct OpState {
    name: String,
    start: Duration,
    counter: u32,
}

/// Tracks one operation at a time. Polling with a new name forgets the
/// previous operation, and an abort clears the state so the next poll with
/// any name starts fresh.
pub struct HangGuard {
    clock: Box<dyn Clock>,
    limit: Duration,
    op: Option<OpState>,
}

impl Default for HangGuard {
    fn default() -> Self {
        Self::new(HANG_LIMIT)
    }
}

impl HangGuard {
    pub fn new(limit: Duration) -> Self {
        Self::with_clock(limit, Box::new(MonotonicClock::default()))
    }

    pub fn with_clock(limit: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            limit,
            op: None,
        }
    }

    /// Begin or continue the operation `op`. Every `resolution` iterations
    /// the elapsed time is compared against the limit; exceeding it logs a
    /// warning and returns `Abort` once. A resolution of 0 checks the time
    /// on every iteration.
    pub fn poll(&mut self, op: &str, resolution: u32) -> Verdict {
        let resolution = resolution.max(1);
        match &mut self.op {
            Some(state) if state.name == op => {
                state.counter += 1;
                if state.counter % resolution == 0 {
                    let elapsed = self.clock.now() - state.start;
                    if elapsed > self.limit {
                        log::warn!(
                            "hang detected in '{op}' after {} iterations ({:?}), interrupting",
                            state.counter,
                            self.limit
                        );
                        self.op = None;
                        return Verdict::Abort;
                    }
                }
            }
            _ => {
                self.op = Some(OpState {
                    name: op.to_owned(),
                    start: self.clock.now(),
                    counter: 0,
                });
            }
        }
        Verdict::Continue
    }

    /// Forget the current operation, if any.
    pub fn reset(&mut self) {
        self.op = None;
    }
}
