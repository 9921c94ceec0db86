use crate::error::{Result, StackHammerError};
use std::time::Instant;

/// Wall-clock budget for one extraction.
///
/// Checked cooperatively between pipeline stages and while fingerprinting, so
/// an oversized input fails with [`StackHammerError::TimedOut`] instead of
/// running unbounded.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget_ms: Option<u64>,
}

impl Deadline {
    /// Starts the clock now. `None` or `Some(0)` disables the budget.
    pub fn new(budget_ms: Option<u64>) -> Self {
        Self::starting_at(Instant::now(), budget_ms)
    }

    pub fn starting_at(start: Instant, budget_ms: Option<u64>) -> Self {
        Self {
            start,
            budget_ms: budget_ms.filter(|ms| *ms > 0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn check(&self) -> Result<()> {
        if let Some(budget_ms) = self.budget_ms {
            let elapsed_ms = self.elapsed_ms();
            if elapsed_ms > budget_ms {
                return Err(StackHammerError::TimedOut {
                    elapsed_ms,
                    budget_ms,
                });
            }
        }
        Ok(())
    }
}
