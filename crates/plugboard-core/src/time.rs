//! Logical time for the recompute cycle
//!
//! Signals stamp their values with a discrete [`Tick`]. One external driver
//! owns a [`Clock`], advances it once per control cycle, and pulls the
//! output signals at the new tick.

use serde::{Deserialize, Serialize};

/// A discrete logical timestamp
pub type Tick = u64;

/// Driver-side clock for the per-cycle recompute loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    tick: Tick,
}

impl Clock {
    /// Create a clock at tick zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current tick
    pub fn now(&self) -> Tick {
        self.tick
    }

    /// Advance to the next tick and return it
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = Clock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.now(), 2);
    }
}
