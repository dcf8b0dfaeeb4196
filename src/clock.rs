//! Simulation clock
//!
//! Time advances in fixed steps and nothing happens between them.

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    current: u64,
    step: u64,
    max_time: u64,
}

impl Clock {
    pub fn new(step: u64, max_time: u64) -> Self {
        Self {
            current: 0,
            step,
            max_time,
        }
    }

    pub fn now(&self) -> u64 {
        self.current
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn max_time(&self) -> u64 {
        self.max_time
    }

    /// Move to the next tick and return the new time.
    pub fn advance(&mut self) -> u64 {
        self.current += self.step;
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.max_time
    }

    /// Fraction of the run completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.max_time == 0 {
            return 1.0;
        }
        (self.current as f64 / self.max_time as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advances_in_fixed_steps() {
        let mut clock = Clock::new(10, 100);
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(), 10);
        assert_eq!(clock.advance(), 20);
        assert!(!clock.is_finished());
    }

    #[test]
    fn test_finishes_exactly_at_max_time() {
        let mut clock = Clock::new(10, 50);
        while !clock.is_finished() {
            clock.advance();
        }
        assert_eq!(clock.now(), 50);
        assert_eq!(clock.progress(), 1.0);
    }
}
