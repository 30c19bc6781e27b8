use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("score must be between 0 and 100, got {0}")]
    OutOfRange(u32),
}

/// A quiz percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Score(u8);

impl Score {
    pub const ZERO: Score = Score(0);
    pub const PERFECT: Score = Score(100);

    /// Creates a score from a percentage.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` for values above 100.
    pub fn new(percent: u32) -> Result<Self, ScoreError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(ScoreError::OutOfRange(percent))
    }

    /// Percentage of `correct` out of `total`, rounded to the nearest integer
    /// with halves rounding up. An empty total scores zero.
    #[must_use]
    pub fn from_ratio(correct: usize, total: usize) -> Self {
        if total == 0 {
            return Self::ZERO;
        }
        let correct = correct.min(total);
        let rounded = (200 * correct + total) / (2 * total);
        // correct <= total keeps this within 0..=100
        Self(u8::try_from(rounded).unwrap_or(100))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Score {
    type Error = ScoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u32 {
    fn from(score: Score) -> Self {
        u32::from(score.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_above_hundred() {
        assert_eq!(Score::new(101).unwrap_err(), ScoreError::OutOfRange(101));
        assert_eq!(Score::new(100).unwrap(), Score::PERFECT);
        assert_eq!(Score::new(0).unwrap(), Score::ZERO);
    }

    #[test]
    fn ratio_rounds_to_nearest() {
        assert_eq!(Score::from_ratio(2, 3).value(), 67);
        assert_eq!(Score::from_ratio(1, 3).value(), 33);
        assert_eq!(Score::from_ratio(1, 8).value(), 13);
        assert_eq!(Score::from_ratio(3, 3).value(), 100);
        assert_eq!(Score::from_ratio(0, 5).value(), 0);
    }

    #[test]
    fn ratio_with_empty_total_is_zero() {
        assert_eq!(Score::from_ratio(0, 0), Score::ZERO);
    }

    #[test]
    fn displays_as_percentage() {
        assert_eq!(Score::from_ratio(1, 2).to_string(), "50%");
    }
}
