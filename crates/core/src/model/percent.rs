use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-number progress value, always within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressPercent(u8);

impl ProgressPercent {
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Clamp an arbitrary value into `0..=100`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(0, 100);
        Self(u8::try_from(clamped).unwrap_or(100))
    }

    /// Floor of `part / whole * 100`, clamped. A zero `whole` counts as complete.
    #[must_use]
    pub fn from_ratio(part: u64, whole: u64) -> Self {
        if whole == 0 {
            return Self::FULL;
        }
        let scaled = u128::from(part) * 100 / u128::from(whole);
        Self::clamped(i64::try_from(scaled).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_full(self) -> bool {
        self.0 >= 100
    }
}

impl fmt::Display for ProgressPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
