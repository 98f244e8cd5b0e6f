use std::{fmt, ops::Sub};

use serde::{Deserialize, Serialize};

/// Signed money amount represented as **integer minor units** (paise, cents).
///
/// Use this type for **all** monetary values in the engine (budgets,
/// allocations, transaction amounts, prices) to avoid floating-point drift.
/// Only derived percentages are computed in floating point.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Share of `self` over `base` as a percentage.
    ///
    /// Returns `None` when `base` is not strictly positive, so callers never
    /// divide by zero.
    #[must_use]
    pub fn percent_of(self, base: Money) -> Option<f64> {
        if base.0 <= 0 {
            return None;
        }
        Some((self.0 as f64 * 100.0) / base.0 as f64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / 100;
        let minor = abs % 100;
        write!(f, "{sign}{major}.{minor:02}")
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(500000).to_string(), "5000.00");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn checked_add_reports_overflow() {
        assert_eq!(Money::new(150).checked_add(Money::new(50)), Some(Money::new(200)));
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
    }

    #[test]
    fn percent_of_guards_zero_base() {
        assert_eq!(Money::new(230000).percent_of(Money::new(500000)), Some(46.0));
        assert_eq!(Money::new(150000).percent_of(Money::new(200000)), Some(75.0));
        assert_eq!(Money::new(100).percent_of(Money::ZERO), None);
    }
}
