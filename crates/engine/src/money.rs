use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::EngineError;

/// Deposit value of a unit, in **integer euro cents**.
///
/// Unit values come from configuration as decimal text (`"7.50"`, `"7,50"`)
/// or plain numbers and are converted once, at load time, so no
/// floating-point value ever reaches a total.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let value: MoneyCents = "7,50".parse().unwrap();
/// assert_eq!(value.cents(), 750);
/// assert_eq!(value.to_string(), "€ 7,50");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Checked multiplication by a unit count (returns `None` on overflow).
    #[must_use]
    pub fn checked_times(self, count: i64) -> Option<MoneyCents> {
        self.0.checked_mul(count).map(MoneyCents)
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }
}

/// Dutch notation: `€ 7,50`, `-€ 2,00`.
impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}€ {},{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a non-negative decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and at most two fractional
    /// digits. A deposit is never negative, so a sign is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidValue(format!("invalid amount: {s:?}"));

        let normalized = s.trim().replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let euros: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        euros
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(MoneyCents)
            .ok_or_else(invalid)
    }
}

impl<'de> Deserialize<'de> for MoneyCents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Whole(u32),
            Fractional(f64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Whole(value) => value.to_string(),
            // `f64` formats to its shortest round-trip text, so 4.26 stays "4.26".
            Raw::Fractional(value) => value.to_string(),
            Raw::Text(value) => value,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_dutch_notation() {
        assert_eq!(MoneyCents::new(0).to_string(), "€ 0,00");
        assert_eq!(MoneyCents::new(10).to_string(), "€ 0,10");
        assert_eq!(MoneyCents::new(750).to_string(), "€ 7,50");
        assert_eq!(MoneyCents::new(12_000).to_string(), "€ 120,00");
        assert_eq!(MoneyCents::new(-200).to_string(), "-€ 2,00");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("7".parse::<MoneyCents>().unwrap().cents(), 700);
        assert_eq!("7.5".parse::<MoneyCents>().unwrap().cents(), 750);
        assert_eq!("4,26".parse::<MoneyCents>().unwrap().cents(), 426);
        assert_eq!(" 0.10 ".parse::<MoneyCents>().unwrap().cents(), 10);
    }

    #[test]
    fn parse_rejects_signs_and_extra_decimals() {
        assert!("-1".parse::<MoneyCents>().is_err());
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("".parse::<MoneyCents>().is_err());
        assert!("1.2.3".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(MoneyCents::new(750).checked_times(3), Some(MoneyCents::new(2250)));
        assert_eq!(MoneyCents::new(750).checked_times(-2), Some(MoneyCents::new(-1500)));
        assert_eq!(
            MoneyCents::new(1).checked_times(i64::MAX),
            Some(MoneyCents::new(i64::MAX))
        );
        assert_eq!(MoneyCents::new(2).checked_times(i64::MAX), None);

        let max = MoneyCents::new(i64::MAX);
        assert_eq!(
            max.checked_add(MoneyCents::new(-1)),
            Some(MoneyCents::new(i64::MAX - 1))
        );
        assert_eq!(max.checked_add(MoneyCents::new(1)), None);
    }
}
