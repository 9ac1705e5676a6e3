//! Calendar month keys and the historical/future split around a base month.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::HistoricalPoint;
use crate::error::ForecastError;

/// A calendar month, written `YYYY-MM` on the wire.
///
/// Ordering is chronological (year first, then month).
/// Month index of `9999-12`.
const LAST_INDEX: i32 = 9999 * 12 + 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, ForecastError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(ForecastError::InvalidPeriodKey {
                value: format!("{year:04}-{month:02}"),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The month immediately after `self`, or `None` past `9999-12`.
    pub fn succ(self) -> Option<Self> {
        self.add_months(1)
    }

    /// Shift by `delta` months (negative goes back in time).
    ///
    /// `None` when the result leaves `0000-01..=9999-12`, the range that
    /// round-trips through `YYYY-MM`.
    pub fn add_months(self, delta: i32) -> Option<Self> {
        let index = self.index().checked_add(delta)?;
        if !(0..=LAST_INDEX).contains(&index) {
            return None;
        }
        Some(Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        })
    }

    /// Up to `count` months following `self`, in order. Stops early at the
    /// end of the representable calendar.
    pub fn following(self, count: usize) -> Vec<Self> {
        let remaining = (LAST_INDEX - self.index()) as usize;
        let mut out = Vec::with_capacity(count.min(remaining));
        let mut cur = self;
        while out.len() < count {
            let Some(next) = cur.succ() else {
                break;
            };
            out.push(next);
            cur = next;
        }
        out
    }

    fn index(self) -> i32 {
        self.year * 12 + (self.month as i32 - 1)
    }
}

impl FromStr for MonthKey {
    type Err = ForecastError;

    /// Strict `YYYY-MM`: exactly four year digits, a dash, two month digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ForecastError::InvalidPeriodKey {
            value: s.to_string(),
        };

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes[..4]
            .iter()
            .chain(&bytes[5..])
            .all(|b| b.is_ascii_digit());
        if !digits_ok {
            return Err(invalid());
        }

        let year: i32 = s[..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[5..].parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered series split around a base month.
///
/// Every `historical` period is strictly before every `future` period, and
/// `future.len() <= horizon`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodWindow {
    pub historical: Vec<(MonthKey, f64)>,
    pub future: Vec<MonthKey>,
}

impl PeriodWindow {
    /// Partition `points` around `base`.
    ///
    /// Input order does not matter; a period that appears twice keeps its last
    /// occurrence. Gaps (`None` or non-finite) are dropped from the historical
    /// side and never interpolated. Future periods are kept whether or not
    /// they carry a value.
    pub fn split(points: &[HistoricalPoint], base: MonthKey, horizon: usize) -> Self {
        let mut by_period: BTreeMap<MonthKey, Option<f64>> = BTreeMap::new();
        for p in points {
            by_period.insert(p.period, p.value);
        }

        let mut historical = Vec::new();
        let mut future = Vec::new();
        for (period, value) in by_period {
            if period <= base {
                if let Some(v) = value.filter(|v| v.is_finite()) {
                    historical.push((period, v));
                }
            } else if future.len() < horizon {
                future.push(period);
            }
        }

        Self { historical, future }
    }

    pub fn historical_values(&self) -> Vec<f64> {
        self.historical.iter().map(|(_, v)| *v).collect()
    }

    /// Error if fewer than `required` historical points survived the split.
    pub fn ensure_history(&self, required: usize) -> Result<(), ForecastError> {
        if self.historical.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                actual: self.historical.len(),
            });
        }
        Ok(())
    }
}
