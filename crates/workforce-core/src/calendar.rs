//! Month-granular calendar used by the monthly engine.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Calendar errors.
#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    /// Month outside 1..=12.
    #[error("month {0} is out of range [1, 12]")]
    InvalidMonth(u32),
    /// Year outside the supported planning range.
    #[error("year {0} is out of supported range [1970, 2200]")]
    YearOutOfRange(i32),
    /// Text is not a `YYYY-MM` value.
    #[error("cannot parse {0:?} as YYYY-MM")]
    Parse(String),
}

/// A calendar month, e.g. `2025-03`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Construct a validated year/month.
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth(month));
        }
        if !(1970..=2200).contains(&year) {
            return Err(CalendarError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month, 1..=12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    /// Shift by `delta` months (negative moves backwards).
    pub fn add_months(&self, delta: i32) -> Self {
        let index = self.index() + delta;
        Self {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    /// `months` before `self`; `None` when that leaves the supported year range.
    pub fn checked_sub_months(&self, months: u32) -> Option<Self> {
        let delta = i32::try_from(months).ok()?;
        let index = self.index().checked_sub(delta)?;
        Self::new(index.div_euclid(12), (index.rem_euclid(12) + 1) as u32).ok()
    }

    /// Signed number of whole months from `self` to `later`.
    pub fn months_until(&self, later: YearMonth) -> i32 {
        later.index() - self.index()
    }

    /// Every month from `self` to `end`, inclusive. Empty when `end < self`.
    pub fn iter_to(self, end: YearMonth) -> impl Iterator<Item = YearMonth> {
        let first = (self <= end).then_some(self);
        std::iter::successors(first, move |m| {
            let n = m.next();
            (n <= end).then_some(n)
        })
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// True for December, the last month of a reporting year.
    pub fn closes_year(&self) -> bool {
        self.month == 12
    }

    fn index(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|_| CalendarError::Parse(s.to_string()))?;
        Self::new(date.year(), date.month())
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn rejects_bad_months() {
        assert_eq!(YearMonth::new(2025, 0), Err(CalendarError::InvalidMonth(0)));
        assert_eq!(YearMonth::new(2025, 13), Err(CalendarError::InvalidMonth(13)));
        assert!(YearMonth::new(1900, 1).is_err());
    }

    #[test]
    fn checked_sub_stays_in_range() {
        assert_eq!(ym(2025, 3).checked_sub_months(14), Some(ym(2024, 1)));
        assert_eq!(ym(2025, 3).checked_sub_months(0), Some(ym(2025, 3)));
        assert_eq!(ym(1971, 1).checked_sub_months(12), Some(ym(1970, 1)));
        assert_eq!(ym(1971, 1).checked_sub_months(13), None);
        assert_eq!(ym(2025, 1).checked_sub_months(u32::MAX), None);
    }

    #[test]
    fn next_rolls_over_year() {
        assert_eq!(ym(2025, 12).next(), ym(2026, 1));
        assert_eq!(ym(2025, 1).add_months(-1), ym(2024, 12));
        assert_eq!(ym(2025, 6).add_months(-18), ym(2023, 12));
    }

    #[test]
    fn months_until_counts_whole_months() {
        assert_eq!(ym(2024, 11).months_until(ym(2025, 2)), 3);
        assert_eq!(ym(2025, 2).months_until(ym(2024, 11)), -3);
    }

    #[test]
    fn iter_is_inclusive() {
        let months: Vec<_> = ym(2025, 11).iter_to(ym(2026, 2)).collect();
        assert_eq!(months, vec![ym(2025, 11), ym(2025, 12), ym(2026, 1), ym(2026, 2)]);
        assert_eq!(ym(2026, 1).iter_to(ym(2025, 1)).count(), 0);
    }

    #[test]
    fn text_roundtrip() {
        let m: YearMonth = "2025-03".parse().unwrap();
        assert_eq!(m, ym(2025, 3));
        assert_eq!(m.to_string(), "2025-03");
        assert_eq!(m.first_day(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert!("2025-3x".parse::<YearMonth>().is_err());
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "\"2025-03\"");
    }

    proptest! {
        #[test]
        fn add_then_measure(y in 1990i32..2100, m in 1u32..=12, delta in -240i32..240) {
            let start = ym(y, m);
            let moved = start.add_months(delta);
            prop_assert!((1..=12).contains(&moved.month()));
            prop_assert_eq!(start.months_until(moved), delta);
        }
    }
}
