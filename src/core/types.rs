use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ProjectionError;

/// A calendar month with no day component.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ProjectionError> {
        if !(1..=12).contains(&month) {
            return Err(ProjectionError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The current month on the local clock.
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn is_january(self) -> bool {
        self.month == 1
    }

    pub fn is_december(self) -> bool {
        self.month == 12
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn add_months(self, months: u32) -> Self {
        let index = self.ordinal() + i64::from(months);
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: Self) -> i64 {
        other.ordinal() - self.ordinal()
    }

    /// Every month from `self` through `last` inclusive. Empty when `last < self`.
    pub fn through(self, last: Self) -> impl Iterator<Item = YearMonth> {
        std::iter::successors(Some(self), |period| Some(period.succ()))
            .take_while(move |period| *period <= last)
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProjectionError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Engine inputs. Rates are fractions, not percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    pub starting_balance: Decimal,
    pub base_monthly_contribution: Decimal,
    pub annual_contribution_growth_rate: Decimal,
    pub annual_return_rate: Decimal,
    pub extra_contribution_multiplier: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub period: YearMonth,
    pub balance: Decimal,
    pub contribution: Decimal,
    pub interest_earned: Decimal,
    pub cumulative_contribution: Decimal,
}
