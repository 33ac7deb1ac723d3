use rust_decimal::Decimal;
use thiserror::Error;

use super::types::YearMonth;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("target month {target} is before the start month {start}")]
    InvalidRange { start: YearMonth, target: YearMonth },

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("invalid period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("annual return rate {0} has no representable monthly equivalent")]
    InvalidRate(Decimal),

    #[error("projection exceeds the representable amount range at {period}")]
    Overflow { period: YearMonth },
}
