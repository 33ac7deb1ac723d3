use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::error::ProjectionError;
use super::types::{Inputs, MonthlyRecord, YearMonth};

const CURRENCY_DP: u32 = 2;

/// Monthly rate `m` such that `(1 + m)^12 == 1 + annual_rate`.
pub fn monthly_rate(annual_rate: Decimal) -> Result<Decimal, ProjectionError> {
    let annual = annual_rate
        .to_f64()
        .ok_or(ProjectionError::InvalidRate(annual_rate))?;
    let monthly = (1.0 + annual).powf(1.0 / 12.0) - 1.0;
    if !monthly.is_finite() {
        return Err(ProjectionError::InvalidRate(annual_rate));
    }
    Decimal::from_f64(monthly).ok_or(ProjectionError::InvalidRate(annual_rate))
}

/// Projects from the current local month through `target`.
pub fn project(
    inputs: &Inputs,
    target: YearMonth,
) -> Result<Vec<MonthlyRecord>, ProjectionError> {
    project_from(inputs, YearMonth::current(), target)
}

pub fn project_from(
    inputs: &Inputs,
    start: YearMonth,
    target: YearMonth,
) -> Result<Vec<MonthlyRecord>, ProjectionError> {
    if target < start {
        return Err(ProjectionError::InvalidRange { start, target });
    }
    let rate = monthly_rate(inputs.annual_return_rate)?;
    let overflow = ProjectionError::Overflow { period: start };
    let growth = Decimal::ONE
        .checked_add(inputs.annual_contribution_growth_rate)
        .ok_or(overflow.clone())?;
    let december_factor = Decimal::ONE
        .checked_add(inputs.extra_contribution_multiplier)
        .ok_or(overflow)?;

    let len = usize::try_from(start.months_until(target) + 1).unwrap_or_default();
    let mut records = Vec::with_capacity(len);
    let mut balance = inputs.starting_balance;
    let mut monthly_contribution = inputs.base_monthly_contribution;
    let mut cumulative_contribution = Decimal::ZERO;

    for (index, period) in start.through(target).enumerate() {
        let overflow = || ProjectionError::Overflow { period };

        let interest = balance
            .checked_mul(rate)
            .ok_or_else(overflow)?
            .round_dp(CURRENCY_DP);

        let contribution = if index == 0 {
            Decimal::ZERO
        } else if period.is_december() {
            monthly_contribution
                .checked_mul(december_factor)
                .ok_or_else(overflow)?
        } else {
            monthly_contribution
        }
        .round_dp(CURRENCY_DP);

        balance = balance
            .checked_add(interest)
            .and_then(|b| b.checked_add(contribution))
            .ok_or_else(overflow)?
            .round_dp(CURRENCY_DP);
        cumulative_contribution = cumulative_contribution
            .checked_add(contribution)
            .ok_or_else(overflow)?;

        // January's own contribution uses the old amount; the raise applies from February.
        if index > 0 && period.is_january() {
            monthly_contribution = monthly_contribution
                .checked_mul(growth)
                .ok_or_else(overflow)?;
        }

        records.push(MonthlyRecord {
            period,
            balance,
            contribution,
            interest_earned: interest,
            cumulative_contribution,
        });
    }

    Ok(records)
}
