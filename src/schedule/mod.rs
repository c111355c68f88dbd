pub mod calendar;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{AgreementError, Result};
use crate::state::Fee;

pub use calendar::add_months;

/// one row of a derived installment schedule, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledInstallment {
    pub installment_number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// sum of remaining balances over the selected fees.
/// pending fees count at full amount, partially paid fees at their balance.
/// zero for an empty selection, order-independent.
pub fn total_debt<'a, I>(fees: I) -> Money
where
    I: IntoIterator<Item = &'a Fee>,
{
    fees.into_iter().map(|fee| fee.remaining_amount()).sum()
}

/// ceil(total_debt / monthly_amount), or None when the monthly amount is
/// not positive. callers must treat None as "not computable", never as zero.
pub fn installment_count(total_debt: Money, monthly_amount: Money) -> Option<u32> {
    if !monthly_amount.is_positive() {
        return None;
    }
    let count = (total_debt.as_decimal() / monthly_amount.as_decimal()).ceil();
    count.to_u32()
}

/// preconditions shared by agreement creation and schedule regeneration
pub fn validate_terms(total_debt: Money, monthly_amount: Money) -> Result<()> {
    if !monthly_amount.is_positive() {
        return Err(AgreementError::NonPositiveMonthlyAmount {
            amount: monthly_amount,
        });
    }

    if monthly_amount > total_debt {
        return Err(AgreementError::MonthlyAmountExceedsDebt {
            monthly_amount,
            total_debt,
        });
    }

    Ok(())
}

/// derive the full installment schedule for a debt.
///
/// installments 1..count-1 carry exactly the monthly amount; the final
/// installment absorbs the remainder so the sum equals the debt to the cent.
/// due dates advance by calendar months from the start date, with day-of-month
/// clamping in shorter months. numbering starts at `first_number` so a
/// regenerated tail can continue an existing agreement's sequence.
pub fn build_schedule(
    total_debt: Money,
    monthly_amount: Money,
    start_date: NaiveDate,
    first_number: u32,
) -> Result<Vec<ScheduledInstallment>> {
    if !total_debt.is_positive() {
        return Err(AgreementError::EmptyFeeSelection);
    }
    validate_terms(total_debt, monthly_amount)?;

    let count = installment_count(total_debt, monthly_amount).ok_or(
        AgreementError::NonPositiveMonthlyAmount {
            amount: monthly_amount,
        },
    )?;

    let mut installments = Vec::with_capacity(count as usize);
    for n in 0..count {
        let due_date =
            add_months(start_date, n).ok_or_else(|| AgreementError::InvalidDate {
                message: format!("cannot advance {} months from {}", n, start_date),
            })?;

        let amount = if n + 1 == count {
            total_debt - monthly_amount * Decimal::from(count - 1)
        } else {
            monthly_amount
        };

        installments.push(ScheduledInstallment {
            installment_number: first_number + n,
            amount,
            due_date,
        });
    }

    Ok(installments)
}
