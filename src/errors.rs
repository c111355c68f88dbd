use thiserror::Error;

use crate::decimal::Money;
use crate::types::{
    AgreementId, AgreementStatus, FeeId, FeeStatus, InstallmentId, InstallmentStatus, PropertyId,
};

#[derive(Error, Debug)]
pub enum AgreementError {
    #[error("empty fee selection: an agreement must cover at least one fee")]
    EmptyFeeSelection,

    #[error("monthly amount must be greater than 0: {amount}")]
    NonPositiveMonthlyAmount {
        amount: Money,
    },

    #[error("monthly amount exceeds total debt: monthly {monthly_amount}, debt {total_debt}")]
    MonthlyAmountExceedsDebt {
        monthly_amount: Money,
        total_debt: Money,
    },

    #[error("monthly amount below minimum: minimum {minimum}, provided {provided}")]
    MonthlyAmountBelowMinimum {
        minimum: Money,
        provided: Money,
    },

    #[error("fee {fee_id} is not restructurable: status {status:?}")]
    FeeNotRestructurable {
        fee_id: FeeId,
        status: FeeStatus,
    },

    #[error("fee {fee_id} does not belong to property {property_id}")]
    FeeWrongProperty {
        fee_id: FeeId,
        property_id: PropertyId,
    },

    #[error("payment amount mismatch: installment amount {expected}, provided {provided}")]
    AmountMismatch {
        expected: Money,
        provided: Money,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("agreement {agreement_id} is not active: status {status:?}")]
    AgreementNotActive {
        agreement_id: AgreementId,
        status: AgreementStatus,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("property not found: {id}")]
    PropertyNotFound {
        id: PropertyId,
    },

    #[error("fee not found: {id}")]
    FeeNotFound {
        id: FeeId,
    },

    #[error("agreement not found: {id}")]
    AgreementNotFound {
        id: AgreementId,
    },

    #[error("installment not found: {id}")]
    InstallmentNotFound {
        id: InstallmentId,
    },

    #[error("no payable installment in scope")]
    NoPayableInstallment,

    #[error("installment {installment_id} is no longer payable: status {status:?}")]
    InstallmentNotPayable {
        installment_id: InstallmentId,
        status: InstallmentStatus,
    },

    #[error("integrity failure: {message}")]
    Integrity {
        message: String,
    },
}

/// coarse classification for transports mapping errors to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Integrity,
}

impl AgreementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgreementError::EmptyFeeSelection
            | AgreementError::NonPositiveMonthlyAmount { .. }
            | AgreementError::MonthlyAmountExceedsDebt { .. }
            | AgreementError::MonthlyAmountBelowMinimum { .. }
            | AgreementError::FeeNotRestructurable { .. }
            | AgreementError::FeeWrongProperty { .. }
            | AgreementError::AmountMismatch { .. }
            | AgreementError::InvalidDate { .. }
            | AgreementError::AgreementNotActive { .. }
            | AgreementError::InvalidConfiguration { .. } => ErrorKind::Validation,

            AgreementError::PropertyNotFound { .. }
            | AgreementError::FeeNotFound { .. }
            | AgreementError::AgreementNotFound { .. }
            | AgreementError::InstallmentNotFound { .. }
            | AgreementError::NoPayableInstallment => ErrorKind::NotFound,

            AgreementError::InstallmentNotPayable { .. } => ErrorKind::Conflict,

            AgreementError::Integrity { .. } => ErrorKind::Integrity,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgreementError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            AgreementError::EmptyFeeSelection.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AgreementError::AgreementNotFound { id: Uuid::new_v4() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AgreementError::InstallmentNotPayable {
                installment_id: Uuid::new_v4(),
                status: InstallmentStatus::Paid,
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AgreementError::Integrity {
                message: "partial write".to_string()
            }
            .kind(),
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_amount_mismatch_message() {
        let err = AgreementError::AmountMismatch {
            expected: Money::from_str_exact("300.00").unwrap(),
            provided: Money::from_str_exact("250.00").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "payment amount mismatch: installment amount 300.00, provided 250.00"
        );
    }
}
