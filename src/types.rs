use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a property
pub type PropertyId = Uuid;

/// unique identifier for a fee
pub type FeeId = Uuid;

/// unique identifier for an agreement
pub type AgreementId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// fee status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    /// generated, nothing paid yet
    Pending,
    /// some amount paid, balance remaining
    PartiallyPaid,
    /// fully paid
    Completed,
    /// payment attempt rejected
    Failed,
    /// voided by an operator
    Cancelled,
    /// folded into an installment agreement, no longer independently payable
    Agreement,
}

impl FeeStatus {
    /// whether the fee can still be folded into an agreement
    pub fn is_restructurable(&self) -> bool {
        matches!(self, FeeStatus::Pending | FeeStatus::PartiallyPaid)
    }
}

/// agreement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    /// at least one installment remains payable
    Active,
    /// every installment paid
    Completed,
    /// cancelled by operator action
    Cancelled,
    /// declared unrecoverable by policy
    Defaulted,
}

impl AgreementStatus {
    /// terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AgreementStatus::Active)
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// scheduled, not yet due or not yet paid
    Pending,
    /// paid in full
    Paid,
    /// due date passed without payment
    Overdue,
    /// voided because the whole agreement was cancelled
    Cancelled,
}

impl InstallmentStatus {
    /// whether a payment can be applied
    pub fn is_payable(&self) -> bool {
        matches!(self, InstallmentStatus::Pending | InstallmentStatus::Overdue)
    }
}

/// selection scope for "next payable installment" queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentScope {
    /// across every active agreement
    Global,
    /// limited to one property's agreements
    ForProperty(PropertyId),
    /// limited to a single agreement
    ForAgreement(AgreementId),
}

/// operator-supplied details recorded when an installment is paid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub receipt_file: Option<String>,
}

impl PaymentDetails {
    pub fn with_reference(reference: impl Into<String>) -> Self {
        Self {
            payment_reference: Some(reference.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restructurable_fees() {
        assert!(FeeStatus::Pending.is_restructurable());
        assert!(FeeStatus::PartiallyPaid.is_restructurable());
        assert!(!FeeStatus::Completed.is_restructurable());
        assert!(!FeeStatus::Agreement.is_restructurable());
        assert!(!FeeStatus::Cancelled.is_restructurable());
    }

    #[test]
    fn test_terminal_agreement_states() {
        assert!(!AgreementStatus::Active.is_terminal());
        assert!(AgreementStatus::Completed.is_terminal());
        assert!(AgreementStatus::Cancelled.is_terminal());
        assert!(AgreementStatus::Defaulted.is_terminal());
    }

    #[test]
    fn test_payable_installment_states() {
        assert!(InstallmentStatus::Pending.is_payable());
        assert!(InstallmentStatus::Overdue.is_payable());
        assert!(!InstallmentStatus::Paid.is_payable());
        assert!(!InstallmentStatus::Cancelled.is_payable());
    }

    #[test]
    fn test_status_serde_wire_format() {
        let s = serde_json::to_string(&FeeStatus::PartiallyPaid).unwrap();
        assert_eq!(s, "\"partially_paid\"");
        let s = serde_json::to_string(&InstallmentStatus::Overdue).unwrap();
        assert_eq!(s, "\"overdue\"");
    }
}
