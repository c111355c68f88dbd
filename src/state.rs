use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    AgreementId, AgreementStatus, FeeId, FeeStatus, InstallmentId, InstallmentStatus,
    PaymentDetails, PropertyId,
};

/// property read model, fed from the upstream registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub villa: String,
    pub row_letter: String,
    pub number: u32,
    pub owner_name: String,
    pub owner_phone: Option<String>,
}

impl Property {
    /// short display label, e.g. "Las Palmas B12"
    pub fn label(&self) -> String {
        format!("{} {}{}", self.villa, self.row_letter, self.number)
    }
}

/// one billing period's charge owed by a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub id: FeeId,
    pub property_id: PropertyId,
    pub amount: Money,
    pub paid_amount: Money,
    pub status: FeeStatus,
    pub due_date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Fee {
    /// balance still owed on this fee
    pub fn remaining_amount(&self) -> Money {
        (self.amount - self.paid_amount).max(Money::ZERO)
    }

    pub fn is_restructurable(&self) -> bool {
        self.status.is_restructurable()
    }
}

/// one scheduled payment unit of an agreement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub agreement_id: AgreementId,
    pub installment_number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub receipt_file: Option<String>,
}

impl Installment {
    pub fn is_payable(&self) -> bool {
        self.status.is_payable()
    }

    /// record a validated payment against this installment
    pub fn mark_paid(&mut self, details: PaymentDetails, when: DateTime<Utc>) {
        self.status = InstallmentStatus::Paid;
        self.paid_date = Some(when);
        self.payment_reference = details.payment_reference;
        if details.notes.is_some() {
            self.notes = details.notes;
        }
        self.receipt_file = details.receipt_file;
    }
}

/// a debt-restructuring contract covering a selected set of fees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    // identification
    pub id: AgreementId,
    pub agreement_number: String,
    pub property_id: PropertyId,

    // folded debt, snapshotted at creation
    pub fee_ids: Vec<FeeId>,
    pub total_debt: Money,
    pub monthly_amount: Money,
    pub installments_count: u32,

    // schedule bounds
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // status
    pub status: AgreementStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub installments: Vec<Installment>,
}

impl Agreement {
    /// sum of amounts across paid installments
    pub fn total_paid(&self) -> Money {
        self.installments
            .iter()
            .filter(|inst| inst.status == InstallmentStatus::Paid)
            .map(|inst| inst.amount)
            .sum()
    }

    /// debt not yet covered by paid installments
    pub fn pending_amount(&self) -> Money {
        (self.total_debt - self.total_paid()).max(Money::ZERO)
    }

    /// the single next-payable installment: lowest number among payable ones
    pub fn next_payable(&self) -> Option<&Installment> {
        self.installments
            .iter()
            .filter(|inst| inst.is_payable())
            .min_by_key(|inst| inst.installment_number)
    }

    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.installments.iter().find(|inst| inst.id == id)
    }

    pub fn installment_mut(&mut self, id: InstallmentId) -> Option<&mut Installment> {
        self.installments.iter_mut().find(|inst| inst.id == id)
    }

    /// whether no payable installment remains
    pub fn is_fully_paid(&self) -> bool {
        self.installments.iter().all(|inst| !inst.is_payable())
    }

    /// length of the overdue run starting at the earliest unpaid installment
    pub fn consecutive_overdue(&self) -> u32 {
        let mut unpaid: Vec<&Installment> = self
            .installments
            .iter()
            .filter(|inst| inst.is_payable())
            .collect();
        unpaid.sort_by_key(|inst| inst.installment_number);

        let mut run = 0;
        for inst in unpaid {
            if inst.status == InstallmentStatus::Overdue {
                run += 1;
            } else {
                break;
            }
        }
        run
    }

    /// transition status, stamping the update time
    pub fn update_status(&mut self, new_status: AgreementStatus, timestamp: DateTime<Utc>) {
        self.status = new_status;
        self.updated_at = timestamp;
    }
}
