/// serializable read models handed to transports and the document generator
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::{Agreement, Fee, Installment, Property};
use crate::types::{AgreementId, AgreementStatus, FeeId, PropertyId};

/// full agreement view with denormalized property identity and derived totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementView {
    pub id: AgreementId,
    pub agreement_number: String,
    pub property_id: PropertyId,
    pub property_villa: String,
    pub property_row_letter: String,
    pub property_number: u32,
    pub property_owner_name: String,
    pub fee_ids: Vec<FeeId>,
    pub total_debt: Money,
    pub monthly_amount: Money,
    pub installments_count: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: AgreementStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_paid: Money,
    pub pending_amount: Money,
    pub installments: Vec<Installment>,
}

impl AgreementView {
    pub fn from_parts(agreement: &Agreement, property: &Property) -> Self {
        Self {
            id: agreement.id,
            agreement_number: agreement.agreement_number.clone(),
            property_id: property.id,
            property_villa: property.villa.clone(),
            property_row_letter: property.row_letter.clone(),
            property_number: property.number,
            property_owner_name: property.owner_name.clone(),
            fee_ids: agreement.fee_ids.clone(),
            total_debt: agreement.total_debt,
            monthly_amount: agreement.monthly_amount,
            installments_count: agreement.installments_count,
            start_date: agreement.start_date,
            end_date: agreement.end_date,
            status: agreement.status,
            notes: agreement.notes.clone(),
            created_at: agreement.created_at,
            updated_at: agreement.updated_at,
            total_paid: agreement.total_paid(),
            pending_amount: agreement.pending_amount(),
            installments: agreement.installments.clone(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// the oldest payable installment with the context an operator needs on screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextInstallment {
    pub installment: Installment,
    pub agreement_id: AgreementId,
    pub agreement_number: String,
    pub property_villa: String,
    pub property_row_letter: String,
    pub property_number: u32,
    pub property_owner_name: String,
}

impl NextInstallment {
    pub fn from_parts(installment: &Installment, agreement: &Agreement, property: &Property) -> Self {
        Self {
            installment: installment.clone(),
            agreement_id: agreement.id,
            agreement_number: agreement.agreement_number.clone(),
            property_villa: property.villa.clone(),
            property_row_letter: property.row_letter.clone(),
            property_number: property.number,
            property_owner_name: property.owner_name.clone(),
        }
    }
}

/// data payload for the external document generator. rendering is not
/// the engine's concern; it only supplies the figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementDocument {
    pub agreement: AgreementView,
    pub folded_fees: Vec<Fee>,
}

impl AgreementDocument {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallmentStatus;
    use uuid::Uuid;

    fn property() -> Property {
        Property {
            id: Uuid::new_v4(),
            villa: "Las Palmas".to_string(),
            row_letter: "B".to_string(),
            number: 12,
            owner_name: "Rosa Delgado".to_string(),
            owner_phone: None,
        }
    }

    fn agreement(property_id: PropertyId) -> Agreement {
        let now = Utc::now();
        let due = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let agreement_id = Uuid::new_v4();
        Agreement {
            id: agreement_id,
            agreement_number: "AGR-2024-00001".to_string(),
            property_id,
            fee_ids: vec![Uuid::new_v4()],
            total_debt: Money::from_major(600),
            monthly_amount: Money::from_major(300),
            installments_count: 2,
            start_date: due,
            end_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            status: AgreementStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
            installments: vec![
                Installment {
                    id: Uuid::new_v4(),
                    agreement_id,
                    installment_number: 1,
                    amount: Money::from_major(300),
                    due_date: due,
                    status: InstallmentStatus::Paid,
                    paid_date: Some(now),
                    payment_reference: Some("OP-1".to_string()),
                    notes: None,
                    receipt_file: None,
                },
                Installment {
                    id: Uuid::new_v4(),
                    agreement_id,
                    installment_number: 2,
                    amount: Money::from_major(300),
                    due_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                    status: InstallmentStatus::Pending,
                    paid_date: None,
                    payment_reference: None,
                    notes: None,
                    receipt_file: None,
                },
            ],
        }
    }

    #[test]
    fn test_view_carries_derived_totals() {
        let property = property();
        let view = AgreementView::from_parts(&agreement(property.id), &property);

        assert_eq!(view.total_paid, Money::from_major(300));
        assert_eq!(view.pending_amount, Money::from_major(300));
        assert_eq!(view.property_owner_name, "Rosa Delgado");
    }

    #[test]
    fn test_view_round_trips_through_json() {
        let property = property();
        let view = AgreementView::from_parts(&agreement(property.id), &property);
        let json = view.to_json_pretty().unwrap();
        let back: AgreementView = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agreement_number, view.agreement_number);
        assert_eq!(back.pending_amount, view.pending_amount);
        assert_eq!(back.installments.len(), 2);
    }
}
