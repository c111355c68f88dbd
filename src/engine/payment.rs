use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::decimal::Money;
use crate::errors::{AgreementError, Result};
use crate::events::Event;
use crate::state::Installment;
use crate::types::{
    AgreementId, AgreementStatus, InstallmentId, InstallmentScope, InstallmentStatus,
    PaymentDetails,
};
use crate::views::NextInstallment;

use super::AgreementEngine;

/// administrative correction input: direct field edits with no ordering
/// constraint and no amount contract
#[derive(Debug, Clone, Default)]
pub struct AdminInstallmentUpdate {
    pub amount: Option<Money>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InstallmentStatus>,
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

impl AgreementEngine {
    /// strict oldest-first selection: earliest due date among payable
    /// installments of active agreements in scope, ties broken by lowest
    /// installment number, then by agreement creation order.
    fn select_payable(&self, scope: InstallmentScope) -> Option<(AgreementId, InstallmentId)> {
        let mut best: Option<(NaiveDate, u32, usize, AgreementId, InstallmentId)> = None;

        for (creation_index, agreement_id) in self.creation_order.iter().enumerate() {
            let Some(agreement) = self.agreements.get(agreement_id) else {
                continue;
            };
            if agreement.status != AgreementStatus::Active {
                continue;
            }
            match scope {
                InstallmentScope::Global => {}
                InstallmentScope::ForProperty(property_id) => {
                    if agreement.property_id != property_id {
                        continue;
                    }
                }
                InstallmentScope::ForAgreement(id) => {
                    if agreement.id != id {
                        continue;
                    }
                }
            }

            for installment in agreement.installments.iter().filter(|i| i.is_payable()) {
                let key = (
                    installment.due_date,
                    installment.installment_number,
                    creation_index,
                    *agreement_id,
                    installment.id,
                );
                match &best {
                    Some(current) if (current.0, current.1, current.2) <= (key.0, key.1, key.2) => {}
                    _ => best = Some(key),
                }
            }
        }

        best.map(|(_, _, _, agreement_id, installment_id)| (agreement_id, installment_id))
    }

    /// the oldest payable installment in scope, with denormalized agreement
    /// and property context. absence is a normal outcome, not an error.
    pub fn next_payable_installment(&self, scope: InstallmentScope) -> Option<NextInstallment> {
        let (agreement_id, installment_id) = self.select_payable(scope)?;
        let agreement = self.agreements.get(&agreement_id)?;
        let installment = agreement.installment(installment_id)?;
        let property = self.properties.get(&agreement.property_id)?;
        Some(NextInstallment::from_parts(installment, agreement, property))
    }

    /// pay the oldest payable installment in scope. the amount is fixed to
    /// the installment's exact amount; anything else is rejected.
    pub fn pay_next_installment(
        &mut self,
        scope: InstallmentScope,
        amount: Money,
        details: PaymentDetails,
        time: &SafeTimeProvider,
    ) -> Result<Installment> {
        let (agreement_id, installment_id) = self
            .select_payable(scope)
            .ok_or(AgreementError::NoPayableInstallment)?;
        self.apply_payment(agreement_id, installment_id, amount, details, time)
    }

    /// pay a pre-selected installment. the status is re-checked at apply
    /// time: a selection that went stale (already paid, cancelled) fails with
    /// a conflict so the caller can re-resolve "next" and retry once.
    pub fn pay_installment(
        &mut self,
        agreement_id: AgreementId,
        installment_id: InstallmentId,
        amount: Money,
        details: PaymentDetails,
        time: &SafeTimeProvider,
    ) -> Result<Installment> {
        self.apply_payment(agreement_id, installment_id, amount, details, time)
    }

    fn apply_payment(
        &mut self,
        agreement_id: AgreementId,
        installment_id: InstallmentId,
        amount: Money,
        details: PaymentDetails,
        time: &SafeTimeProvider,
    ) -> Result<Installment> {
        let now = time.now();

        let agreement = self
            .agreements
            .get_mut(&agreement_id)
            .ok_or(AgreementError::AgreementNotFound { id: agreement_id })?;
        if agreement.status != AgreementStatus::Active {
            return Err(AgreementError::AgreementNotActive {
                agreement_id,
                status: agreement.status,
            });
        }

        let installment = agreement
            .installment(installment_id)
            .ok_or(AgreementError::InstallmentNotFound { id: installment_id })?;
        if !installment.is_payable() {
            return Err(AgreementError::InstallmentNotPayable {
                installment_id,
                status: installment.status,
            });
        }
        if amount != installment.amount {
            return Err(AgreementError::AmountMismatch {
                expected: installment.amount,
                provided: amount,
            });
        }

        let installment = agreement
            .installment_mut(installment_id)
            .ok_or(AgreementError::InstallmentNotFound { id: installment_id })?;
        installment.mark_paid(details, now);
        let paid = installment.clone();
        agreement.updated_at = now;

        self.events.emit(Event::InstallmentPaid {
            agreement_id,
            installment_id,
            installment_number: paid.installment_number,
            amount: paid.amount,
            paid_date: now,
        });

        // completion happens in the same operation as the final payment:
        // there is no observable "active with zero pending" state
        if agreement.is_fully_paid() {
            let old_status = agreement.status;
            agreement.update_status(AgreementStatus::Completed, now);
            let total_paid = agreement.total_paid();

            self.events.emit(Event::AgreementCompleted {
                agreement_id,
                total_paid,
                timestamp: now,
            });
            self.events.emit(Event::StatusChanged {
                agreement_id,
                old_status,
                new_status: AgreementStatus::Completed,
                reason: "all installments paid".to_string(),
                timestamp: now,
            });
        }

        info!(
            agreement_id = %agreement_id,
            installment = paid.installment_number,
            amount = %paid.amount,
            "installment paid"
        );

        Ok(paid)
    }

    /// administrative correction path: direct edits, no ordering constraint.
    /// refuses to touch installments of terminal agreements.
    pub fn admin_update_installment(
        &mut self,
        agreement_id: AgreementId,
        installment_id: InstallmentId,
        update: AdminInstallmentUpdate,
        time: &SafeTimeProvider,
    ) -> Result<Installment> {
        let now = time.now();

        let agreement = self
            .agreements
            .get_mut(&agreement_id)
            .ok_or(AgreementError::AgreementNotFound { id: agreement_id })?;
        if agreement.status != AgreementStatus::Active {
            return Err(AgreementError::AgreementNotActive {
                agreement_id,
                status: agreement.status,
            });
        }

        let installment = agreement
            .installment_mut(installment_id)
            .ok_or(AgreementError::InstallmentNotFound { id: installment_id })?;

        if let Some(amount) = update.amount {
            if !amount.is_positive() {
                return Err(AgreementError::AmountMismatch {
                    expected: installment.amount,
                    provided: amount,
                });
            }
            installment.amount = amount;
        }
        if let Some(due_date) = update.due_date {
            installment.due_date = due_date;
        }
        if let Some(status) = update.status {
            installment.status = status;
        }
        if let Some(paid_date) = update.paid_date {
            installment.paid_date = Some(paid_date);
        }
        if let Some(reference) = update.payment_reference {
            installment.payment_reference = Some(reference);
        }
        if let Some(notes) = update.notes {
            installment.notes = Some(notes);
        }

        let corrected = installment.clone();
        agreement.updated_at = now;

        // a correction can retire the last payable installment
        if agreement.is_fully_paid() {
            let old_status = agreement.status;
            agreement.update_status(AgreementStatus::Completed, now);
            let total_paid = agreement.total_paid();
            self.events.emit(Event::AgreementCompleted {
                agreement_id,
                total_paid,
                timestamp: now,
            });
            self.events.emit(Event::StatusChanged {
                agreement_id,
                old_status,
                new_status: AgreementStatus::Completed,
                reason: "all installments paid".to_string(),
                timestamp: now,
            });
        }

        Ok(corrected)
    }
}
