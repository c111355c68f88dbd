use hourglass_rs::SafeTimeProvider;
use serde::Serialize;
use tracing::info;

use crate::events::Event;
use crate::types::{AgreementId, AgreementStatus, InstallmentStatus};

use super::AgreementEngine;

/// result of one overdue sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub marked_overdue: u32,
    pub defaulted: u32,
}

impl AgreementEngine {
    /// periodic sweep: flip pending installments past their due date to
    /// overdue, then evaluate the default policy (if one is configured)
    /// against each active agreement's consecutive overdue run.
    pub fn run_overdue_sweep(&mut self, time: &SafeTimeProvider) -> SweepOutcome {
        let now = time.now();
        let today = now.date_naive();
        let mut outcome = SweepOutcome::default();

        for agreement in self.agreements.values_mut() {
            if agreement.status != AgreementStatus::Active {
                continue;
            }
            for installment in agreement.installments.iter_mut() {
                if installment.status == InstallmentStatus::Pending && installment.due_date < today
                {
                    installment.status = InstallmentStatus::Overdue;
                    outcome.marked_overdue += 1;
                    self.events.emit(Event::InstallmentOverdue {
                        agreement_id: agreement.id,
                        installment_id: installment.id,
                        installment_number: installment.installment_number,
                        due_date: installment.due_date,
                    });
                }
            }
        }

        if let Some(policy) = self.config.default_policy {
            let breached: Vec<AgreementId> = self
                .agreements
                .values()
                .filter(|a| a.status == AgreementStatus::Active)
                .filter(|a| a.consecutive_overdue() >= policy.max_consecutive_overdue)
                .map(|a| a.id)
                .collect();

            for id in breached {
                if self.mark_defaulted(id, time).is_ok() {
                    outcome.defaulted += 1;
                }
            }
        }

        info!(
            marked_overdue = outcome.marked_overdue,
            defaulted = outcome.defaulted,
            "overdue sweep completed"
        );

        outcome
    }
}
