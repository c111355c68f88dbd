use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AgreementId, AgreementStatus, FeeId, InstallmentId, PropertyId};

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    AgreementCreated {
        agreement_id: AgreementId,
        agreement_number: String,
        property_id: PropertyId,
        total_debt: Money,
        monthly_amount: Money,
        installments_count: u32,
        timestamp: DateTime<Utc>,
    },
    AgreementCompleted {
        agreement_id: AgreementId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    AgreementCancelled {
        agreement_id: AgreementId,
        installments_cancelled: u32,
        fees_released: u32,
        timestamp: DateTime<Utc>,
    },
    AgreementDefaulted {
        agreement_id: AgreementId,
        consecutive_overdue: u32,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        agreement_id: AgreementId,
        old_status: AgreementStatus,
        new_status: AgreementStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // fee events
    FeeFolded {
        fee_id: FeeId,
        agreement_id: AgreementId,
        folded_amount: Money,
    },
    FeeReleased {
        fee_id: FeeId,
        agreement_id: AgreementId,
    },

    // installment events
    InstallmentPaid {
        agreement_id: AgreementId,
        installment_id: InstallmentId,
        installment_number: u32,
        amount: Money,
        paid_date: DateTime<Utc>,
    },
    InstallmentOverdue {
        agreement_id: AgreementId,
        installment_id: InstallmentId,
        installment_number: u32,
        due_date: NaiveDate,
    },
    ScheduleRegenerated {
        agreement_id: AgreementId,
        monthly_amount: Money,
        regenerated_count: u32,
        remaining_debt: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        store.emit(Event::FeeFolded {
            fee_id: Uuid::new_v4(),
            agreement_id: Uuid::new_v4(),
            folded_amount: Money::from_major(150),
        });
        assert_eq!(store.events().len(), 1);

        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }
}
