mod payment;
mod sweep;

pub use payment::AdminInstallmentUpdate;
pub use sweep::SweepOutcome;

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{AgreementError, Result};
use crate::events::{Event, EventStore};
use crate::numbering::AgreementNumberSequence;
use crate::schedule;
use crate::state::{Agreement, Fee, Installment, Property};
use crate::types::{
    AgreementId, AgreementStatus, FeeId, FeeStatus, InstallmentStatus, PropertyId,
};
use crate::views::{AgreementDocument, AgreementView};

/// input for creating an agreement
#[derive(Debug, Clone)]
pub struct CreateAgreement {
    pub property_id: PropertyId,
    pub fee_ids: Vec<FeeId>,
    pub monthly_amount: Money,
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

/// input for updating an active agreement
#[derive(Debug, Clone, Default)]
pub struct UpdateAgreement {
    pub monthly_amount: Option<Money>,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct AgreementFilter {
    pub property_id: Option<PropertyId>,
    pub status: Option<AgreementStatus>,
}

/// owns the lifecycle of installment agreements: folding fees into a total
/// debt, deriving the schedule, and applying payments oldest-first until the
/// agreement completes. every operation is all-or-nothing: validation runs
/// before the first mutation.
pub struct AgreementEngine {
    config: EngineConfig,
    properties: HashMap<PropertyId, Property>,
    fees: HashMap<FeeId, Fee>,
    agreements: HashMap<AgreementId, Agreement>,
    // creation order doubles as the final tie-break for payment selection
    creation_order: Vec<AgreementId>,
    numbering: AgreementNumberSequence,
    pub events: EventStore,
}

impl AgreementEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let numbering = AgreementNumberSequence::new(config.number_prefix.clone());
        Ok(Self {
            config,
            properties: HashMap::new(),
            fees: HashMap::new(),
            agreements: HashMap::new(),
            creation_order: Vec::new(),
            numbering,
            events: EventStore::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// ingest a property read model from the upstream registry
    pub fn load_property(&mut self, property: Property) {
        self.properties.insert(property.id, property);
    }

    /// ingest a fee read model from the upstream fee store
    pub fn load_fee(&mut self, fee: Fee) -> Result<()> {
        if !self.properties.contains_key(&fee.property_id) {
            return Err(AgreementError::PropertyNotFound {
                id: fee.property_id,
            });
        }
        if fee.paid_amount > fee.amount || fee.paid_amount.is_negative() {
            return Err(AgreementError::Integrity {
                message: format!(
                    "fee {} paid amount {} outside [0, {}]",
                    fee.id, fee.paid_amount, fee.amount
                ),
            });
        }
        self.fees.insert(fee.id, fee);
        Ok(())
    }

    pub fn property(&self, id: PropertyId) -> Result<&Property> {
        self.properties
            .get(&id)
            .ok_or(AgreementError::PropertyNotFound { id })
    }

    pub fn fee(&self, id: FeeId) -> Result<&Fee> {
        self.fees.get(&id).ok_or(AgreementError::FeeNotFound { id })
    }

    pub fn agreement(&self, id: AgreementId) -> Result<&Agreement> {
        self.agreements
            .get(&id)
            .ok_or(AgreementError::AgreementNotFound { id })
    }

    /// create an agreement: validate the fee selection, derive the schedule,
    /// then fold the fees and persist agreement plus installments as one unit.
    pub fn create_agreement(
        &mut self,
        request: CreateAgreement,
        time: &SafeTimeProvider,
    ) -> Result<AgreementId> {
        let now = time.now();

        // validation phase: nothing is mutated until every check passes
        if !self.properties.contains_key(&request.property_id) {
            return Err(AgreementError::PropertyNotFound {
                id: request.property_id,
            });
        }

        let mut fee_ids = Vec::with_capacity(request.fee_ids.len());
        let mut seen = HashSet::new();
        for fee_id in &request.fee_ids {
            if seen.insert(*fee_id) {
                fee_ids.push(*fee_id);
            }
        }
        if fee_ids.is_empty() {
            return Err(AgreementError::EmptyFeeSelection);
        }

        let mut total_debt = Money::ZERO;
        for fee_id in &fee_ids {
            let fee = self
                .fees
                .get(fee_id)
                .ok_or(AgreementError::FeeNotFound { id: *fee_id })?;
            if fee.property_id != request.property_id {
                return Err(AgreementError::FeeWrongProperty {
                    fee_id: *fee_id,
                    property_id: request.property_id,
                });
            }
            if !fee.is_restructurable() {
                return Err(AgreementError::FeeNotRestructurable {
                    fee_id: *fee_id,
                    status: fee.status,
                });
            }
            total_debt += fee.remaining_amount();
        }

        if let Some(minimum) = self.config.minimum_installment {
            if request.monthly_amount < minimum {
                return Err(AgreementError::MonthlyAmountBelowMinimum {
                    minimum,
                    provided: request.monthly_amount,
                });
            }
        }

        let scheduled = schedule::build_schedule(
            total_debt,
            request.monthly_amount,
            request.start_date,
            1,
        )?;
        let end_date = scheduled
            .last()
            .map(|s| s.due_date)
            .ok_or(AgreementError::Integrity {
                message: "derived schedule is empty".to_string(),
            })?;

        // mutation phase
        let agreement_id = Uuid::new_v4();
        let agreement_number = self.numbering.next(now.year());

        let installments: Vec<Installment> = scheduled
            .iter()
            .map(|s| Installment {
                id: Uuid::new_v4(),
                agreement_id,
                installment_number: s.installment_number,
                amount: s.amount,
                due_date: s.due_date,
                status: InstallmentStatus::Pending,
                paid_date: None,
                payment_reference: None,
                notes: None,
                receipt_file: None,
            })
            .collect();

        for fee_id in &fee_ids {
            if let Some(fee) = self.fees.get_mut(fee_id) {
                let folded_amount = fee.remaining_amount();
                fee.status = FeeStatus::Agreement;
                self.events.emit(Event::FeeFolded {
                    fee_id: *fee_id,
                    agreement_id,
                    folded_amount,
                });
            }
        }

        let installments_count = installments.len() as u32;
        let agreement = Agreement {
            id: agreement_id,
            agreement_number: agreement_number.clone(),
            property_id: request.property_id,
            fee_ids,
            total_debt,
            monthly_amount: request.monthly_amount,
            installments_count,
            start_date: request.start_date,
            end_date,
            status: AgreementStatus::Active,
            notes: request.notes,
            created_at: now,
            updated_at: now,
            installments,
        };

        self.events.emit(Event::AgreementCreated {
            agreement_id,
            agreement_number: agreement_number.clone(),
            property_id: request.property_id,
            total_debt,
            monthly_amount: request.monthly_amount,
            installments_count,
            timestamp: now,
        });

        self.agreements.insert(agreement_id, agreement);
        self.creation_order.push(agreement_id);

        info!(
            agreement = %agreement_number,
            total_debt = %total_debt,
            installments = installments_count,
            "agreement created"
        );

        Ok(agreement_id)
    }

    /// list agreements newest-first, optionally filtered by property and status
    pub fn list_agreements(&self, filter: AgreementFilter) -> Vec<&Agreement> {
        self.creation_order
            .iter()
            .rev()
            .filter_map(|id| self.agreements.get(id))
            .filter(|a| filter.property_id.map_or(true, |p| a.property_id == p))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .collect()
    }

    pub fn agreement_view(&self, id: AgreementId) -> Result<AgreementView> {
        let agreement = self.agreement(id)?;
        let property = self.property(agreement.property_id)?;
        Ok(AgreementView::from_parts(agreement, property))
    }

    pub fn list_agreement_views(&self, filter: AgreementFilter) -> Vec<AgreementView> {
        self.list_agreements(filter)
            .into_iter()
            .filter_map(|agreement| {
                self.properties
                    .get(&agreement.property_id)
                    .map(|property| AgreementView::from_parts(agreement, property))
            })
            .collect()
    }

    /// data payload for the external document generator
    pub fn agreement_document(&self, id: AgreementId) -> Result<AgreementDocument> {
        let view = self.agreement_view(id)?;
        let folded_fees = view
            .fee_ids
            .iter()
            .filter_map(|fee_id| self.fees.get(fee_id))
            .cloned()
            .collect();
        Ok(AgreementDocument {
            agreement: view,
            folded_fees,
        })
    }

    /// update an active agreement. a changed monthly amount or start date
    /// regenerates only the unpaid installments against the remaining debt;
    /// paid installments and their history are preserved.
    pub fn update_agreement(
        &mut self,
        id: AgreementId,
        update: UpdateAgreement,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time.now();

        let agreement = self
            .agreements
            .get(&id)
            .ok_or(AgreementError::AgreementNotFound { id })?;
        if agreement.status != AgreementStatus::Active {
            return Err(AgreementError::AgreementNotActive {
                agreement_id: id,
                status: agreement.status,
            });
        }

        let reschedule =
            update.monthly_amount.is_some_and(|m| m != agreement.monthly_amount)
                || update.start_date.is_some_and(|d| {
                    agreement
                        .installments
                        .iter()
                        .filter(|i| i.is_payable())
                        .map(|i| i.due_date)
                        .min()
                        != Some(d)
                });

        if reschedule {
            let monthly_amount = update.monthly_amount.unwrap_or(agreement.monthly_amount);
            let remaining_debt = agreement.pending_amount();

            let paid: Vec<Installment> = agreement
                .installments
                .iter()
                .filter(|i| i.status == InstallmentStatus::Paid)
                .cloned()
                .collect();
            let first_number = paid
                .iter()
                .map(|i| i.installment_number)
                .max()
                .unwrap_or(0)
                + 1;
            let tail_start = match update.start_date {
                Some(d) => d,
                None => agreement
                    .installments
                    .iter()
                    .filter(|i| i.is_payable())
                    .map(|i| i.due_date)
                    .min()
                    .ok_or(AgreementError::Integrity {
                        message: "active agreement with no payable installment".to_string(),
                    })?,
            };

            let scheduled =
                schedule::build_schedule(remaining_debt, monthly_amount, tail_start, first_number)?;
            let regenerated_count = scheduled.len() as u32;
            let end_date = scheduled
                .last()
                .map(|s| s.due_date)
                .ok_or(AgreementError::Integrity {
                    message: "regenerated schedule is empty".to_string(),
                })?;

            let agreement = self
                .agreements
                .get_mut(&id)
                .ok_or(AgreementError::AgreementNotFound { id })?;

            let mut installments = paid;
            installments.extend(scheduled.iter().map(|s| Installment {
                id: Uuid::new_v4(),
                agreement_id: id,
                installment_number: s.installment_number,
                amount: s.amount,
                due_date: s.due_date,
                status: InstallmentStatus::Pending,
                paid_date: None,
                payment_reference: None,
                notes: None,
                receipt_file: None,
            }));

            agreement.monthly_amount = monthly_amount;
            agreement.installments_count = installments.len() as u32;
            agreement.end_date = end_date;
            agreement.installments = installments;
            if let Some(start) = update.start_date {
                if agreement.total_paid().is_zero() {
                    agreement.start_date = start;
                }
            }
            agreement.updated_at = now;

            self.events.emit(Event::ScheduleRegenerated {
                agreement_id: id,
                monthly_amount,
                regenerated_count,
                remaining_debt,
                timestamp: now,
            });
        }

        if let Some(notes) = update.notes {
            let agreement = self
                .agreements
                .get_mut(&id)
                .ok_or(AgreementError::AgreementNotFound { id })?;
            agreement.notes = Some(notes);
            agreement.updated_at = now;
        }

        Ok(())
    }

    /// cancel an active agreement: void its unpaid installments and release
    /// the folded fees back to their payable status.
    pub fn cancel_agreement(&mut self, id: AgreementId, time: &SafeTimeProvider) -> Result<()> {
        let now = time.now();

        let agreement = self
            .agreements
            .get_mut(&id)
            .ok_or(AgreementError::AgreementNotFound { id })?;
        if agreement.status != AgreementStatus::Active {
            return Err(AgreementError::AgreementNotActive {
                agreement_id: id,
                status: agreement.status,
            });
        }

        let mut installments_cancelled = 0;
        for installment in agreement.installments.iter_mut() {
            if installment.is_payable() {
                installment.status = InstallmentStatus::Cancelled;
                installments_cancelled += 1;
            }
        }

        let old_status = agreement.status;
        agreement.update_status(AgreementStatus::Cancelled, now);
        let fee_ids = agreement.fee_ids.clone();
        let agreement_number = agreement.agreement_number.clone();

        let mut fees_released = 0;
        for fee_id in &fee_ids {
            if let Some(fee) = self.fees.get_mut(fee_id) {
                if fee.status == FeeStatus::Agreement {
                    fee.status = if fee.paid_amount.is_positive() {
                        FeeStatus::PartiallyPaid
                    } else {
                        FeeStatus::Pending
                    };
                    fees_released += 1;
                    self.events.emit(Event::FeeReleased {
                        fee_id: *fee_id,
                        agreement_id: id,
                    });
                }
            }
        }

        self.events.emit(Event::AgreementCancelled {
            agreement_id: id,
            installments_cancelled,
            fees_released,
            timestamp: now,
        });
        self.events.emit(Event::StatusChanged {
            agreement_id: id,
            old_status,
            new_status: AgreementStatus::Cancelled,
            reason: "cancelled by operator".to_string(),
            timestamp: now,
        });

        info!(
            agreement = %agreement_number,
            installments_cancelled,
            fees_released,
            "agreement cancelled"
        );

        Ok(())
    }

    /// declare an active agreement unrecoverable. exposed for callers whose
    /// default decision lives outside the engine; the sweep also calls this
    /// when a default policy is configured.
    pub fn mark_defaulted(&mut self, id: AgreementId, time: &SafeTimeProvider) -> Result<()> {
        let now = time.now();

        let agreement = self
            .agreements
            .get_mut(&id)
            .ok_or(AgreementError::AgreementNotFound { id })?;
        if agreement.status != AgreementStatus::Active {
            return Err(AgreementError::AgreementNotActive {
                agreement_id: id,
                status: agreement.status,
            });
        }

        let consecutive_overdue = agreement.consecutive_overdue();
        let old_status = agreement.status;
        agreement.update_status(AgreementStatus::Defaulted, now);

        self.events.emit(Event::AgreementDefaulted {
            agreement_id: id,
            consecutive_overdue,
            timestamp: now,
        });
        self.events.emit(Event::StatusChanged {
            agreement_id: id,
            old_status,
            new_status: AgreementStatus::Defaulted,
            reason: format!("{} consecutive overdue installments", consecutive_overdue),
            timestamp: now,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentDetails;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn frozen_time(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_exact(s).unwrap()
    }

    fn seeded_engine() -> (AgreementEngine, Property, Vec<Fee>) {
        let mut engine = AgreementEngine::new(EngineConfig::standard()).unwrap();
        let property = Property {
            id: Uuid::new_v4(),
            villa: "Las Palmas".to_string(),
            row_letter: "B".to_string(),
            number: 12,
            owner_name: "Rosa Delgado".to_string(),
            owner_phone: Some("+51 999 111 222".to_string()),
        };
        engine.load_property(property.clone());

        let mut fees = Vec::new();
        for month in 1..=4 {
            let fee = Fee {
                id: Uuid::new_v4(),
                property_id: property.id,
                amount: money("250.00"),
                paid_amount: Money::ZERO,
                status: FeeStatus::Pending,
                due_date: date(2023, month, 1),
                year: 2023,
                month,
                reference: None,
                notes: None,
            };
            engine.load_fee(fee.clone()).unwrap();
            fees.push(fee);
        }
        (engine, property, fees)
    }

    fn create_request(property: &Property, fees: &[Fee]) -> CreateAgreement {
        CreateAgreement {
            property_id: property.id,
            fee_ids: fees.iter().map(|f| f.id).collect(),
            monthly_amount: money("300.00"),
            start_date: date(2024, 1, 15),
            notes: None,
        }
    }

    #[test]
    fn test_create_agreement_folds_fees_and_builds_schedule() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();

        let agreement = engine.agreement(id).unwrap();
        assert_eq!(agreement.agreement_number, "AGR-2024-00001");
        assert_eq!(agreement.total_debt, money("1000.00"));
        assert_eq!(agreement.installments_count, 4);
        assert_eq!(agreement.end_date, date(2024, 4, 15));
        assert_eq!(
            agreement.installments.last().unwrap().amount,
            money("100.00")
        );

        for fee in &fees {
            assert_eq!(engine.fee(fee.id).unwrap().status, FeeStatus::Agreement);
        }

        let events = engine.events.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::AgreementCreated { .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::FeeFolded { .. }))
                .count(),
            4
        );
    }

    #[test]
    fn test_create_agreement_validation_failure_leaves_no_trace() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        // one fee from another property poisons the whole request
        let stranger = Property {
            id: Uuid::new_v4(),
            villa: "Los Cedros".to_string(),
            row_letter: "A".to_string(),
            number: 1,
            owner_name: "Jorge Paz".to_string(),
            owner_phone: None,
        };
        engine.load_property(stranger.clone());
        let foreign_fee = Fee {
            id: Uuid::new_v4(),
            property_id: stranger.id,
            amount: money("250.00"),
            paid_amount: Money::ZERO,
            status: FeeStatus::Pending,
            due_date: date(2023, 5, 1),
            year: 2023,
            month: 5,
            reference: None,
            notes: None,
        };
        engine.load_fee(foreign_fee.clone()).unwrap();

        let mut request = create_request(&property, &fees);
        request.fee_ids.push(foreign_fee.id);

        let err = engine.create_agreement(request, &time).unwrap_err();
        assert!(matches!(err, AgreementError::FeeWrongProperty { .. }));

        // rollback property: nothing was folded, nothing persisted
        for fee in &fees {
            assert_eq!(engine.fee(fee.id).unwrap().status, FeeStatus::Pending);
        }
        assert!(engine.list_agreements(AgreementFilter::default()).is_empty());
        assert!(engine.events.events().is_empty());
    }

    #[test]
    fn test_create_rejects_monthly_above_debt() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let mut request = create_request(&property, &fees);
        request.monthly_amount = money("1200.00");
        let err = engine.create_agreement(request, &time).unwrap_err();
        assert!(matches!(
            err,
            AgreementError::MonthlyAmountExceedsDebt { .. }
        ));
    }

    #[test]
    fn test_create_honors_configured_minimum_installment() {
        let config = EngineConfig {
            minimum_installment: Some(money("50.00")),
            ..EngineConfig::standard()
        };
        let mut engine = AgreementEngine::new(config).unwrap();
        let property = Property {
            id: Uuid::new_v4(),
            villa: "Las Palmas".to_string(),
            row_letter: "B".to_string(),
            number: 12,
            owner_name: "Rosa Delgado".to_string(),
            owner_phone: None,
        };
        engine.load_property(property.clone());
        let fee = Fee {
            id: Uuid::new_v4(),
            property_id: property.id,
            amount: money("250.00"),
            paid_amount: Money::ZERO,
            status: FeeStatus::Pending,
            due_date: date(2023, 1, 1),
            year: 2023,
            month: 1,
            reference: None,
            notes: None,
        };
        engine.load_fee(fee.clone()).unwrap();

        let err = engine
            .create_agreement(
                CreateAgreement {
                    property_id: property.id,
                    fee_ids: vec![fee.id],
                    monthly_amount: money("20.00"),
                    start_date: date(2024, 2, 1),
                    notes: None,
                },
                &frozen_time(2024, 1, 2),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AgreementError::MonthlyAmountBelowMinimum { .. }
        ));
    }

    #[test]
    fn test_create_rejects_folded_fee() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        engine
            .create_agreement(create_request(&property, &fees[..2]), &time)
            .unwrap();

        // the folded fees cannot join a second agreement
        let err = engine
            .create_agreement(create_request(&property, &fees[..2]), &time)
            .unwrap_err();
        assert!(matches!(err, AgreementError::FeeNotRestructurable { .. }));
    }

    #[test]
    fn test_partially_paid_fee_folds_at_remaining_balance() {
        let (mut engine, property, _) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let partial = Fee {
            id: Uuid::new_v4(),
            property_id: property.id,
            amount: money("250.00"),
            paid_amount: money("100.00"),
            status: FeeStatus::PartiallyPaid,
            due_date: date(2023, 6, 1),
            year: 2023,
            month: 6,
            reference: None,
            notes: None,
        };
        engine.load_fee(partial.clone()).unwrap();

        let id = engine
            .create_agreement(
                CreateAgreement {
                    property_id: property.id,
                    fee_ids: vec![partial.id],
                    monthly_amount: money("150.00"),
                    start_date: date(2024, 2, 1),
                    notes: None,
                },
                &time,
            )
            .unwrap();

        assert_eq!(engine.agreement(id).unwrap().total_debt, money("150.00"));
    }

    #[test]
    fn test_agreement_numbers_are_sequential() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let first = engine
            .create_agreement(create_request(&property, &fees[..1]), &time)
            .unwrap();
        let second = engine
            .create_agreement(create_request(&property, &fees[1..2]), &time)
            .unwrap();

        assert_eq!(
            engine.agreement(first).unwrap().agreement_number,
            "AGR-2024-00001"
        );
        assert_eq!(
            engine.agreement(second).unwrap().agreement_number,
            "AGR-2024-00002"
        );
    }

    #[test]
    fn test_list_agreements_filters_and_sorts_newest_first() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let first = engine
            .create_agreement(create_request(&property, &fees[..1]), &time)
            .unwrap();
        let second = engine
            .create_agreement(create_request(&property, &fees[1..2]), &time)
            .unwrap();

        let listed = engine.list_agreements(AgreementFilter::default());
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);

        engine.cancel_agreement(first, &time).unwrap();
        let active = engine.list_agreements(AgreementFilter {
            status: Some(AgreementStatus::Active),
            ..Default::default()
        });
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second);

        let other_property = engine.list_agreements(AgreementFilter {
            property_id: Some(Uuid::new_v4()),
            ..Default::default()
        });
        assert!(other_property.is_empty());
    }

    #[test]
    fn test_cancel_releases_fees_and_voids_installments() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        engine.events.clear();

        engine.cancel_agreement(id, &time).unwrap();

        let agreement = engine.agreement(id).unwrap();
        assert_eq!(agreement.status, AgreementStatus::Cancelled);
        assert!(agreement
            .installments
            .iter()
            .all(|i| i.status == InstallmentStatus::Cancelled));
        for fee in &fees {
            assert_eq!(engine.fee(fee.id).unwrap().status, FeeStatus::Pending);
        }

        // cancelling again is rejected: the state is terminal
        let err = engine.cancel_agreement(id, &time).unwrap_err();
        assert!(matches!(err, AgreementError::AgreementNotActive { .. }));
    }

    #[test]
    fn test_cancel_preserves_paid_installments() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        engine
            .pay_next_installment(
                crate::types::InstallmentScope::ForAgreement(id),
                money("300.00"),
                PaymentDetails::default(),
                &time,
            )
            .unwrap();

        engine.cancel_agreement(id, &time).unwrap();

        let agreement = engine.agreement(id).unwrap();
        let paid: Vec<_> = agreement
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Paid)
            .collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].installment_number, 1);
    }

    #[test]
    fn test_update_regenerates_only_unpaid_tail() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        engine
            .pay_next_installment(
                crate::types::InstallmentScope::ForAgreement(id),
                money("300.00"),
                PaymentDetails::default(),
                &time,
            )
            .unwrap();

        // remaining debt 700.00 at a new 350.00 monthly -> 2 more installments
        engine
            .update_agreement(
                id,
                UpdateAgreement {
                    monthly_amount: Some(money("350.00")),
                    ..Default::default()
                },
                &time,
            )
            .unwrap();

        let agreement = engine.agreement(id).unwrap();
        assert_eq!(agreement.installments_count, 3);
        assert_eq!(agreement.monthly_amount, money("350.00"));

        let paid: Vec<_> = agreement
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Paid)
            .collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].amount, money("300.00"));

        let mut unpaid: Vec<_> = agreement
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Pending)
            .collect();
        unpaid.sort_by_key(|i| i.installment_number);
        assert_eq!(unpaid[0].installment_number, 2);
        assert_eq!(unpaid[0].amount, money("350.00"));
        assert_eq!(unpaid[0].due_date, date(2024, 2, 15));
        assert_eq!(unpaid[1].amount, money("350.00"));

        let total: Money = agreement.installments.iter().map(|i| i.amount).sum();
        assert_eq!(total, money("1000.00"));
    }

    #[test]
    fn test_update_rejects_monthly_above_remaining_debt() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();

        let err = engine
            .update_agreement(
                id,
                UpdateAgreement {
                    monthly_amount: Some(money("2000.00")),
                    ..Default::default()
                },
                &time,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AgreementError::MonthlyAmountExceedsDebt { .. }
        ));
    }

    #[test]
    fn test_update_notes_only_touches_nothing_else() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        let before: Vec<_> = engine
            .agreement(id)
            .unwrap()
            .installments
            .iter()
            .map(|i| i.id)
            .collect();

        engine
            .update_agreement(
                id,
                UpdateAgreement {
                    notes: Some("rescheduled by board decision".to_string()),
                    ..Default::default()
                },
                &time,
            )
            .unwrap();

        let agreement = engine.agreement(id).unwrap();
        assert_eq!(
            agreement.notes.as_deref(),
            Some("rescheduled by board decision")
        );
        let after: Vec<_> = agreement.installments.iter().map(|i| i.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_mark_defaulted_is_terminal() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        engine.mark_defaulted(id, &time).unwrap();

        assert_eq!(
            engine.agreement(id).unwrap().status,
            AgreementStatus::Defaulted
        );
        let err = engine.mark_defaulted(id, &time).unwrap_err();
        assert!(matches!(err, AgreementError::AgreementNotActive { .. }));
    }

    #[test]
    fn test_document_payload_carries_fees_and_schedule() {
        let (mut engine, property, fees) = seeded_engine();
        let time = frozen_time(2024, 1, 2);

        let id = engine
            .create_agreement(create_request(&property, &fees), &time)
            .unwrap();
        let document = engine.agreement_document(id).unwrap();

        assert_eq!(document.folded_fees.len(), 4);
        assert_eq!(document.agreement.installments.len(), 4);
        assert!(document.to_json_pretty().unwrap().contains("AGR-2024-00001"));
    }
}
