pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod numbering;
pub mod schedule;
pub mod state;
pub mod types;
pub mod views;

// re-export key types
pub use config::{DefaultPolicy, EngineConfig};
pub use decimal::Money;
pub use engine::{
    AdminInstallmentUpdate, AgreementEngine, AgreementFilter, CreateAgreement, SweepOutcome,
    UpdateAgreement,
};
pub use errors::{AgreementError, ErrorKind, Result};
pub use events::{Event, EventStore};
pub use numbering::AgreementNumberSequence;
pub use schedule::{build_schedule, installment_count, total_debt, ScheduledInstallment};
pub use state::{Agreement, Fee, Installment, Property};
pub use types::{
    AgreementId, AgreementStatus, FeeId, FeeStatus, InstallmentId, InstallmentScope,
    InstallmentStatus, PaymentDetails, PropertyId,
};
pub use views::{AgreementDocument, AgreementView, NextInstallment};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
