/// full lifecycle - overdue sweep, default policy, cancellation
use fee_agreement_rs::chrono::{NaiveDate, TimeZone, Utc};
use fee_agreement_rs::{
    AgreementEngine, CreateAgreement, EngineConfig, Fee, FeeStatus, Money, Property,
    SafeTimeProvider, TimeSource, Uuid,
};

fn frozen(y: i32, m: u32, d: u32) -> SafeTimeProvider {
    SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).single().unwrap_or_default(),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // default after 2 consecutive overdue installments
    let mut engine = AgreementEngine::new(EngineConfig::with_default_policy(2))?;

    let property = Property {
        id: Uuid::new_v4(),
        villa: "Los Cedros".to_string(),
        row_letter: "A".to_string(),
        number: 7,
        owner_name: "Jorge Paz".to_string(),
        owner_phone: Some("+51 999 555 111".to_string()),
    };
    engine.load_property(property.clone());

    let mut fee_ids = Vec::new();
    for month in 1..=3 {
        let fee = Fee {
            id: Uuid::new_v4(),
            property_id: property.id,
            amount: Money::from_major(250),
            paid_amount: Money::ZERO,
            status: FeeStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2023, month, 1).ok_or("bad date")?,
            year: 2023,
            month,
            reference: None,
            notes: None,
        };
        fee_ids.push(fee.id);
        engine.load_fee(fee)?;
    }

    let agreement_id = engine.create_agreement(
        CreateAgreement {
            property_id: property.id,
            fee_ids,
            monthly_amount: Money::from_major(300),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).ok_or("bad date")?,
            notes: Some("board-approved restructuring".to_string()),
        },
        &frozen(2024, 1, 2),
    )?;
    println!("created: {}", engine.agreement(agreement_id)?.agreement_number);

    // nothing due yet
    let outcome = engine.run_overdue_sweep(&frozen(2024, 1, 5));
    println!("sweep jan 5: {:?}", outcome);

    // two due dates lapse, the default policy fires
    let outcome = engine.run_overdue_sweep(&frozen(2024, 3, 1));
    println!("sweep mar 1: {:?}", outcome);
    println!("status: {:?}", engine.agreement(agreement_id)?.status);

    for event in engine.events.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
