/// quick start - minimal example to get started
use fee_agreement_rs::{
    AgreementEngine, CreateAgreement, EngineConfig, Fee, FeeStatus, InstallmentScope, Money,
    PaymentDetails, Property, SafeTimeProvider, TimeSource, Uuid,
};
use fee_agreement_rs::chrono::NaiveDate;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut engine = AgreementEngine::new(EngineConfig::standard())?;

    // register a property and one outstanding fee
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
        amount: Money::from_major(900),
        paid_amount: Money::ZERO,
        status: FeeStatus::Pending,
        due_date: NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?,
        year: 2024,
        month: 1,
        reference: None,
        notes: None,
    };
    engine.load_fee(fee.clone())?;

    // restructure the debt into 300/month installments
    let agreement_id = engine.create_agreement(
        CreateAgreement {
            property_id: property.id,
            fee_ids: vec![fee.id],
            monthly_amount: Money::from_major(300),
            start_date: NaiveDate::from_ymd_opt(2024, 2, 15).ok_or("bad date")?,
            notes: None,
        },
        &time,
    )?;

    // pay the first installment
    engine.pay_next_installment(
        InstallmentScope::ForAgreement(agreement_id),
        Money::from_major(300),
        PaymentDetails::with_reference("OP-0001"),
        &time,
    )?;

    // print current state
    println!("{}", engine.agreement_view(agreement_id)?.to_json_pretty()?);

    Ok(())
}
