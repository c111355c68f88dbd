/// oldest-first payments across several agreements
use fee_agreement_rs::chrono::{NaiveDate, TimeZone, Utc};
use fee_agreement_rs::{
    AgreementEngine, CreateAgreement, EngineConfig, Fee, FeeStatus, InstallmentScope, Money,
    PaymentDetails, Property, SafeTimeProvider, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0)
            .single()
            .unwrap_or_default(),
    ));
    let mut engine = AgreementEngine::new(EngineConfig::standard())?;

    let property = Property {
        id: Uuid::new_v4(),
        villa: "Las Palmas".to_string(),
        row_letter: "D".to_string(),
        number: 3,
        owner_name: "Elena Vidal".to_string(),
        owner_phone: None,
    };
    engine.load_property(property.clone());

    // two agreements with interleaved due dates
    for (amount, monthly, start_day) in [(600, 300, 1), (400, 200, 15)] {
        let fee = Fee {
            id: Uuid::new_v4(),
            property_id: property.id,
            amount: Money::from_major(amount),
            paid_amount: Money::ZERO,
            status: FeeStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2023, 11, 1).ok_or("bad date")?,
            year: 2023,
            month: 11,
            reference: None,
            notes: None,
        };
        let fee_id = fee.id;
        engine.load_fee(fee)?;
        engine.create_agreement(
            CreateAgreement {
                property_id: property.id,
                fee_ids: vec![fee_id],
                monthly_amount: Money::from_major(monthly),
                start_date: NaiveDate::from_ymd_opt(2024, 2, start_day).ok_or("bad date")?,
                notes: None,
            },
            &time,
        )?;
    }

    // drain the queue oldest-first
    while let Some(next) = engine.next_payable_installment(InstallmentScope::Global) {
        println!(
            "paying {} #{} due {} ({})",
            next.agreement_number,
            next.installment.installment_number,
            next.installment.due_date,
            next.installment.amount,
        );
        engine.pay_next_installment(
            InstallmentScope::Global,
            next.installment.amount,
            PaymentDetails::default(),
            &time,
        )?;
    }

    println!("all agreements settled");
    Ok(())
}
