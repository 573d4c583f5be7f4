use std::path::Path;

use crate::error::SapError;
use crate::models::amount;
use crate::models::PaymentOutcome;

const LEDGER_HEADER: [&str; 6] = ["invoice_id", "number", "amount", "currency", "paid", "error"];

/// 导出标记付款结果到 CSV
pub fn export_payment_ledger(outcomes: &[PaymentOutcome], output_path: &Path) -> Result<(), SapError> {
    use csv::Writer;

    let mut writer = Writer::from_path(output_path)?;
    writer.write_record(LEDGER_HEADER)?;
    for outcome in outcomes {
        writer.write_record(&[
            outcome.invoice_id.clone(),
            outcome.number.clone(),
            amount::fixed2(&outcome.amount),
            outcome.currency.clone(),
            outcome.paid.to_string(),
            outcome.error.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
