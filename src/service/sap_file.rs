//! SAP 数据文件与控制文件
//!
//! 数据文件每张发票一行 `B` 抬头，后跟每个基金一行，最后一行以 `D` 开头，其余以 `C` 开头。
//! 控制文件汇总数据文件的字节数、行数与金额。

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;

use crate::error::SapError;
use crate::models::amount;
use crate::models::{NormalizedInvoice, SapFileSet};

/// 控制文件第四段，应付账款部门给定的固定值
const CONTROL_TRAILER: &str = "00100100000000000000";

/// `dlibsapg.<seq>.<YYYYMMDD>000000` 与对应的 `clibsapg...`
pub fn file_names(sequence: &str, date: NaiveDate) -> (String, String) {
    let date_string = date.format("%Y%m%d000000");
    (
        format!("dlibsapg.{sequence}.{date_string}"),
        format!("clibsapg.{sequence}.{date_string}"),
    )
}

pub fn invoices_total(invoices: &[NormalizedInvoice]) -> BigDecimal {
    invoices
        .iter()
        .fold(BigDecimal::zero(), |total, invoice| total + &invoice.total_amount)
}

pub fn generate_data(today: NaiveDate, invoices: &[NormalizedInvoice]) -> Result<String, SapError> {
    let today_string = today.format("%Y%m%d").to_string();
    let mut data = String::new();

    for invoice in invoices {
        let vendor = invoice.vendor_info()?;
        let address = &vendor.address;
        let payee_line_2 = address.lines.first().map(String::as_str).unwrap_or("");
        let street = address.lines.get(1).map(String::as_str).unwrap_or(" ");
        let payee_line_3 = address.lines.get(2).map(String::as_str).unwrap_or(" ");

        // 凭证日期与基准日期
        data.push('B');
        data.push_str(&today_string);
        data.push_str(&today_string);
        data.push_str(&format!("{:<16.16}", invoice.external_reference()));
        data.push_str("X000");
        data.push_str("400000");
        data.push_str(&format!("{:>16}", amount::fixed2(&invoice.total_amount)));
        // 金额符号、付款方式、付款方式补充、付款条件、冻结标记均留空
        data.push(' ');
        data.push(' ');
        data.push_str("  ");
        data.push_str("    ");
        data.push(' ');
        data.push('X');
        data.push_str(&format!("{:<35.35}", vendor.name));
        data.push_str(&format!("{:<35.35}", address.city.as_deref().unwrap_or(" ")));
        data.push_str(&format!("{payee_line_2:<35.35}"));
        // PO Box 标记
        data.push(' ');
        data.push_str(&format!("{street:<35.35}"));
        data.push_str(&format!("{:<10.10}", address.postal_code.as_deref().unwrap_or(" ")));
        data.push_str(&format!(
            "{:<3.3}",
            address.state_or_province.as_deref().unwrap_or(" ")
        ));
        data.push_str(&format!("{:<3.3}", address.country_code));
        data.push_str(&format!("{:<50.50}", " "));
        data.push_str(&format!("{payee_line_3:<35.35}"));
        data.push('\n');

        let last = invoice.funds.len().saturating_sub(1);
        for (idx, fund) in invoice.funds.values().enumerate() {
            data.push(if idx == last { 'D' } else { 'C' });
            data.push_str(&format!("{:<10.10}", fund.gl_account));
            data.push_str(&format!("{:<12.12}", fund.cost_object));
            data.push_str(&format!("{:>16}", amount::fixed2(&fund.amount)));
            data.push(' ');
            data.push('\n');
        }
    }

    Ok(data)
}

pub fn generate_control(data_contents: &str, invoice_total: &BigDecimal) -> String {
    let total_cents = amount::cents(invoice_total, 20);
    let mut control = String::with_capacity(113);
    control.push_str(&format!("{:016}", data_contents.len()));
    control.push_str(&format!("{:016}", data_contents.lines().count()));
    // 贷方合计，不发送贷项
    control.push_str(&"0".repeat(20));
    control.push_str(&total_cents);
    control.push_str(&total_cents);
    control.push_str(CONTROL_TRAILER);
    control.push('\n');
    control
}

/// 生成一个类别的数据文件、控制文件及其文件名
pub fn build_file_set(
    sequence: &str,
    today: NaiveDate,
    invoices: &[NormalizedInvoice],
) -> Result<SapFileSet, SapError> {
    let (data_file_name, control_file_name) = file_names(sequence, today);
    let data_contents = generate_data(today, invoices)?;
    let control_contents = generate_control(&data_contents, &invoices_total(invoices));
    Ok(SapFileSet {
        data_contents,
        control_contents,
        data_file_name,
        control_file_name,
    })
}
