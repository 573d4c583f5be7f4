//! 封面报告、汇总与警告文本
//!
//! 版式为固定文本，给会计人员打印与核对；每一处空格与换行都是版式的一部分。

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;

use crate::error::SapError;
use crate::models::amount;
use crate::models::{NormalizedInvoice, SAP_PAYMENT_METHOD};

const ADDRESS_INDENT: &str = "         ";

/// 每张发票一页封面，页尾为换页符
pub fn render_report(today: NaiveDate, invoices: &[NormalizedInvoice]) -> Result<String, SapError> {
    let today_string = today.format("%m/%d/%Y").to_string();
    let mut report = String::new();

    for invoice in invoices {
        let vendor = invoice.vendor_info()?;
        let address = &vendor.address;

        report.push_str(&format!("\n\n{:33}MIT LIBRARIES\n\n\n", ""));
        report.push_str(&format!("Date: {today_string:<36}Vendor code   : {}\n", vendor.code));
        report.push_str(&format!("{:>57}\n\n", "Accounting ID :"));
        report.push_str(&format!("Vendor:  {}\n", vendor.name));
        for line in &address.lines {
            report.push_str(&format!("{ADDRESS_INDENT}{line}\n"));
        }

        report.push_str(ADDRESS_INDENT);
        if let Some(city) = non_empty(&address.city) {
            report.push_str(&format!("{city}, "));
        }
        if let Some(state) = non_empty(&address.state_or_province) {
            report.push_str(&format!("{state} "));
        }
        if let Some(postal_code) = non_empty(&address.postal_code) {
            report.push_str(postal_code);
        }
        report.push_str(&format!("\n{ADDRESS_INDENT}{}\n\n", address.country_code));

        report.push_str("Invoice no.            Fiscal Account     Amount            Inv. Date\n");
        report.push_str("------------------     -----------------  -------------     ----------\n");
        let reference = invoice.external_reference();
        let invoice_date = invoice.date.format("%m/%d/%Y");
        for fund in invoice.funds.values() {
            report.push_str(&format!(
                "{reference:<23}{} {}     {:<18}{invoice_date}\n",
                fund.cost_object,
                fund.gl_account,
                amount::grouped(&fund.amount),
            ));
        }

        report.push_str("\n\n");
        report.push_str(&format!(
            "Total/Currency:             {}      {}\n\n",
            amount::grouped(&invoice.total_amount),
            invoice.currency
        ));
        report.push_str(&format!("Payment Method:  {}\n\n\n", invoice.payment_method));
        report.push_str(&format!("{:>44} {}\n\n", "Departmental Approval", "_".repeat(34)));
        report.push_str(&format!(
            "{:>50} {}\n\n\n",
            "Financial Services Approval",
            "_".repeat(28)
        ));
        report.push('\x0c');
    }

    Ok(report)
}

/// 汇总：文件名、问题警告、SAP 发票清单与合计，其它付款方式列在末尾
pub fn render_summary(
    problem_invoices: &[NormalizedInvoice],
    invoices: &[NormalizedInvoice],
    data_file_name: &str,
    control_file_name: &str,
) -> Result<String, SapError> {
    let mut summary = String::from("--- MIT Libraries--- Alma to SAP Invoice Feed\n\n\n\n");
    summary.push_str(&format!("Data file: {data_file_name}\n\n"));
    summary.push_str(&format!("Control file: {control_file_name}\n\n\n\n"));
    if !problem_invoices.is_empty() {
        summary.push_str(&render_warning(problem_invoices));
    }

    let mut excluded = String::new();
    let mut invoice_count = 0usize;
    let mut total = BigDecimal::zero();
    for invoice in invoices {
        let vendor = invoice.vendor_info()?;
        if invoice.payment_method == SAP_PAYMENT_METHOD {
            summary.push_str(&format!(
                "{:<39.39}{:<20.20}{}\n",
                vendor.name,
                invoice.external_reference(),
                amount::fixed2(&invoice.total_amount)
            ));
            total += &invoice.total_amount;
            invoice_count += 1;
        } else {
            excluded.push_str(&format!(
                "{}:\t{}\t{}\t{}\n",
                invoice.payment_method, invoice.number, vendor.name, vendor.code
            ));
        }
    }

    summary.push_str(&format!("\nTotal payment:       ${}\n\n", amount::grouped(&total)));
    summary.push_str(&format!("Invoice count:       {invoice_count}\n\n\n"));
    summary.push_str("Authorized signature __________________________________\n\n\n");
    summary.push_str(&excluded);
    Ok(summary)
}

/// 问题发票警告：基金错误、多字节字符、地址错误依次列出
pub fn render_warning(problem_invoices: &[NormalizedInvoice]) -> String {
    let mut warning = String::new();
    for invoice in problem_invoices {
        warning.push_str(&format!("Warning! Invoice: {}\n", invoice.id));
        for fund_code in &invoice.problems.fund_errors {
            warning.push_str(&format!(
                "There was a problem retrieving data\nfor fund: {fund_code}\n\n"
            ));
        }
        for occurrence in &invoice.problems.multibyte_errors {
            warning.push_str(&format!(
                "Invoice field: {}\nContains multibyte character: {}\n\n",
                occurrence.field, occurrence.character
            ));
        }
        if let Some(vendor_code) = &invoice.problems.vendor_address_error {
            warning.push_str(&format!("No addresses found for vendor: {vendor_code}\n\n"));
        }
    }
    warning.push_str("Please fix the above before starting a final-run\n\n");
    warning
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
