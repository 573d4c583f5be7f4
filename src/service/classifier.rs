use crate::models::{InvoiceField, NormalizedInvoice};

/// 按字段值把发票分成两组，组内保持输入顺序
///
/// 未给出 `second_value` 时，第二组收集所有不等于 `first_value` 的发票；
/// 给出时，两个值都不匹配的发票不进入任何一组。
pub fn split(
    invoices: &[NormalizedInvoice],
    field: InvoiceField,
    first_value: &str,
    second_value: Option<&str>,
) -> (Vec<NormalizedInvoice>, Vec<NormalizedInvoice>) {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for invoice in invoices {
        let value = invoice.field_value(field);
        if value == first_value {
            first.push(invoice.clone());
        } else if second_value.map_or(true, |expected| value == expected) {
            second.push(invoice.clone());
        }
    }
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceType, ProblemMarkers};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn invoice(id: &str, invoice_type: InvoiceType, payment_method: &str) -> NormalizedInvoice {
        NormalizedInvoice {
            date: NaiveDate::from_ymd_opt(2021, 5, 12).unwrap(),
            id: id.to_string(),
            number: id.to_string(),
            invoice_type,
            payment_method: payment_method.to_string(),
            total_amount: BigDecimal::from(1),
            currency: "USD".to_string(),
            vendor: None,
            funds: BTreeMap::new(),
            problems: ProblemMarkers::default(),
        }
    }

    fn ids(invoices: &[NormalizedInvoice]) -> Vec<&str> {
        invoices.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn split_by_type_with_both_values() {
        let invoices = vec![
            invoice("1", InvoiceType::Serial, "ACCOUNTINGDEPARTMENT"),
            invoice("2", InvoiceType::Monograph, "ACCOUNTINGDEPARTMENT"),
            invoice("3", InvoiceType::Serial, "BAZ"),
        ];
        let (monographs, serials) = split(&invoices, InvoiceField::Type, "monograph", Some("serial"));
        assert_eq!(ids(&monographs), vec!["2"]);
        assert_eq!(ids(&serials), vec!["1", "3"]);
    }

    #[test]
    fn split_without_second_value_collects_the_rest() {
        let invoices = vec![
            invoice("1", InvoiceType::Monograph, "ACCOUNTINGDEPARTMENT"),
            invoice("2", InvoiceType::Monograph, "BAZ"),
            invoice("3", InvoiceType::Monograph, "CREDITCARD"),
        ];
        let (sap, other) = split(&invoices, InvoiceField::PaymentMethod, "ACCOUNTINGDEPARTMENT", None);
        assert_eq!(ids(&sap), vec!["1"]);
        assert_eq!(ids(&other), vec!["2", "3"]);
    }

    #[test]
    fn split_with_second_value_drops_unmatched() {
        let invoices = vec![
            invoice("1", InvoiceType::Monograph, "ACCOUNTINGDEPARTMENT"),
            invoice("2", InvoiceType::Monograph, "BAZ"),
            invoice("3", InvoiceType::Monograph, "CREDITCARD"),
        ];
        let (sap, baz) = split(&invoices, InvoiceField::PaymentMethod, "ACCOUNTINGDEPARTMENT", Some("BAZ"));
        assert_eq!(ids(&sap), vec!["1"]);
        assert_eq!(ids(&baz), vec!["2"]);
    }
}
