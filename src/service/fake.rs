//! 测试用的内存 Alma 实现与样例数据

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;

use crate::alma::{AlmaApi, Lookup};
use crate::error::AlmaError;
use crate::models::{FundRecord, RawInvoiceRecord, VendorRecord};

#[derive(Default)]
pub struct FakeAlma {
    pub invoices: Vec<RawInvoiceRecord>,
    pub vendors: HashMap<String, VendorRecord>,
    pub funds: HashMap<String, FundRecord>,
    /// 查询时返回 500 的供应商代码
    pub broken_vendors: HashSet<String>,
    /// 标记付款时返回错误的发票
    pub failing_payments: HashSet<String>,
    vendor_calls: Mutex<Vec<String>>,
    fund_calls: Mutex<Vec<String>>,
    paid: Mutex<Vec<String>>,
}

impl FakeAlma {
    pub fn sample() -> Self {
        let mut alma = FakeAlma {
            invoices: sample_invoices(),
            ..Default::default()
        };

        let san_francisco = json!({
            "address_type": [{"value": "payment", "desc": "Payment"}],
            "line1": "123 salad Street",
            "line2": "Second Floor",
            "city": "San Francisco",
            "state_province": "CA",
            "postal_code": "94109",
            "country": {"value": "USA"}
        });
        let cambridge = json!({
            "address_type": [{"value": "order"}],
            "line1": "123 Main Street",
            "city": "Cambridge",
            "state_province": "MA",
            "postal_code": "02139",
            "country": {"value": "USA"}
        });

        alma.add_vendor("DANGER-M", json!({
            "name": "Danger Inc.",
            "contact_info": {"address": [san_francisco.clone()]}
        }));
        alma.add_vendor("SALAD-M", json!({
            "name": "some library solutions from salad",
            "contact_info": {"address": [cambridge.clone(), san_francisco]}
        }));
        alma.add_vendor("FOOBAR", json!({
            "name": "Foo Bar Books",
            "contact_info": {"address": [cambridge.clone()]}
        }));
        alma.add_vendor("FOOBAR-S", json!({
            "name": "Foo Bar Serials",
            "contact_info": {"address": [cambridge]}
        }));
        alma.add_vendor("YBP-NOADDR", json!({
            "name": "No Address Books",
            "contact_info": {"address": []}
        }));
        alma.add_vendor("MULTI-M", json!({
            "name": "Multibyte Books",
            "contact_info": {"address": [{
                "address_type": [{"value": "payment"}],
                "line1": "Grüne Gasse 5",
                "city": "Berlin",
                "postal_code": "10115",
                "country": {"value": "DEU"}
            }]}
        }));

        alma.add_fund("ABC", "1234567-000001");
        alma.add_fund("DEF", " 1234567-000001 ");
        alma.add_fund("GHI", "1234567-000002");
        alma
    }

    pub fn add_vendor(&mut self, code: &str, record: Value) {
        let record = serde_json::from_value(record).expect("vendor fixture");
        self.vendors.insert(code.to_string(), record);
    }

    pub fn add_fund(&mut self, code: &str, external_id: &str) {
        self.funds.insert(
            code.to_string(),
            FundRecord {
                code: Some(code.to_string()),
                external_id: external_id.to_string(),
            },
        );
    }

    pub fn vendor_calls(&self) -> Vec<String> {
        self.vendor_calls.lock().unwrap().clone()
    }

    pub fn fund_calls(&self) -> Vec<String> {
        self.fund_calls.lock().unwrap().clone()
    }

    pub fn paid(&self) -> Vec<String> {
        self.paid.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlmaApi for FakeAlma {
    fn invoices_by_status<'a>(
        &'a self,
        _status: &'a str,
    ) -> BoxStream<'a, Result<RawInvoiceRecord, AlmaError>> {
        stream::iter(self.invoices.clone().into_iter().map(Ok)).boxed()
    }

    async fn vendor_details(&self, vendor_code: &str) -> Result<Lookup<VendorRecord>, AlmaError> {
        self.vendor_calls.lock().unwrap().push(vendor_code.to_string());
        if self.broken_vendors.contains(vendor_code) {
            return Err(AlmaError::Status {
                status: 500,
                body: "Error message".to_string(),
            });
        }
        Ok(match self.vendors.get(vendor_code) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn fund_by_code(&self, fund_code: &str) -> Result<Lookup<FundRecord>, AlmaError> {
        self.fund_calls.lock().unwrap().push(fund_code.to_string());
        Ok(match self.funds.get(fund_code) {
            Some(record) => Lookup::Found(record.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        _payment_date: DateTime<Utc>,
        _amount: &BigDecimal,
        _currency: &str,
    ) -> Result<(), AlmaError> {
        if self.failing_payments.contains(invoice_id) {
            return Err(AlmaError::UnexpectedPaymentStatus {
                invoice_id: invoice_id.to_string(),
                status: "WRONG".to_string(),
            });
        }
        self.paid.lock().unwrap().push(invoice_id.to_string());
        Ok(())
    }
}

/// 付款方式为 ACCOUNTINGDEPARTMENT、基金 ABC 150.00 的发票
pub fn invoice(id: &str, vendor: &str, number: &str, date: &str) -> RawInvoiceRecord {
    invoice_with(id, vendor, number, date, "ACCOUNTINGDEPARTMENT", &[("ABC", "150.00")])
}

pub fn invoice_with(
    id: &str,
    vendor: &str,
    number: &str,
    date: &str,
    payment_method: &str,
    distributions: &[(&str, &str)],
) -> RawInvoiceRecord {
    let total = distributions
        .iter()
        .fold(BigDecimal::zero(), |sum, (_, amount)| {
            sum + BigDecimal::from_str(amount).expect("amount fixture")
        });
    let lines: Vec<Value> = distributions
        .iter()
        .map(|(code, amount)| {
            json!({
                "fund_distribution": [{
                    "fund_code": {"value": code},
                    "amount": serde_json::from_str::<Value>(amount).expect("amount fixture")
                }]
            })
        })
        .collect();

    serde_json::from_value(json!({
        "id": id,
        "number": number,
        "invoice_date": date,
        "vendor": {"value": vendor},
        "payment_method": {"value": payment_method},
        "total_amount": serde_json::from_str::<Value>(&total.to_string()).expect("total fixture"),
        "currency": {"value": "USD"},
        "invoice_lines": {"invoice_line": lines}
    }))
    .expect("invoice fixture")
}

/// 四张正常发票在前，三张问题发票在后
pub fn sample_invoices() -> Vec<RawInvoiceRecord> {
    vec![
        invoice_with(
            "0501130656",
            "DANGER-M",
            "456789",
            "2021-05-12Z",
            "ACCOUNTINGDEPARTMENT",
            &[("ABC", "150.00")],
        ),
        invoice_with(
            "0501130657",
            "SALAD-M",
            "444555",
            "2021-05-11Z",
            "ACCOUNTINGDEPARTMENT",
            &[("ABC", "1000.00"), ("GHI", "50.00"), ("DEF", "67.04")],
        ),
        invoice_with(
            "0501130658",
            "FOOBAR",
            "12345",
            "2021-05-10Z",
            "BAZ",
            &[("ABC", "100.00")],
        ),
        invoice_with(
            "0501130659",
            "FOOBAR-S",
            "67890",
            "2021-05-10Z",
            "ACCOUNTINGDEPARTMENT",
            &[("GHI", "200.00")],
        ),
        invoice_with(
            "9991",
            "YBP-NOADDR",
            "1111",
            "2021-05-10Z",
            "ACCOUNTINGDEPARTMENT",
            &[("ABC", "10.00")],
        ),
        invoice_with(
            "9992",
            "DANGER-M",
            "2222",
            "2021-05-10Z",
            "ACCOUNTINGDEPARTMENT",
            &[("NOTFOUND", "1.00"), ("OVEREXPENDED", "1.00"), ("NOTFOUND", "1.00"), ("ABC", "1.00")],
        ),
        invoice_with(
            "9993",
            "MULTI-M",
            "3333",
            "2021-05-10Z",
            "ACCOUNTINGDEPARTMENT",
            &[("ABC", "5.00")],
        ),
    ]
}
