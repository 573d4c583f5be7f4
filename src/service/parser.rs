use chrono::NaiveDate;
use futures::TryStreamExt;
use indexmap::IndexSet;
use serde_json::Value;
use std::collections::BTreeMap;

use super::cache::{ValidationCache, VendorResolution};
use crate::alma::{AlmaApi, Lookup, WAITING_TO_BE_SENT};
use crate::error::{AlmaError, SapError};
use crate::models::{
    FundAllocation, InvoiceType, MultibyteOccurrence, NormalizedInvoice, ProblemMarkers,
    RawInvoiceRecord, VendorAddress, VendorInfo,
};

/// 单张发票的基金解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum FundResolution {
    /// external_id -> 合并后的分配
    Allocated(BTreeMap<String, FundAllocation>),
    /// 无法解析的基金代码，按出现顺序去重
    Failed(Vec<String>),
}

/// 拉取所有待发送发票，按 (供应商代码, 发票号) 排序
pub async fn retrieve_sorted_invoices(
    api: &dyn AlmaApi,
) -> Result<Vec<RawInvoiceRecord>, AlmaError> {
    let mut records: Vec<RawInvoiceRecord> =
        api.invoices_by_status(WAITING_TO_BE_SENT).try_collect().await?;
    records.sort_by(|a, b| {
        a.vendor_code()
            .cmp(b.vendor_code())
            .then_with(|| a.number.cmp(&b.number))
    });
    Ok(records)
}

/// 取出扁平字段；发票日期格式为 `YYYY-MM-DDZ`
pub fn extract(record: &RawInvoiceRecord) -> Result<NormalizedInvoice, SapError> {
    let date = NaiveDate::parse_from_str(&record.invoice_date, "%Y-%m-%dZ").map_err(|_| {
        SapError::InvalidInvoiceDate {
            invoice_id: record.id.clone(),
            value: record.invoice_date.clone(),
        }
    })?;

    Ok(NormalizedInvoice {
        date,
        id: record.id.clone(),
        number: record.number.clone(),
        invoice_type: InvoiceType::from_vendor_code(record.vendor_code()),
        payment_method: record.payment_method.value.clone(),
        total_amount: record.total_amount.clone(),
        currency: record.currency.value.clone(),
        vendor: None,
        funds: BTreeMap::new(),
        problems: ProblemMarkers::default(),
    })
}

/// 检查序列化后每个字符串字段中 UTF-8 编码超过一个字节的字符
pub fn check_for_multibyte(
    invoice: &NormalizedInvoice,
) -> Result<Vec<MultibyteOccurrence>, SapError> {
    let value = serde_json::to_value(invoice)?;
    let mut found = Vec::new();
    find_multibyte(&value, "", &mut found);

    // 问题标记里的供应商代码与基金代码同样会出现在警告中
    let markers = serde_json::json!({
        "vendor_address_error": invoice.problems.vendor_address_error,
        "fund_errors": invoice.problems.fund_errors,
    });
    find_multibyte(&markers, "", &mut found);
    Ok(found)
}

/// 递归遍历 JSON 值，路径形如 `vendor.address.lines[0]`
pub fn find_multibyte(value: &Value, path: &str, found: &mut Vec<MultibyteOccurrence>) {
    match value {
        Value::String(text) => {
            for character in text.chars().filter(|c| c.len_utf8() > 1) {
                found.push(MultibyteOccurrence {
                    field: path.to_string(),
                    character,
                });
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                find_multibyte(item, &format!("{path}[{idx}]"), found);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                find_multibyte(item, &child, found);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// 发票解析器：用同一个缓存解析一次运行内的全部发票
pub struct InvoiceParser<'a> {
    api: &'a dyn AlmaApi,
    cache: ValidationCache,
}

impl<'a> InvoiceParser<'a> {
    pub fn new(api: &'a dyn AlmaApi) -> Self {
        Self::with_cache(api, ValidationCache::new())
    }

    pub fn with_cache(api: &'a dyn AlmaApi, cache: ValidationCache) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    pub fn into_cache(self) -> ValidationCache {
        self.cache
    }

    /// 返回 (问题发票, 正常发票)，均保持输入顺序
    pub async fn parse(
        &mut self,
        records: &[RawInvoiceRecord],
    ) -> Result<(Vec<NormalizedInvoice>, Vec<NormalizedInvoice>), SapError> {
        let mut problem_invoices = Vec::new();
        let mut clean_invoices = Vec::new();

        for (idx, record) in records.iter().enumerate() {
            tracing::info!(
                "Extracting data for invoice record {}, record {} of {}",
                record.id,
                idx + 1,
                records.len()
            );
            let mut invoice = extract(record)?;

            match self.resolve_vendor(record.vendor_code()).await? {
                VendorResolution::Resolved(info) => invoice.vendor = Some(info),
                VendorResolution::NoAddress | VendorResolution::NotFound => {
                    invoice.problems.vendor_address_error = Some(record.vendor_code().to_string());
                }
            }

            match self.populate_funds(record).await? {
                FundResolution::Allocated(funds) => invoice.funds = funds,
                FundResolution::Failed(codes) => invoice.problems.fund_errors = codes,
            }

            invoice.problems.multibyte_errors = check_for_multibyte(&invoice)?;

            if invoice.is_problem() {
                tracing::warn!(
                    "Problem invoice {}: vendor_address_error={:?}, fund_errors={:?}, multibyte_errors={}",
                    invoice.id,
                    invoice.problems.vendor_address_error,
                    invoice.problems.fund_errors,
                    invoice.problems.multibyte_errors.len()
                );
                problem_invoices.push(invoice);
            } else {
                clean_invoices.push(invoice);
            }
        }

        Ok((problem_invoices, clean_invoices))
    }

    /// 查缓存，未命中时请求 Alma；成功与失败都会写入缓存
    pub async fn resolve_vendor(&mut self, vendor_code: &str) -> Result<VendorResolution, SapError> {
        if let Some(resolution) = self.cache.vendor(vendor_code) {
            return Ok(resolution.clone());
        }

        tracing::debug!("Retrieving data for vendor {}", vendor_code);
        let resolution = match self.api.vendor_details(vendor_code).await? {
            Lookup::Found(record) => match record.payment_address() {
                Some(address) => VendorResolution::Resolved(VendorInfo {
                    name: record.name.clone(),
                    code: vendor_code.to_string(),
                    address: VendorAddress::from_raw(address),
                }),
                None => {
                    tracing::warn!("No addresses found for vendor {}", vendor_code);
                    VendorResolution::NoAddress
                }
            },
            Lookup::NotFound => {
                tracing::warn!("Vendor {} not found in Alma", vendor_code);
                VendorResolution::NotFound
            }
        };

        self.cache.insert_vendor(vendor_code, resolution.clone());
        Ok(resolution)
    }

    /// 解析发票的全部基金分配，同一 external_id 的金额合并
    pub async fn populate_funds(
        &mut self,
        record: &RawInvoiceRecord,
    ) -> Result<FundResolution, SapError> {
        let mut funds: BTreeMap<String, FundAllocation> = BTreeMap::new();
        let mut errors: IndexSet<String> = IndexSet::new();

        for line in &record.invoice_lines.invoice_line {
            for distribution in &line.fund_distribution {
                let fund_code = distribution.fund_code.value.as_str();

                let fund = match self.cache.fund(fund_code) {
                    Some(fund) => fund.clone(),
                    None => {
                        tracing::debug!("Retrieving data for fund {}", fund_code);
                        match self.api.fund_by_code(fund_code).await? {
                            Lookup::Found(fund) => {
                                self.cache.insert_fund(fund_code, fund.clone());
                                fund
                            }
                            Lookup::NotFound => {
                                errors.insert(fund_code.to_string());
                                continue;
                            }
                        }
                    }
                };

                let Some((external_id, cost_object, gl_account)) = fund.ledger_target() else {
                    tracing::warn!(
                        "Fund {} has external id '{}' without a G/L account",
                        fund_code,
                        fund.external_id
                    );
                    errors.insert(fund_code.to_string());
                    continue;
                };

                funds
                    .entry(external_id.clone())
                    .and_modify(|allocation| {
                        allocation.amount = &allocation.amount + &distribution.amount
                    })
                    .or_insert_with(|| FundAllocation {
                        external_id,
                        amount: distribution.amount.clone(),
                        cost_object,
                        gl_account,
                    });
            }
        }

        if errors.is_empty() {
            Ok(FundResolution::Allocated(funds))
        } else {
            Ok(FundResolution::Failed(errors.into_iter().collect()))
        }
    }
}
