use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::amount;
use super::fund::FundAllocation;
use super::vendor::VendorInfo;

/// SAP 付款方式: 只有该方式的发票进入数据文件
pub const SAP_PAYMENT_METHOD: &str = "ACCOUNTINGDEPARTMENT";

/// Alma 中 `{"value": ..., "desc": ...}` 形式的代码字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeValue {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

/// Alma 发票原始记录 (只保留 SAP 需要的字段)
#[derive(Debug, Clone, Deserialize)]
pub struct RawInvoiceRecord {
    pub id: String,
    pub number: String,
    pub invoice_date: String,
    pub vendor: CodeValue,
    pub payment_method: CodeValue,
    #[serde(deserialize_with = "amount::deserialize")]
    pub total_amount: BigDecimal,
    pub currency: CodeValue,
    pub invoice_lines: RawInvoiceLines,
}

impl RawInvoiceRecord {
    pub fn vendor_code(&self) -> &str {
        &self.vendor.value
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInvoiceLines {
    pub invoice_line: Vec<RawInvoiceLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInvoiceLine {
    pub fund_distribution: Vec<RawFundDistribution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFundDistribution {
    pub fund_code: CodeValue,
    #[serde(deserialize_with = "amount::deserialize")]
    pub amount: BigDecimal,
}

/// 采购类型，由供应商代码后缀决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceType {
    Monograph,
    Serial,
}

impl InvoiceType {
    pub fn from_vendor_code(vendor_code: &str) -> Self {
        if vendor_code.ends_with("-S") {
            InvoiceType::Serial
        } else {
            InvoiceType::Monograph
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Monograph => "monograph",
            InvoiceType::Serial => "serial",
        }
    }

    /// 写回序号参数时使用的类型标记
    pub fn sequence_tag(&self) -> &'static str {
        match self {
            InvoiceType::Monograph => "mono",
            InvoiceType::Serial => "ser",
        }
    }

    /// 邮件主题与附件名中的类型标记
    pub fn mail_label(&self) -> &'static str {
        match self {
            InvoiceType::Monograph => "mono",
            InvoiceType::Serial => "serial",
        }
    }

    /// 日志用的首字母大写复数形式，例如 `Monographs`
    pub fn title_plural(&self) -> &'static str {
        match self {
            InvoiceType::Monograph => "Monographs",
            InvoiceType::Serial => "Serials",
        }
    }
}

impl std::fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 多字节字符出现位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultibyteOccurrence {
    pub field: String,
    pub character: char,
}

/// 问题标记，三项相互独立
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemMarkers {
    pub vendor_address_error: Option<String>,
    pub fund_errors: Vec<String>,
    pub multibyte_errors: Vec<MultibyteOccurrence>,
}

impl ProblemMarkers {
    pub fn is_empty(&self) -> bool {
        self.vendor_address_error.is_none()
            && self.fund_errors.is_empty()
            && self.multibyte_errors.is_empty()
    }
}

/// 规范化后的发票
///
/// 序列化结果用于多字节字符检查，字段顺序即检查顺序；问题标记在发票字段之后单独检查。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInvoice {
    pub date: NaiveDate,
    pub id: String,
    pub number: String,
    #[serde(rename = "type")]
    pub invoice_type: InvoiceType,
    pub payment_method: String,
    pub total_amount: BigDecimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorInfo>,
    /// external_id -> 分配，按 external_id 升序
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub funds: BTreeMap<String, FundAllocation>,
    #[serde(skip)]
    pub problems: ProblemMarkers,
}

impl NormalizedInvoice {
    pub fn is_problem(&self) -> bool {
        !self.problems.is_empty()
    }

    /// 发票号 + 发票日期 (YYMMDD)，作为 SAP 外部参考号
    pub fn external_reference(&self) -> String {
        format!("{}{}", self.number, self.date.format("%y%m%d"))
    }

    pub fn field_value(&self, field: InvoiceField) -> &str {
        match field {
            InvoiceField::Type => self.invoice_type.as_str(),
            InvoiceField::PaymentMethod => &self.payment_method,
        }
    }

    /// 格式化前取供应商数据；问题发票没有供应商数据时返回错误
    pub fn vendor_info(&self) -> Result<&VendorInfo, crate::SapError> {
        self.vendor
            .as_ref()
            .ok_or_else(|| crate::SapError::IncompleteInvoice(self.id.clone()))
    }
}

/// 可用于拆分的发票字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceField {
    Type,
    PaymentMethod,
}
