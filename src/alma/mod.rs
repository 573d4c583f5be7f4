pub mod client;

pub use client::{AlmaClient, AlmaClientBuilder};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::AlmaError;
use crate::models::{FundRecord, RawInvoiceRecord, VendorRecord};

/// 待发送发票的工作流状态
pub const WAITING_TO_BE_SENT: &str = "Waiting to be Sent";

/// 查询结果：找到 / 明确不存在；其它失败走 `Err`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

/// SAP 处理用到的 Alma 接口
#[async_trait]
pub trait AlmaApi: Send + Sync {
    /// 按状态分页拉取发票；每次从头开始，逐页产出
    fn invoices_by_status<'a>(
        &'a self,
        status: &'a str,
    ) -> BoxStream<'a, Result<RawInvoiceRecord, AlmaError>>;

    async fn vendor_details(&self, vendor_code: &str) -> Result<Lookup<VendorRecord>, AlmaError>;

    async fn fund_by_code(&self, fund_code: &str) -> Result<Lookup<FundRecord>, AlmaError>;

    /// 标记为已付款；返回状态不是 PAID 视为失败
    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        payment_date: DateTime<Utc>,
        amount: &BigDecimal,
        currency: &str,
    ) -> Result<(), AlmaError>;
}
