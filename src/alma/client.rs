use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{AlmaApi, Lookup};
use crate::error::AlmaError;
use crate::models::{amount, FundRecord, FundSearchResponse, RawInvoiceRecord, VendorRecord};

/// 每页最大记录数 (Alma 上限 100)
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Alma API 客户端
///
/// 每个请求之后固定等待 `request_delay`，避免超出 Alma 的调用频率限制。
/// 查询不到记录时 Alma 仍返回 200 和 `{"total_record_count": 0}`。
#[derive(Debug, Clone)]
pub struct AlmaClient {
    http: reqwest::Client,
    base_url: Url,
    request_delay: Duration,
    page_limit: usize,
}

/// [`AlmaClient`] 构建器
#[derive(Debug, Clone)]
pub struct AlmaClientBuilder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    request_delay: Duration,
    page_limit: usize,
}

impl AlmaClientBuilder {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            request_delay: Duration::from_millis(100),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.clamp(1, DEFAULT_PAGE_LIMIT);
        self
    }

    pub fn build(self) -> Result<AlmaClient, AlmaError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|_| AlmaError::InvalidBaseUrl(self.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(AlmaError::InvalidBaseUrl(self.base_url));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("apikey {}", self.api_key))
            .map_err(|_| AlmaError::InvalidApiKey)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(AlmaClient {
            http,
            base_url,
            request_delay: self.request_delay,
            page_limit: self.page_limit,
        })
    }
}

/// 分页游标
#[derive(Debug, Clone, Copy, Default)]
struct PageCursor {
    offset: usize,
    retrieved: usize,
    finished: bool,
}

impl AlmaClient {
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> AlmaClientBuilder {
        AlmaClientBuilder::new(base_url, api_key)
    }

    /// 拼接 endpoint，路径段逐个编码
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AlmaError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AlmaError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn throttle(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// 发送请求、校验状态并解析 JSON，然后等待固定间隔
    async fn execute(&self, request: RequestBuilder) -> Result<Value, AlmaError> {
        let result = Self::read_json(request).await;
        self.throttle().await;
        result
    }

    async fn read_json(request: RequestBuilder) -> Result<Value, AlmaError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AlmaError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// 分页拉取某 endpoint 的全部记录
    ///
    /// 以 offset/limit 翻页，累计条数达到 `total_record_count` 或遇到空页时结束。
    /// 流是惰性的：每被轮询到页尾才请求下一页；重新调用会从第一页开始。
    pub fn get_paged<'a, T>(
        &'a self,
        segments: Vec<String>,
        record_type: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxStream<'a, Result<T, AlmaError>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        stream::try_unfold(PageCursor::default(), move |cursor| {
            let segments = segments.clone();
            let params = params.clone();
            async move { self.fetch_page(&segments, record_type, &params, cursor).await }
        })
        .map_ok(|records: Vec<T>| stream::iter(records.into_iter().map(Ok::<T, AlmaError>)))
        .try_flatten()
        .boxed()
    }

    async fn fetch_page<T>(
        &self,
        segments: &[String],
        record_type: &str,
        params: &[(String, String)],
        cursor: PageCursor,
    ) -> Result<Option<(Vec<T>, PageCursor)>, AlmaError>
    where
        T: DeserializeOwned,
    {
        if cursor.finished {
            return Ok(None);
        }

        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let url = self.endpoint(&segments)?;
        let mut query: Vec<(String, String)> = params.to_vec();
        query.push(("limit".to_string(), self.page_limit.to_string()));
        query.push(("offset".to_string(), cursor.offset.to_string()));

        debug!(%url, offset = cursor.offset, limit = self.page_limit, "fetching page");
        let page = self.execute(self.http.get(url).query(&query)).await?;

        let total = page
            .get("total_record_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| AlmaError::MalformedResponse("missing total_record_count".into()))?
            as usize;
        let records: Vec<T> = match page.get(record_type) {
            Some(Value::Null) | None => Vec::new(),
            Some(items) => serde_json::from_value(items.clone())?,
        };

        let retrieved = cursor.retrieved + records.len();
        let next = PageCursor {
            offset: cursor.offset + self.page_limit,
            retrieved,
            finished: records.is_empty() || retrieved >= total,
        };
        debug!(retrieved, total, "page fetched");
        Ok(Some((records, next)))
    }
}

#[async_trait]
impl AlmaApi for AlmaClient {
    fn invoices_by_status<'a>(
        &'a self,
        status: &'a str,
    ) -> BoxStream<'a, Result<RawInvoiceRecord, AlmaError>> {
        self.get_paged(
            vec!["acq".to_string(), "invoices".to_string()],
            "invoice",
            vec![("invoice_workflow_status".to_string(), status.to_string())],
        )
    }

    async fn vendor_details(&self, vendor_code: &str) -> Result<Lookup<VendorRecord>, AlmaError> {
        let url = self.endpoint(&["acq", "vendors", vendor_code])?;
        match self.execute(self.http.get(url)).await {
            Ok(value) => Ok(Lookup::Found(serde_json::from_value(value)?)),
            Err(err) if err.is_vendor_not_found() => Ok(Lookup::NotFound),
            Err(err) => Err(err),
        }
    }

    async fn fund_by_code(&self, fund_code: &str) -> Result<Lookup<FundRecord>, AlmaError> {
        let url = self.endpoint(&["acq", "funds"])?;
        let query = [("q", format!("fund_code~{fund_code}")), ("view", "full".to_string())];
        let value = self.execute(self.http.get(url).query(&query)).await?;
        let response: FundSearchResponse = serde_json::from_value(value)?;
        if response.total_record_count == 0 {
            return Ok(Lookup::NotFound);
        }
        Ok(response
            .fund
            .into_iter()
            .next()
            .map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn mark_invoice_paid(
        &self,
        invoice_id: &str,
        payment_date: DateTime<Utc>,
        amount: &BigDecimal,
        currency: &str,
    ) -> Result<(), AlmaError> {
        let url = self.endpoint(&["acq", "invoices", invoice_id])?;
        let body = json!({
            "payment": {
                "voucher_date": payment_date.format("%Y-%m-%dT12:00:00Z").to_string(),
                "voucher_amount": amount::fixed2(amount),
                "voucher_currency": {"value": currency},
            }
        });
        let value = self
            .execute(self.http.post(url).query(&[("op", "paid")]).json(&body))
            .await?;

        let status = value
            .pointer("/payment/payment_status/value")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if status != "PAID" {
            return Err(AlmaError::UnexpectedPaymentStatus {
                invoice_id: invoice_id.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
