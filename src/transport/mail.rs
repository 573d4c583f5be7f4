use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Mailer;
use crate::error::TransportError;
use crate::models::InvoiceType;

/// 发件人 / 收件人配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub from_address: String,
    pub reply_to: String,
    pub final_recipients: String,
    pub review_recipients: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// 发给财务人员的汇总 + 报告邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl ReportEmail {
    /// 按运行类型组装邮件：正文为汇总，报告作为附件
    pub fn for_run(
        settings: &MailSettings,
        summary: &str,
        report: &str,
        invoice_type: InvoiceType,
        date: DateTime<Utc>,
        final_run: bool,
    ) -> Self {
        let label = invoice_type.mail_label();
        let day = date.format("%Y%m%d");
        let stamp = date.format("%Y%m%d%H%M%S");
        let (recipients, subject, filename) = if final_run {
            (
                &settings.final_recipients,
                format!("Libraries invoice feed - {label}s - {day}"),
                format!("cover_sheets_{label}_{stamp}.txt"),
            )
        } else {
            (
                &settings.review_recipients,
                format!("REVIEW libraries invoice feed - {label}s - {day}"),
                format!("review_{label}_report_{stamp}.txt"),
            )
        };

        Self {
            from: settings.from_address.clone(),
            to: split_addresses(recipients),
            reply_to: settings.reply_to.clone(),
            subject,
            body: summary.to_string(),
            attachments: vec![Attachment {
                filename,
                content: report.to_string(),
            }],
        }
    }
}

/// 逗号分隔的地址列表
fn split_addresses(addresses: &str) -> Vec<String> {
    addresses
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// 通过 HTTP 邮件中继发送：POST JSON，响应 `{"message_id": ...}`
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    message_id: String,
}

impl HttpMailRelay {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, email: &ReportEmail) -> Result<String, TransportError> {
        let response = self.http.post(&self.endpoint).json(email).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::Rejected {
                service: "mail relay",
                status: status.as_u16(),
                body,
            });
        }
        let parsed: RelayResponse = serde_json::from_str(&body)?;
        Ok(parsed.message_id)
    }
}
