//! 错误类型，按关注点划分

/// Alma API 调用错误
#[derive(Debug, thiserror::Error)]
pub enum AlmaError {
    /// 网络 / 传输层失败
    #[error("alma request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 非 2xx 响应
    #[error("alma returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应体不是预期的 JSON 结构
    #[error("failed to decode alma response: {0}")]
    Decode(#[from] serde_json::Error),

    /// 响应缺少约定字段
    #[error("malformed alma response: {0}")]
    MalformedResponse(String),

    /// 标记付款后返回的状态不是 PAID
    #[error("invoice '{invoice_id}' payment status is '{status}', expected 'PAID'")]
    UnexpectedPaymentStatus { invoice_id: String, status: String },

    /// API key 无法放进请求头
    #[error("alma api key is not a valid header value")]
    InvalidApiKey,

    #[error("invalid alma api url '{0}'")]
    InvalidBaseUrl(String),
}

impl AlmaError {
    /// Alma 用错误码 402880 表示供应商不存在
    pub fn is_vendor_not_found(&self) -> bool {
        match self {
            AlmaError::Status { body, .. } => error_codes(body).iter().any(|c| c == "402880"),
            _ => false,
        }
    }
}

/// 从 `{"errorList": {"error": [{"errorCode": ...}]}}` 中提取错误码
fn error_codes(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };
    value
        .pointer("/errorList/error")
        .and_then(|errors| errors.as_array())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("errorCode"))
                .map(|code| match code {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 外部传输 (参数存储 / dropbox / 邮件) 错误
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parameter '{0}' not found")]
    ParameterNotFound(String),

    #[error("{service} rejected request with status {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },
}

/// 处理流程错误
#[derive(Debug, thiserror::Error)]
pub enum SapError {
    #[error(transparent)]
    Alma(#[from] AlmaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 序号少于三位或不是数字
    #[error("Invalid SAP sequence: '{0}', number must be three or more digits.")]
    SequenceFormat(String),

    #[error("invoice '{invoice_id}' has invalid invoice date '{value}'")]
    InvalidInvoiceDate { invoice_id: String, value: String },

    /// 格式化时遇到缺少供应商数据的发票 (问题发票不应进入格式化)
    #[error("invoice '{0}' has no vendor data and cannot be formatted")]
    IncompleteInvoice(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_not_found_is_detected_from_error_list() {
        let err = AlmaError::Status {
            status: 400,
            body: r#"{"errorList": {"error": [{"errorCode":"402880"}]}}"#.to_string(),
        };
        assert!(err.is_vendor_not_found());

        let other = AlmaError::Status {
            status: 400,
            body: r#"{"errorList": {"error": [{"errorCode":"a-different-error"}]}}"#.to_string(),
        };
        assert!(!other.is_vendor_not_found());

        let plain = AlmaError::Status {
            status: 500,
            body: "Error message".to_string(),
        };
        assert!(!plain.is_vendor_not_found());
    }
}
