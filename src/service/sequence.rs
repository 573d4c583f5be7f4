use chrono::NaiveDate;

use crate::error::SapError;
use crate::models::InvoiceType;
use crate::transport::ParameterStore;

/// 读取 / 推进 / 写回 SAP 序号参数 `"<sequence>,<timestamp>,<type>"`
///
/// 读取与写回之间没有加锁，两个并发的正式运行可能拿到同一个序号。
pub struct SequenceManager<'a> {
    store: &'a dyn ParameterStore,
    key: String,
}

impl<'a> SequenceManager<'a> {
    pub fn new(store: &'a dyn ParameterStore, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// 当前序号加一，保持原有位数
    pub async fn next_sequence(&self) -> Result<String, SapError> {
        let parameter = self.store.get(&self.key).await?;
        let current = parse_sequence(&parameter)?;
        tracing::debug!("Current SAP sequence parameter: {}", parameter);
        increment(current)
    }

    pub async fn update_sequence(
        &self,
        sequence: &str,
        date: NaiveDate,
        invoice_type: InvoiceType,
    ) -> Result<(), SapError> {
        let value = sequence_value(sequence, date, invoice_type);
        self.store.put(&self.key, &value).await?;
        Ok(())
    }
}

/// 取出参数中的序号部分，要求至少三位数字
pub fn parse_sequence(parameter: &str) -> Result<&str, SapError> {
    let sequence = parameter.split(',').next().unwrap_or_default().trim();
    if sequence.len() < 3 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SapError::SequenceFormat(sequence.to_string()));
    }
    Ok(sequence)
}

/// 十进制加一，左侧补零到原宽度：`0003` -> `0004`，`999` -> `1000`
pub fn increment(sequence: &str) -> Result<String, SapError> {
    let number: u64 = sequence
        .parse()
        .map_err(|_| SapError::SequenceFormat(sequence.to_string()))?;
    let next = number
        .checked_add(1)
        .ok_or_else(|| SapError::SequenceFormat(sequence.to_string()))?;
    Ok(format!("{next:0width$}", width = sequence.len()))
}

/// 写回参数的值，日期右侧补零到 14 位
pub fn sequence_value(sequence: &str, date: NaiveDate, invoice_type: InvoiceType) -> String {
    format!(
        "{},{:0<14},{}",
        sequence,
        date.format("%Y%m%d").to_string(),
        invoice_type.sequence_tag()
    )
}
