use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// `acq/funds?q=fund_code~...` 的响应
#[derive(Debug, Clone, Deserialize)]
pub struct FundSearchResponse {
    pub total_record_count: u64,
    #[serde(default)]
    pub fund: Vec<FundRecord>,
}

/// Alma 基金记录
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FundRecord {
    #[serde(default)]
    pub code: Option<String>,
    pub external_id: String,
}

impl FundRecord {
    /// external_id 形如 `<cost object>-<G/L account>`
    pub fn ledger_target(&self) -> Option<(String, String, String)> {
        let external_id = self.external_id.trim();
        let (cost_object, gl_account) = external_id.split_once('-')?;
        Some((
            external_id.to_string(),
            cost_object.to_string(),
            gl_account.to_string(),
        ))
    }
}

/// 同一 external_id 的基金分配 (金额已合并)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundAllocation {
    pub external_id: String,
    pub amount: BigDecimal,
    pub cost_object: String,
    pub gl_account: String,
}
