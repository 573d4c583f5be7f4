use serde::{Deserialize, Serialize};

use super::country;
use super::invoice::CodeValue;

/// Alma 供应商原始记录
#[derive(Debug, Clone, Deserialize)]
pub struct VendorRecord {
    pub name: String,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub address: Vec<RawAddress>,
}

/// 供应商地址原始记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAddress {
    #[serde(default)]
    pub address_type: Vec<CodeValue>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub line4: Option<String>,
    pub line5: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<CodeValue>,
}

impl RawAddress {
    pub fn is_payment_address(&self) -> bool {
        self.address_type.iter().any(|t| t.value == "payment")
    }

    /// 非空的地址行，保持 line1..line5 顺序
    pub fn lines(&self) -> Vec<String> {
        [&self.line1, &self.line2, &self.line3, &self.line4, &self.line5]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

impl VendorRecord {
    /// 付款地址优先，否则取第一个地址；没有地址返回 None
    pub fn payment_address(&self) -> Option<&RawAddress> {
        let addresses = &self.contact_info.as_ref()?.address;
        addresses
            .iter()
            .find(|a| a.is_payment_address())
            .or_else(|| addresses.first())
    }
}

/// SAP 所需的供应商信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorInfo {
    pub name: String,
    pub code: String,
    pub address: VendorAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorAddress {
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: String,
}

impl VendorAddress {
    pub fn from_raw(address: &RawAddress) -> Self {
        Self {
            lines: address.lines(),
            city: address.city.clone(),
            state_or_province: address.state_province.clone(),
            postal_code: address.postal_code.clone(),
            country_code: country::sap_country_code(
                address.country.as_ref().map(|c| c.value.as_str()),
            )
            .to_string(),
        }
    }
}
