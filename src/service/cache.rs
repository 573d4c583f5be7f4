use indexmap::IndexMap;

use crate::models::{FundRecord, VendorInfo};

/// 供应商解析结果；失败同样缓存，本次运行内不再重试
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorResolution {
    Resolved(VendorInfo),
    /// 供应商存在但没有可用地址
    NoAddress,
    /// Alma 中不存在该供应商
    NotFound,
}

/// 单次运行内的供应商 / 基金缓存
///
/// 基金缓存只保存查询到的记录，未找到的基金代码在之后的发票里会再次查询。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationCache {
    vendors: IndexMap<String, VendorResolution>,
    funds: IndexMap<String, FundRecord>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(&self, vendor_code: &str) -> Option<&VendorResolution> {
        self.vendors.get(vendor_code)
    }

    pub fn insert_vendor(&mut self, vendor_code: &str, resolution: VendorResolution) {
        self.vendors.insert(vendor_code.to_string(), resolution);
    }

    pub fn fund(&self, fund_code: &str) -> Option<&FundRecord> {
        self.funds.get(fund_code)
    }

    pub fn insert_fund(&mut self, fund_code: &str, record: FundRecord) {
        self.funds.insert(fund_code.to_string(), record);
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    pub fn fund_count(&self) -> usize {
        self.funds.len()
    }
}
