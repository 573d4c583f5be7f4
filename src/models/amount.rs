//! 金额的解析与格式化，全程十进制

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// 从 JSON 数字的文本形式解析金额，不经过 f64
pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a monetary amount, found {other}"
            )))
        }
    };
    BigDecimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

/// 两位小数: `150` -> `150.00`
pub fn fixed2(amount: &BigDecimal) -> String {
    amount.round(2).with_scale(2).to_string()
}

/// 两位小数并按千分位分组: `3687.32` -> `3,687.32`
pub fn grouped(amount: &BigDecimal) -> String {
    let plain = fixed2(amount);
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(plain.len() + digits.len() / 3);
    for (idx, ch) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    format!("{sign}{out}.{frac_part}")
}

/// 去掉小数点得到"分"，左侧补零到指定宽度
pub fn cents(amount: &BigDecimal, width: usize) -> String {
    let digits = fixed2(amount).replace('.', "");
    format!("{digits:0>width$}")
}
