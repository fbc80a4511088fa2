// ==========================================
// NT 拣货进度看板 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 完成标记判定 / 数量解析
// ==========================================

use thiserror::Error;

/// 生产日期“归零”写法（上游对缺货行不填生产日期）
pub const ZEROED_DATE_PATTERNS: [&str; 4] = ["0000-00-00", "00/00/0000", "00.00.0000", ""];

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

/// 数量解析失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("无法解析为数值: {0}")]
    NotNumeric(String),

    #[error("数量为负数: {0}")]
    Negative(String),
}

impl DataCleaner {
    /// 标准化 NULL 值（空字符串/空白 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 完成标记判定（TRIM 后忽略大小写比较）
    pub fn is_done_marker(&self, value: &str, done_marker: &str) -> bool {
        value.trim().eq_ignore_ascii_case(done_marker.trim())
    }

    /// 解析数量
    ///
    /// # 规则
    /// - 含逗号: 逗号为小数点，点号视为千分位（"1.234,5" → 1234.5）
    /// - 不含逗号: 按点号小数解析（"2.5" → 2.5）
    /// - 非数值 / 非有限值 / 负数 → 拒绝
    pub fn parse_quantity(&self, value: &str) -> Result<f64, QuantityError> {
        let trimmed = value.trim();
        let normalized = if trimmed.contains(',') {
            trimmed.replace('.', "").replace(',', ".")
        } else {
            trimmed.to_string()
        };

        let parsed = normalized
            .parse::<f64>()
            .map_err(|_| QuantityError::NotNumeric(trimmed.to_string()))?;

        if !parsed.is_finite() {
            return Err(QuantityError::NotNumeric(trimmed.to_string()));
        }
        if parsed < 0.0 {
            return Err(QuantityError::Negative(trimmed.to_string()));
        }
        // -0.0 归一为 0.0，保证序列化结果稳定
        Ok(parsed + 0.0)
    }

    /// 生产日期是否为“归零”写法
    pub fn is_zeroed_date(&self, value: &str) -> bool {
        ZEROED_DATE_PATTERNS.contains(&value.trim())
    }
}
