// ==========================================
// NT 拣货进度看板 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 行级错误（可恢复）/ 提取级错误（本次刷新中止）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（提取级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 数据源不可用 =====
    #[error("数据源不可用 ({path}): {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("文件格式不支持: {0}（仅支持 .csv/.txt/.xlsx）")]
    UnsupportedFormat(String),

    // ===== 解析错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("文件编码错误: {0}")]
    EncodingError(String),

    // ===== 列结构错误 =====
    #[error("列结构不匹配，缺少必需列: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 是否属于数据源不可用（缺失/锁定/不可达）
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, ImportError::SourceUnavailable { .. })
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// 行级错误: 单行解析失败，跳过该行并计入 rejected_row_count
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("行 {row_number} 字段 {field} 无效: {reason}")]
pub struct MalformedRecordError {
    pub row_number: usize,
    pub field: String,
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(row_number: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            row_number,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
