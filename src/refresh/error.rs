// ==========================================
// NT 拣货进度看板 - 刷新周期错误类型
// ==========================================
// 处理原则: 任一错误都保留上一份快照并标记为过期，不 panic
// ==========================================

use crate::importer::ImportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("数据源不可用: {0}")]
    SourceUnavailable(String),

    #[error("列结构不匹配，缺少必需列: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("拒绝行比例超限: {rejected}/{total} > {threshold}")]
    RejectionThresholdExceeded {
        rejected: usize,
        total: usize,
        threshold: f64,
    },

    #[error("已有刷新正在进行")]
    RefreshInProgress,

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<ImportError> for RefreshError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::SchemaMismatch { missing } => RefreshError::SchemaMismatch { missing },
            ImportError::InternalError(msg) => RefreshError::Internal(msg),
            // 缺失 / 锁定 / 编码或格式无法读取，统一视为数据源不可用
            other => RefreshError::SourceUnavailable(other.to_string()),
        }
    }
}

/// 对外展示的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshErrorKind {
    SourceUnavailable,
    SchemaMismatch,
    RejectionThresholdExceeded,
    RefreshInProgress,
    Internal,
}

impl RefreshErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshErrorKind::SourceUnavailable => "SOURCE_UNAVAILABLE",
            RefreshErrorKind::SchemaMismatch => "SCHEMA_MISMATCH",
            RefreshErrorKind::RejectionThresholdExceeded => "REJECTION_THRESHOLD_EXCEEDED",
            RefreshErrorKind::RefreshInProgress => "REFRESH_IN_PROGRESS",
            RefreshErrorKind::Internal => "INTERNAL",
        }
    }
}

impl RefreshError {
    pub fn kind(&self) -> RefreshErrorKind {
        match self {
            RefreshError::SourceUnavailable(_) => RefreshErrorKind::SourceUnavailable,
            RefreshError::SchemaMismatch { .. } => RefreshErrorKind::SchemaMismatch,
            RefreshError::RejectionThresholdExceeded { .. } => {
                RefreshErrorKind::RejectionThresholdExceeded
            }
            RefreshError::RefreshInProgress => RefreshErrorKind::RefreshInProgress,
            RefreshError::Internal(_) => RefreshErrorKind::Internal,
        }
    }
}

pub type RefreshResult<T> = Result<T, RefreshError>;
