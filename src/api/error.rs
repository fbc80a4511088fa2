// ==========================================
// NT 拣货进度看板 - API 层错误类型
// ==========================================
// 职责: 将刷新/仓储错误转换为展示层可读的错误消息
// ==========================================

use crate::refresh::{RefreshError, RefreshErrorKind};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("已有刷新正在进行，请稍后重试")]
    RefreshInProgress,

    #[error("刷新失败 ({}): {message}", kind.as_str())]
    RefreshFailed {
        kind: RefreshErrorKind,
        message: String,
    },

    #[error("数据库错误: {0}")]
    DatabaseError(String),
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::RefreshInProgress => ApiError::RefreshInProgress,
            other => ApiError::RefreshFailed {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
