// ==========================================
// NT 拣货进度看板 - 仓储层
// ==========================================
// 职责: SQLite 审计存储（刷新日志 + 原始行备份）
// 红线: 引擎不依赖仓储；仓储写入失败不影响快照发布
// ==========================================

pub mod error;
pub mod raw_backup_repo;
pub mod refresh_log_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use raw_backup_repo::RawBackupRepository;
pub use refresh_log_repo::{RefreshLogEntity, RefreshLogRepository};
