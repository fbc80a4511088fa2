// ==========================================
// NT 拣货进度看板 - 刷新周期层
// ==========================================
// 职责: 编排一次完整流水线，发布快照，失败时回退
// ==========================================

pub mod backup;
pub mod coordinator;
pub mod error;
pub mod source;

pub use backup::{BackupRequest, BackupSink, CsvBackupSink, SqliteBackupSink};
pub use coordinator::{
    DashboardView, RefreshCoordinator, RefreshErrorInfo, RefreshReport, RefreshStatus,
    RefreshTrigger, SnapshotStore,
};
pub use error::{RefreshError, RefreshErrorKind, RefreshResult};
pub use source::{FileRowSource, RowSource};
