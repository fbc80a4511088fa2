// ==========================================
// NT 拣货进度看板 - 领域层
// ==========================================
// 职责: 行记录 / NT 聚合 / 指标快照 / 进度历史
// ==========================================

pub mod progress;
pub mod record;
pub mod snapshot;
pub mod types;

pub use progress::{ProgressHistory, ProgressPoint, DEFAULT_HISTORY_CAPACITY};
pub use record::{
    NormalizedBatch, NtAggregate, NtPlacement, PartitionKey, RawExtraction, RawRow, Record,
    RowRejection, SegmentedRecord,
};
pub use snapshot::{
    CutBreakdown, CutSummary, Metrics, MetricsSnapshot, OverallMetrics, PartitionMetrics,
    RankingEntry, SegmentBucket, SegmentCounts, StatusCounts,
};
pub use types::{NtStatus, Sector, SegmentTag, Warehouse};
