// ==========================================
// NT 拣货进度看板 - 刷新周期协调器
// ==========================================
// 流程: 获取 → 规范化 → 状态判定/人员分段 → 聚合 → 原子发布
// 红线:
// - 刷新串行执行（周期锁）
// - 失败时保留上一份快照（同一对象），仅标记过期
// - 快照发布为一次引用替换，读者只克隆 Arc
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::progress::ProgressHistory;
use crate::domain::record::{NormalizedBatch, RawExtraction};
use crate::domain::snapshot::MetricsSnapshot;
use crate::engine::{
    AggregationInput, MetricsAggregator, SegmentationFilter, StaffRoster, StatusClassifier,
};
use crate::importer::Normalizer;
use crate::refresh::backup::{BackupRequest, BackupSink};
use crate::refresh::error::{RefreshError, RefreshErrorKind, RefreshResult};
use crate::refresh::source::RowSource;
use crate::repository::{RefreshLogEntity, RefreshLogRepository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RefreshTrigger - 触发来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshTrigger {
    /// 定时刷新
    Scheduled,
    /// 手动刷新
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTrigger::Scheduled => "SCHEDULED",
            RefreshTrigger::Manual => "MANUAL",
        }
    }
}

// ==========================================
// 发布视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshErrorInfo {
    pub kind: RefreshErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// 最近一次刷新失败（展示的是旧快照）
    pub stale: bool,
    pub last_error: Option<RefreshErrorInfo>,
}

/// 看板读取的完整视图（快照 + 刷新状态 + 进度历史）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub snapshot: Option<Arc<MetricsSnapshot>>,
    pub status: RefreshStatus,
    pub history: ProgressHistory,
}

impl DashboardView {
    pub fn empty(history_capacity: usize) -> Self {
        Self {
            snapshot: None,
            status: RefreshStatus::default(),
            history: ProgressHistory::with_capacity(history_capacity),
        }
    }
}

// ==========================================
// SnapshotStore - 已发布视图
// ==========================================
pub struct SnapshotStore {
    current: RwLock<Arc<DashboardView>>,
}

impl SnapshotStore {
    pub fn new(initial: DashboardView) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<DashboardView> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// 基于当前视图构造下一视图并替换；写锁只在构造与替换期间持有
    fn swap_with<F>(&self, next: F) -> Arc<DashboardView>
    where
        F: FnOnce(&DashboardView) -> DashboardView,
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let view = Arc::new(next(&guard));
        *guard = Arc::clone(&view);
        view
    }

    fn publish_success(&self, snapshot: Arc<MetricsSnapshot>, attempted_at: DateTime<Utc>) {
        self.swap_with(|prev| DashboardView {
            history: prev.history.appended(&snapshot),
            status: RefreshStatus {
                last_success_at: Some(snapshot.generated_at),
                last_attempt_at: Some(attempted_at),
                stale: false,
                last_error: None,
            },
            snapshot: Some(snapshot),
        });
    }

    fn mark_stale(&self, err: &RefreshError, attempted_at: DateTime<Utc>) {
        self.swap_with(|prev| DashboardView {
            snapshot: prev.snapshot.clone(),
            status: RefreshStatus {
                last_success_at: prev.status.last_success_at,
                last_attempt_at: Some(attempted_at),
                stale: true,
                last_error: Some(RefreshErrorInfo {
                    kind: err.kind(),
                    message: err.to_string(),
                    occurred_at: Utc::now(),
                }),
            },
            history: prev.history.clone(),
        });
    }
}

// ==========================================
// RefreshReport - 一次成功刷新的结果
// ==========================================
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub refresh_id: String,
    pub trigger: RefreshTrigger,
    pub snapshot: Arc<MetricsSnapshot>,
    pub duration_ms: i64,
}

// ==========================================
// RefreshCoordinator
// ==========================================
pub struct RefreshCoordinator {
    config: Arc<DashboardConfig>,
    source: Arc<dyn RowSource>,
    backup_sinks: Vec<Arc<dyn BackupSink>>,
    refresh_log: Option<Arc<RefreshLogRepository>>,
    store: SnapshotStore,
    cycle_lock: tokio::sync::Mutex<()>,
    pending_backups: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshCoordinator {
    pub fn new(config: Arc<DashboardConfig>, source: Arc<dyn RowSource>) -> Self {
        let store = SnapshotStore::new(DashboardView::empty(config.history_capacity));
        Self {
            config,
            source,
            backup_sinks: Vec::new(),
            refresh_log: None,
            store,
            cycle_lock: tokio::sync::Mutex::new(()),
            pending_backups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_backup_sink(mut self, sink: Arc<dyn BackupSink>) -> Self {
        self.backup_sinks.push(sink);
        self
    }

    pub fn with_refresh_log(mut self, repo: Arc<RefreshLogRepository>) -> Self {
        self.refresh_log = Some(repo);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// 当前已发布视图
    pub fn view(&self) -> Arc<DashboardView> {
        self.store.load()
    }

    /// 执行一次刷新（若有刷新进行中则等待其结束）
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshResult<RefreshReport> {
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle(trigger).await
    }

    /// 执行一次刷新；已有刷新进行中时立即返回 RefreshInProgress
    pub async fn try_refresh(&self, trigger: RefreshTrigger) -> RefreshResult<RefreshReport> {
        let _cycle = self
            .cycle_lock
            .try_lock()
            .map_err(|_| RefreshError::RefreshInProgress)?;
        self.run_cycle(trigger).await
    }

    /// 等待已派发的备份任务全部结束
    pub async fn flush_backups(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self
                .pending_backups
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "备份任务异常终止");
            }
        }
    }

    #[instrument(skip(self), fields(refresh_id = tracing::field::Empty))]
    async fn run_cycle(&self, trigger: RefreshTrigger) -> RefreshResult<RefreshReport> {
        let refresh_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("refresh_id", refresh_id.as_str());
        let started_at = Utc::now();

        info!(trigger = trigger.as_str(), source = %self.source.describe(), "开始刷新");

        let (outcome, parsed) = match self.source.acquire().await {
            Err(e) => (Err(RefreshError::from(e)), None),
            Ok(extraction) => {
                let extraction = Arc::new(extraction);
                match Normalizer.normalize(&extraction, &self.config) {
                    Err(e) => (Err(RefreshError::from(e)), None),
                    Ok(batch) => (self.compute(batch, started_at), Some(extraction)),
                }
            }
        };

        let result = match outcome {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.store.publish_success(Arc::clone(&snapshot), started_at);
                info!(
                    total_lines = snapshot.overall.metrics.total_lines,
                    nt_count = snapshot.overall.metrics.nt_count,
                    rejected = snapshot.rejected_row_count,
                    "快照已发布"
                );
                Ok(snapshot)
            }
            Err(e) => {
                self.store.mark_stale(&e, started_at);
                error!(kind = e.kind().as_str(), error = %e, "刷新失败，保留上一份快照");
                Err(e)
            }
        };

        if let Some(extraction) = parsed {
            self.spawn_backups(&refresh_id, started_at, extraction);
        }

        let completed_at = Utc::now();
        let duration_ms = (completed_at - started_at).num_milliseconds();
        self.write_audit(&refresh_id, trigger, started_at, completed_at, &result);

        result.map(|snapshot| RefreshReport {
            refresh_id,
            trigger,
            snapshot,
            duration_ms,
        })
    }

    /// 阈值校验 + 纯计算阶段
    fn compute(
        &self,
        batch: NormalizedBatch,
        generated_at: DateTime<Utc>,
    ) -> RefreshResult<MetricsSnapshot> {
        if batch.rejection_rate() > self.config.max_rejection_rate {
            return Err(RefreshError::RejectionThresholdExceeded {
                rejected: batch.rejected_row_count(),
                total: batch.raw_row_count,
                threshold: self.config.max_rejection_rate,
            });
        }

        let aggregates = StatusClassifier::new().group_and_classify(&batch.records);
        let segmented = SegmentationFilter::new(StaffRoster::from_config(&self.config))
            .segment_records(&batch.records);

        Ok(MetricsAggregator::from_config(&self.config).aggregate(AggregationInput {
            aggregates: &aggregates,
            segmented: &segmented,
            raw_row_count: batch.raw_row_count,
            rejections: batch.rejections,
            generated_at,
        }))
    }

    fn spawn_backups(
        &self,
        refresh_id: &str,
        taken_at: DateTime<Utc>,
        extraction: Arc<RawExtraction>,
    ) {
        if self.backup_sinks.is_empty() {
            return;
        }

        let request = BackupRequest {
            refresh_id: refresh_id.to_string(),
            taken_at,
            extraction,
        };
        let sinks = self.backup_sinks.clone();
        let handle = tokio::task::spawn_blocking(move || {
            for sink in sinks {
                match sink.write(&request) {
                    Ok(rows) => info!(sink = sink.name(), rows, "原始数据已备份"),
                    Err(e) => warn!(sink = sink.name(), error = %e, "原始数据备份失败"),
                }
            }
        });

        let mut pending = self
            .pending_backups
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// 写入刷新日志（尽力而为）
    fn write_audit(
        &self,
        refresh_id: &str,
        trigger: RefreshTrigger,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: &RefreshResult<Arc<MetricsSnapshot>>,
    ) {
        let Some(repo) = &self.refresh_log else {
            return;
        };

        let (status, error_kind, error_message, raw, rejected, lines) = match result {
            Ok(s) => (
                "SUCCESS",
                None,
                None,
                s.raw_row_count,
                s.rejected_row_count,
                s.overall.metrics.total_lines,
            ),
            Err(e) => {
                // 超限时规范化已完成，行数仍写入审计
                let (raw, rejected) = match e {
                    RefreshError::RejectionThresholdExceeded {
                        rejected, total, ..
                    } => (*total, *rejected),
                    _ => (0, 0),
                };
                (
                    "FAILED",
                    Some(e.kind().as_str().to_string()),
                    Some(e.to_string()),
                    raw,
                    rejected,
                    0,
                )
            }
        };

        let entity = RefreshLogEntity {
            refresh_id: refresh_id.to_string(),
            trigger_type: trigger.as_str().to_string(),
            started_at: started_at.to_rfc3339(),
            completed_at: completed_at.to_rfc3339(),
            duration_ms: (completed_at - started_at).num_milliseconds(),
            status: status.to_string(),
            error_kind,
            error_message,
            raw_row_count: raw as i64,
            rejected_row_count: rejected as i64,
            total_lines: lines as i64,
        };

        if let Err(e) = repo.insert(&entity) {
            warn!(error = %e, "刷新日志写入失败");
        }
    }
}
