// ==========================================
// NT 拣货进度看板 - 看板 API
// ==========================================
// 职责: 展示层只读门面 + 手动刷新入口
// 架构: API 层 → RefreshCoordinator（已发布视图）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::snapshot::{CutSummary, MetricsSnapshot, PartitionMetrics, RankingEntry};
use crate::domain::types::{Sector, Warehouse};
use crate::engine::forecast::{CompletionForecast, ForecastEngine};
use crate::engine::ranking::top_n;
use crate::refresh::{DashboardView, RefreshCoordinator, RefreshReport, RefreshStatus, RefreshTrigger};
use crate::repository::{RefreshLogEntity, RefreshLogRepository};

/// 刷新日志单次查询上限
const MAX_LOG_LIMIT: usize = 500;

pub struct DashboardApi {
    coordinator: Arc<RefreshCoordinator>,
    /// 刷新日志（未启用审计存储时为 None）
    refresh_log: Option<Arc<RefreshLogRepository>>,
    forecast_engine: ForecastEngine,
}

impl DashboardApi {
    pub fn new(
        coordinator: Arc<RefreshCoordinator>,
        refresh_log: Option<Arc<RefreshLogRepository>>,
    ) -> Self {
        Self {
            coordinator,
            refresh_log,
            forecast_engine: ForecastEngine::new(),
        }
    }

    // ==========================================
    // 视图查询
    // ==========================================

    /// 当前已发布视图（快照 + 刷新状态 + 进度历史）
    pub fn get_view(&self) -> Arc<DashboardView> {
        self.coordinator.view()
    }

    /// 当前快照；尚无成功刷新时返回 NotFound
    pub fn get_snapshot(&self) -> ApiResult<Arc<MetricsSnapshot>> {
        self.coordinator
            .view()
            .snapshot
            .clone()
            .ok_or_else(|| ApiError::NotFound("尚无可用快照".to_string()))
    }

    pub fn get_refresh_status(&self) -> RefreshStatus {
        self.coordinator.view().status.clone()
    }

    /// 按部门查询分区指标
    ///
    /// # 参数
    /// - sector: 部门名称（Mercearia / Perecíveis，忽略大小写）
    pub fn get_partition_by_sector(&self, sector: &str) -> ApiResult<PartitionMetrics> {
        let sector = Sector::parse(sector)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知部门: {}", sector)))?;
        let snapshot = self.get_snapshot()?;
        snapshot
            .partition_by_sector(sector)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("部门 {} 未配置", sector)))
    }

    /// 按仓库代码查询分区指标
    pub fn get_partition_by_warehouse(&self, warehouse: &str) -> ApiResult<PartitionMetrics> {
        let warehouse = parse_warehouse(warehouse)?;
        let snapshot = self.get_snapshot()?;
        snapshot
            .partition(warehouse)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("仓库 {} 未配置", warehouse)))
    }

    /// 操作员排名前 N 名
    ///
    /// # 参数
    /// - warehouse: None 表示总计
    /// - limit: 必须大于 0
    pub fn get_operator_ranking(
        &self,
        warehouse: Option<&str>,
        limit: usize,
    ) -> ApiResult<Vec<RankingEntry>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        match warehouse {
            Some(code) => {
                let partition = self.get_partition_by_warehouse(code)?;
                Ok(top_n(&partition.metrics.operator_ranking, limit))
            }
            None => {
                let snapshot = self.get_snapshot()?;
                Ok(top_n(&snapshot.overall.metrics.operator_ranking, limit))
            }
        }
    }

    /// 缺货汇总（None 表示总计）
    pub fn get_cut_summary(&self, warehouse: Option<&str>) -> ApiResult<CutSummary> {
        match warehouse {
            Some(code) => Ok(self.get_partition_by_warehouse(code)?.metrics.cuts),
            None => Ok(self.get_snapshot()?.overall.metrics.cuts.clone()),
        }
    }

    /// 完工预测（基于进度历史，无快照时返回 Insufficient）
    pub fn get_completion_forecast(&self, warehouse: &str) -> ApiResult<CompletionForecast> {
        let warehouse = parse_warehouse(warehouse)?;
        let view = self.coordinator.view();
        Ok(self
            .forecast_engine
            .forecast(&view.history.points(warehouse)))
    }

    /// 最近的刷新日志
    pub fn list_refresh_log(&self, limit: usize) -> ApiResult<Vec<RefreshLogEntity>> {
        if limit == 0 || limit > MAX_LOG_LIMIT {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须位于 1..={}",
                MAX_LOG_LIMIT
            )));
        }
        let repo = self
            .refresh_log
            .as_ref()
            .ok_or_else(|| ApiError::NotFound("未启用刷新日志".to_string()))?;
        Ok(repo.list_recent(limit)?)
    }

    // ==========================================
    // 操作
    // ==========================================

    /// 手动刷新；已有刷新进行中时返回 RefreshInProgress
    pub async fn trigger_manual_refresh(&self) -> ApiResult<RefreshReport> {
        let report = self.coordinator.try_refresh(RefreshTrigger::Manual).await?;
        Ok(report)
    }
}

fn parse_warehouse(code: &str) -> ApiResult<Warehouse> {
    Warehouse::parse_code(code)
        .ok_or_else(|| ApiError::InvalidInput(format!("未知仓库代码: {}", code)))
}
