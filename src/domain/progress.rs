// ==========================================
// NT 拣货进度看板 - 进度历史
// ==========================================
// 职责: 记录每次成功刷新的完成进度，供完工预测使用
// 容量: 每个仓库保留最近 N 个点，超出时淘汰最旧的点
// ==========================================

use crate::domain::snapshot::MetricsSnapshot;
use crate::domain::types::Warehouse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// 默认每个仓库保留的进度点数
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    pub recorded_at: DateTime<Utc>,
    pub total_lines: usize,
    pub finalized_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressHistory {
    capacity: usize,
    points: BTreeMap<Warehouse, VecDeque<ProgressPoint>>,
}

impl Default for ProgressHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ProgressHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: BTreeMap::new(),
        }
    }

    /// 基于快照追加进度点，返回新的历史（原历史不变）
    pub fn appended(&self, snapshot: &MetricsSnapshot) -> Self {
        let mut next = self.clone();
        for partition in &snapshot.partitions {
            let series = next.points.entry(partition.warehouse).or_default();
            series.push_back(ProgressPoint {
                recorded_at: snapshot.generated_at,
                total_lines: partition.metrics.total_lines,
                finalized_lines: partition.metrics.finalized_lines,
            });
            while series.len() > next.capacity {
                series.pop_front();
            }
        }
        next
    }

    pub fn points(&self, warehouse: Warehouse) -> Vec<ProgressPoint> {
        self.points
            .get(&warehouse)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, warehouse: Warehouse) -> Option<ProgressPoint> {
        self.points.get(&warehouse).and_then(|s| s.back().copied())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
