// ==========================================
// NT 拣货进度看板 - 指标快照
// ==========================================
// 红线: 快照发布后不可变; 每次刷新构建新对象
// ==========================================

use crate::domain::record::{PartitionKey, RowRejection};
use crate::domain::types::{NtStatus, Sector, SegmentTag, Warehouse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// StatusCounts - 按状态的 NT 计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub finalizada: usize,
    pub em_separacao: usize,
    pub pendente: usize,
}

impl StatusCounts {
    pub fn increment(&mut self, status: NtStatus) {
        match status {
            NtStatus::Finalizada => self.finalizada += 1,
            NtStatus::EmSeparacao => self.em_separacao += 1,
            NtStatus::Pendente => self.pendente += 1,
        }
    }

    pub fn get(&self, status: NtStatus) -> usize {
        match status {
            NtStatus::Finalizada => self.finalizada,
            NtStatus::EmSeparacao => self.em_separacao,
            NtStatus::Pendente => self.pendente,
        }
    }

    pub fn total(&self) -> usize {
        self.finalizada + self.em_separacao + self.pendente
    }
}

// ==========================================
// SegmentCounts - 按人员分段的行数 / 数量
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentBucket {
    pub lines: usize,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentCounts {
    pub normal: SegmentBucket,
    #[serde(rename = "reforco")]
    pub reforco: SegmentBucket,
    pub unassigned: SegmentBucket,
}

impl SegmentCounts {
    pub fn add(&mut self, tag: SegmentTag, quantity: f64) {
        let bucket = self.bucket_mut(tag);
        bucket.lines += 1;
        bucket.quantity += quantity;
    }

    pub fn get(&self, tag: SegmentTag) -> &SegmentBucket {
        match tag {
            SegmentTag::Normal => &self.normal,
            SegmentTag::Reforco => &self.reforco,
            SegmentTag::Unassigned => &self.unassigned,
        }
    }

    fn bucket_mut(&mut self, tag: SegmentTag) -> &mut SegmentBucket {
        match tag {
            SegmentTag::Normal => &mut self.normal,
            SegmentTag::Reforco => &mut self.reforco,
            SegmentTag::Unassigned => &mut self.unassigned,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.normal.lines + self.reforco.lines + self.unassigned.lines
    }
}

// ==========================================
// RankingEntry - 操作员排名
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 名次（从 1 开始）
    pub position: usize,
    pub assignee: String,
    pub finalized_lines: usize,
}

// ==========================================
// CutSummary - 缺货（corte）汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutBreakdown {
    pub key: String,
    /// 物料描述（仅按物料汇总时有值）
    pub description: Option<String>,
    pub total_cuts: usize,
    pub total_quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutSummary {
    pub total_cuts: usize,
    pub total_quantity: f64,
    pub by_operator: Vec<CutBreakdown>,
    pub by_item: Vec<CutBreakdown>,
}

// ==========================================
// Metrics - 分区与总计共用的指标集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_lines: usize,
    pub total_quantity: f64,
    pub finalized_lines: usize,
    /// [0, 100]; total_lines == 0 时为 0
    pub percent_finalized: f64,
    /// 计入本范围状态计数的 NT 数
    pub nt_count: usize,
    pub nt_status_counts: StatusCounts,
    pub segments: SegmentCounts,
    pub operator_ranking: Vec<RankingEntry>,
    pub cuts: CutSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionMetrics {
    pub sector: Sector,
    pub warehouse: Warehouse,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl PartitionMetrics {
    pub fn key(&self) -> PartitionKey {
        PartitionKey {
            sector: self.sector,
            warehouse: self.warehouse,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    #[serde(flatten)]
    pub metrics: Metrics,
    /// 行数在分区间平分、未计入任何分区状态计数的 NT 数
    pub cross_partition_nt_count: usize,
}

// ==========================================
// MetricsSnapshot - 一次刷新的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub raw_row_count: usize,
    pub rejected_row_count: usize,
    pub rejections: Vec<RowRejection>,
    /// 按仓库代码排序
    pub partitions: Vec<PartitionMetrics>,
    pub overall: OverallMetrics,
}

impl MetricsSnapshot {
    pub fn partition(&self, warehouse: Warehouse) -> Option<&PartitionMetrics> {
        self.partitions.iter().find(|p| p.warehouse == warehouse)
    }

    pub fn partition_by_sector(&self, sector: Sector) -> Option<&PartitionMetrics> {
        self.partitions.iter().find(|p| p.sector == sector)
    }

    pub fn distinct_nt_count(&self) -> usize {
        self.overall.metrics.nt_count
    }
}
