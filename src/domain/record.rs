// ==========================================
// NT 拣货进度看板 - 行记录与 NT 聚合
// ==========================================
// 生命周期: 导入时创建，刷新结束后丢弃（仅备份 sink 保留原始行副本）
// ==========================================

use crate::domain::types::{NtStatus, Sector, SegmentTag, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始行（列名 → 原值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// RawExtraction - 一次导出文件的原始内容
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    /// 表头（已 TRIM，保持源文件顺序）
    pub headers: Vec<String>,
    /// 数据行（已跳过完全空白的行）
    pub rows: Vec<RawRow>,
    /// 每个数据行在源文件中的行号（1 起，表头后第一行为 1，空白行也计数）
    /// 为空时按 rows 下标连续编号
    pub row_numbers: Vec<usize>,
}

impl RawExtraction {
    /// 行号连续的提取结果
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            headers,
            rows,
            row_numbers: Vec::new(),
        }
    }

    pub fn raw_row_count(&self) -> usize {
        self.rows.len()
    }

    /// 第 idx 个数据行的源文件行号
    pub fn row_number(&self, idx: usize) -> usize {
        self.row_numbers.get(idx).copied().unwrap_or(idx + 1)
    }
}

// ==========================================
// Record - 一条导出行（解析后不可变）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub nt_id: String,
    pub item_id: String,
    pub finalized: bool,
    /// None = 未分配
    pub assignee: Option<String>,
    pub quantity: f64,
    pub sector: Sector,
    pub warehouse: Warehouse,

    /// 物料描述（可选列）
    pub item_description: Option<String>,
    /// 生产日期原值；源文件无该列时为 None
    pub production_date: Option<String>,

    /// 源文件数据行号（从 1 开始）
    pub row_number: usize,
}

impl Record {
    pub fn partition(&self) -> PartitionKey {
        PartitionKey {
            sector: self.sector,
            warehouse: self.warehouse,
        }
    }

    pub fn has_assignee(&self) -> bool {
        self.assignee.as_deref().map_or(false, |a| !a.trim().is_empty())
    }
}

// ==========================================
// RowRejection - 行级拒绝明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row_number: usize,
    pub field: String,
    pub reason: String,
}

// ==========================================
// NormalizedBatch - 导入规范化结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<Record>,
    pub rejections: Vec<RowRejection>,
    pub raw_row_count: usize,
}

impl NormalizedBatch {
    pub fn rejected_row_count(&self) -> usize {
        self.rejections.len()
    }

    /// 拒绝率（无数据行时为 0）
    pub fn rejection_rate(&self) -> f64 {
        if self.raw_row_count == 0 {
            0.0
        } else {
            self.rejected_row_count() as f64 / self.raw_row_count as f64
        }
    }
}

// ==========================================
// PartitionKey - (部门, 仓库) 分区键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub sector: Sector,
    pub warehouse: Warehouse,
}

// ==========================================
// NtPlacement - NT 状态计数归属
// ==========================================
// 多数行所在分区; 前两名行数相同则为跨分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NtPlacement {
    Partition(PartitionKey),
    CrossPartition,
}

// ==========================================
// NtAggregate - NT 聚合（行保持源顺序）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NtAggregate {
    pub nt_id: String,
    pub lines: Vec<Record>,
    pub status: NtStatus,
    pub placement: NtPlacement,
}

impl NtAggregate {
    /// NT 的首个非空分配人员（按源顺序）
    pub fn first_assignee(&self) -> Option<&str> {
        self.lines
            .iter()
            .filter(|r| r.has_assignee())
            .find_map(|r| r.assignee.as_deref())
    }
}

// ==========================================
// SegmentedRecord - 带分段标签的行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedRecord {
    pub record: Record,
    pub tag: SegmentTag,
}
