// ==========================================
// NT 拣货进度看板 - 人员分段过滤器
// ==========================================
// 规则:
// - 无分配人员            → Unassigned
// - 在正式员工名单内      → Normal（TRIM + 忽略大小写）
// - 其他                  → Reforço
// 名单每次刷新由不可变配置构建一次
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::record::{Record, SegmentedRecord};
use crate::domain::types::SegmentTag;
use std::collections::BTreeSet;

// ==========================================
// StaffRoster - 正式员工名单（已标准化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffRoster {
    normal: BTreeSet<String>,
}

impl StaffRoster {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            normal: names
                .into_iter()
                .map(|n| Self::normalize(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(config.normal_staff.iter())
    }

    fn normalize(name: &str) -> String {
        name.trim().to_uppercase()
    }

    pub fn is_normal(&self, assignee: &str) -> bool {
        self.normal.contains(&Self::normalize(assignee))
    }

    pub fn len(&self) -> usize {
        self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }
}

// ==========================================
// SegmentationFilter
// ==========================================
#[derive(Debug, Clone)]
pub struct SegmentationFilter {
    roster: StaffRoster,
}

impl SegmentationFilter {
    pub fn new(roster: StaffRoster) -> Self {
        Self { roster }
    }

    pub fn roster(&self) -> &StaffRoster {
        &self.roster
    }

    pub fn segment(&self, assignee: Option<&str>) -> SegmentTag {
        match assignee.map(str::trim) {
            None | Some("") => SegmentTag::Unassigned,
            Some(name) if self.roster.is_normal(name) => SegmentTag::Normal,
            Some(_) => SegmentTag::Reforco,
        }
    }

    /// 为每一行打分段标签（保持源顺序）
    pub fn segment_records(&self, records: &[Record]) -> Vec<SegmentedRecord> {
        records
            .iter()
            .map(|record| SegmentedRecord {
                tag: self.segment(record.assignee.as_deref()),
                record: record.clone(),
            })
            .collect()
    }
}
