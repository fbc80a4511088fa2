// ==========================================
// NT 拣货进度看板 - 操作员排名
// ==========================================
// 口径: 每位分配人员的已完成行数
// 排序: 行数降序 → 姓名升序；名次从 1 开始
// ==========================================

use crate::domain::record::Record;
use crate::domain::snapshot::RankingEntry;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct RankingAccumulator {
    finalized_by_assignee: BTreeMap<String, usize>,
}

impl RankingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只统计已完成且有分配人员的行
    pub fn observe(&mut self, record: &Record) {
        if !record.finalized {
            return;
        }
        if let Some(assignee) = record.assignee.as_deref().map(str::trim) {
            if !assignee.is_empty() {
                *self
                    .finalized_by_assignee
                    .entry(assignee.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    pub fn finish(self) -> Vec<RankingEntry> {
        let mut entries: Vec<(String, usize)> = self.finalized_by_assignee.into_iter().collect();
        // BTreeMap 已按姓名升序，稳定排序后同行数保持姓名顺序
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        entries
            .into_iter()
            .enumerate()
            .map(|(idx, (assignee, finalized_lines))| RankingEntry {
                position: idx + 1,
                assignee,
                finalized_lines,
            })
            .collect()
    }
}

/// 取排名前 N 名
pub fn top_n(ranking: &[RankingEntry], n: usize) -> Vec<RankingEntry> {
    ranking.iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Sector, Warehouse};

    fn line(assignee: Option<&str>, finalized: bool) -> Record {
        Record {
            nt_id: "1".to_string(),
            item_id: "A".to_string(),
            finalized,
            assignee: assignee.map(str::to_string),
            quantity: 1.0,
            sector: Sector::Mercearia,
            warehouse: Warehouse::Dp01,
            item_description: None,
            production_date: None,
            row_number: 1,
        }
    }

    #[test]
    fn test_ranking_order() {
        let mut acc = RankingAccumulator::new();
        for record in [
            line(Some("ZECA"), true),
            line(Some("ANA"), true),
            line(Some("BETO"), true),
            line(Some("BETO"), true),
            line(Some("BETO"), false),
            line(None, true),
        ] {
            acc.observe(&record);
        }

        let ranking = acc.finish();
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].assignee, "BETO");
        assert_eq!(ranking[0].finalized_lines, 2);
        assert_eq!(ranking[1].assignee, "ANA");
        assert_eq!(ranking[1].position, 2);
        assert_eq!(ranking[2].assignee, "ZECA");

        assert_eq!(top_n(&ranking, 1).len(), 1);
    }
}
