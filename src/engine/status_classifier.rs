// ==========================================
// NT 拣货进度看板 - NT 状态判定引擎
// ==========================================
// 红线: 状态是“优先级制”，纯函数，只看 finalized / assignee
// ==========================================
// 判定顺序:
// 1. 全部行已完成      → Finalizada
// 2. 任一行已分配人员  → EmSeparacao
// 3. 其他              → Pendente
// ==========================================

use crate::domain::record::{NtAggregate, NtPlacement, PartitionKey, Record};
use crate::domain::types::NtStatus;
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl StatusClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 判定单个 NT 的状态
    ///
    /// 空切片返回 None（分组结果不会为空，出现即为调用方错误）
    pub fn classify(&self, lines: &[Record]) -> Option<NtStatus> {
        if lines.is_empty() {
            return None;
        }

        if lines.iter().all(|r| r.finalized) {
            Some(NtStatus::Finalizada)
        } else if lines.iter().any(Record::has_assignee) {
            Some(NtStatus::EmSeparacao)
        } else {
            Some(NtStatus::Pendente)
        }
    }

    /// 按 NT 分组并判定状态
    ///
    /// - NT 顺序: 首次出现顺序
    /// - 行顺序: 源文件顺序
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn group_and_classify(&self, records: &[Record]) -> Vec<NtAggregate> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<Record>)> = Vec::new();

        for record in records {
            match index.get(record.nt_id.as_str()) {
                Some(&pos) => groups[pos].1.push(record.clone()),
                None => {
                    index.insert(record.nt_id.as_str(), groups.len());
                    groups.push((record.nt_id.clone(), vec![record.clone()]));
                }
            }
        }

        groups
            .into_iter()
            .filter_map(|(nt_id, lines)| {
                let status = self.classify(&lines)?;
                let placement = Self::placement(&lines);
                Some(NtAggregate {
                    nt_id,
                    lines,
                    status,
                    placement,
                })
            })
            .collect()
    }

    /// NT 状态计数归属: 行数严格多数的分区；前两名并列时为跨分区
    pub fn placement(lines: &[Record]) -> NtPlacement {
        let mut counts: BTreeMap<PartitionKey, usize> = BTreeMap::new();
        for record in lines {
            *counts.entry(record.partition()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(PartitionKey, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        match ranked.as_slice() {
            [] => NtPlacement::CrossPartition,
            [(only, _)] => NtPlacement::Partition(*only),
            [(top, top_count), (_, second_count), ..] => {
                if top_count > second_count {
                    NtPlacement::Partition(*top)
                } else {
                    NtPlacement::CrossPartition
                }
            }
        }
    }
}
