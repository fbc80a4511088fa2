// ==========================================
// NT 拣货进度看板 - 缺货 (corte) 识别
// ==========================================
// 判定: 已完成 + 生产日期为“归零”写法
// 源文件无生产日期列时不产生缺货
// 操作员: 先按范围筛选行，再取该 NT 首个非空分配人员，否则“Não identificado”
// - 总计: NT 的全部行
// - 分区: 仅该 NT 在本分区内的行
// ==========================================

use crate::domain::record::{NtAggregate, PartitionKey, Record};
use crate::domain::snapshot::{CutBreakdown, CutSummary};
use crate::importer::data_cleaner::DataCleaner;
use std::collections::{BTreeMap, HashMap};

pub const UNIDENTIFIED_OPERATOR: &str = "Não identificado";

pub fn is_cut(record: &Record) -> bool {
    record.finalized
        && record
            .production_date
            .as_deref()
            .map_or(false, |date| DataCleaner.is_zeroed_date(date))
}

// ==========================================
// CutOperators - 缺货操作员查找表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CutOperators<'a> {
    overall: HashMap<&'a str, &'a str>,
    /// NT → [(分区, 分区内首个分配人员)]，按行首次出现顺序
    by_partition: HashMap<&'a str, Vec<(PartitionKey, Option<&'a str>)>>,
}

impl<'a> CutOperators<'a> {
    pub fn from_aggregates(aggregates: &'a [NtAggregate]) -> Self {
        let mut operators = Self::default();

        for agg in aggregates {
            operators.overall.insert(
                agg.nt_id.as_str(),
                agg.first_assignee().unwrap_or(UNIDENTIFIED_OPERATOR),
            );

            let slots = operators.by_partition.entry(agg.nt_id.as_str()).or_default();
            for line in &agg.lines {
                let assignee = line.assignee.as_deref().filter(|_| line.has_assignee());
                match slots.iter_mut().find(|(key, _)| *key == line.partition()) {
                    Some((_, slot)) => {
                        if slot.is_none() {
                            *slot = assignee;
                        }
                    }
                    None => slots.push((line.partition(), assignee)),
                }
            }
        }

        operators
    }

    /// 总计口径的操作员
    pub fn overall(&self, nt_id: &str) -> &'a str {
        self.overall
            .get(nt_id)
            .copied()
            .unwrap_or(UNIDENTIFIED_OPERATOR)
    }

    /// 分区口径的操作员
    pub fn in_partition(&self, nt_id: &str, partition: PartitionKey) -> &'a str {
        self.by_partition
            .get(nt_id)
            .and_then(|slots| slots.iter().find(|(key, _)| *key == partition))
            .and_then(|(_, assignee)| *assignee)
            .unwrap_or(UNIDENTIFIED_OPERATOR)
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    count: usize,
    quantity: f64,
}

impl Tally {
    fn add(&mut self, quantity: f64) {
        self.count += 1;
        self.quantity += quantity;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CutAccumulator {
    total_cuts: usize,
    total_quantity: f64,
    by_operator: BTreeMap<String, Tally>,
    /// (物料, 物料描述)
    by_item: BTreeMap<(String, Option<String>), Tally>,
}

impl CutAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 非缺货行直接忽略
    pub fn observe(&mut self, record: &Record, operator: &str) {
        if !is_cut(record) {
            return;
        }

        self.total_cuts += 1;
        self.total_quantity += record.quantity;

        self.by_operator
            .entry(operator.to_string())
            .or_default()
            .add(record.quantity);
        self.by_item
            .entry((record.item_id.clone(), record.item_description.clone()))
            .or_default()
            .add(record.quantity);
    }

    pub fn finish(self) -> CutSummary {
        CutSummary {
            total_cuts: self.total_cuts,
            total_quantity: self.total_quantity,
            by_operator: breakdown(
                self.by_operator
                    .into_iter()
                    .map(|(operator, tally)| ((operator, None), tally)),
            ),
            by_item: breakdown(self.by_item),
        }
    }
}

/// 次数降序 → key 升序（输入已按 key 有序）
fn breakdown<I>(tallies: I) -> Vec<CutBreakdown>
where
    I: IntoIterator<Item = ((String, Option<String>), Tally)>,
{
    let mut rows: Vec<CutBreakdown> = tallies
        .into_iter()
        .map(|((key, description), tally)| CutBreakdown {
            key,
            description,
            total_cuts: tally.count,
            total_quantity: tally.quantity,
        })
        .collect();
    rows.sort_by(|a, b| b.total_cuts.cmp(&a.total_cuts));
    rows
}
