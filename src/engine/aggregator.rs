// ==========================================
// NT 拣货进度看板 - 指标聚合引擎
// ==========================================
// 职责: 分段后的行 + NT 聚合 → 指标快照
// 红线: 单次遍历同时累加分区与总计；NT 状态每个 NT 只计一次
// ==========================================
// 确定性:
// - generated_at 由调用方传入
// - 分区按仓库代码输出，排名/缺货明细排序固定
// - 数量按源顺序累加
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::record::{NtAggregate, NtPlacement, PartitionKey, RowRejection, SegmentedRecord};
use crate::domain::snapshot::{
    Metrics, MetricsSnapshot, OverallMetrics, PartitionMetrics, SegmentCounts, StatusCounts,
};
use crate::engine::cuts::{CutAccumulator, CutOperators};
use crate::engine::ranking::RankingAccumulator;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// ==========================================
// AggregationInput - 一次聚合的全部输入
// ==========================================
pub struct AggregationInput<'a> {
    pub aggregates: &'a [NtAggregate],
    pub segmented: &'a [SegmentedRecord],
    pub raw_row_count: usize,
    pub rejections: Vec<RowRejection>,
    pub generated_at: DateTime<Utc>,
}

// ==========================================
// 累加器（分区与总计共用）
// ==========================================
#[derive(Default)]
struct MetricsAccumulator {
    total_lines: usize,
    total_quantity: f64,
    finalized_lines: usize,
    nt_count: usize,
    nt_status_counts: StatusCounts,
    segments: SegmentCounts,
    ranking: RankingAccumulator,
    cuts: CutAccumulator,
}

impl MetricsAccumulator {
    fn observe(&mut self, line: &SegmentedRecord, cut_operator: &str) {
        let record = &line.record;
        self.total_lines += 1;
        self.total_quantity += record.quantity;
        if record.finalized {
            self.finalized_lines += 1;
        }
        self.segments.add(line.tag, record.quantity);
        self.ranking.observe(record);
        self.cuts.observe(record, cut_operator);
    }

    fn count_nt(&mut self, aggregate: &NtAggregate) {
        self.nt_count += 1;
        self.nt_status_counts.increment(aggregate.status);
    }

    fn finish(self) -> Metrics {
        let percent_finalized = if self.total_lines == 0 {
            0.0
        } else {
            (self.finalized_lines as f64 / self.total_lines as f64 * 100.0).clamp(0.0, 100.0)
        };

        Metrics {
            total_lines: self.total_lines,
            total_quantity: self.total_quantity,
            finalized_lines: self.finalized_lines,
            percent_finalized,
            nt_count: self.nt_count,
            nt_status_counts: self.nt_status_counts,
            segments: self.segments,
            operator_ranking: self.ranking.finish(),
            cuts: self.cuts.finish(),
        }
    }
}

// ==========================================
// MetricsAggregator
// ==========================================
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    /// 已配置分区（按仓库代码排序）
    partitions: Vec<PartitionKey>,
}

impl MetricsAggregator {
    pub fn new(mut partitions: Vec<PartitionKey>) -> Self {
        partitions.sort_by_key(|p| p.warehouse);
        partitions.dedup();
        Self { partitions }
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::new(
            config
                .warehouse_sectors
                .iter()
                .map(|(warehouse, sector)| PartitionKey {
                    sector: *sector,
                    warehouse: *warehouse,
                })
                .collect(),
        )
    }

    pub fn partitions(&self) -> &[PartitionKey] {
        &self.partitions
    }

    /// 聚合为指标快照
    #[instrument(skip_all, fields(
        lines = input.segmented.len(),
        nts = input.aggregates.len()
    ))]
    pub fn aggregate(&self, input: AggregationInput<'_>) -> MetricsSnapshot {
        let mut partitions: BTreeMap<PartitionKey, MetricsAccumulator> = self
            .partitions
            .iter()
            .map(|key| (*key, MetricsAccumulator::default()))
            .collect();
        let mut overall = MetricsAccumulator::default();
        let mut cross_partition_nt_count = 0;

        let operators = CutOperators::from_aggregates(input.aggregates);

        // 行级: 按每行自身分区累加；缺货操作员按各自口径取
        for line in input.segmented {
            let nt_id = line.record.nt_id.as_str();
            let partition = line.record.partition();
            overall.observe(line, operators.overall(nt_id));
            partitions
                .entry(partition)
                .or_default()
                .observe(line, operators.in_partition(nt_id, partition));
        }

        // NT 级: 每个 NT 只计一次
        for aggregate in input.aggregates {
            overall.count_nt(aggregate);
            match aggregate.placement {
                NtPlacement::Partition(key) => partitions.entry(key).or_default().count_nt(aggregate),
                NtPlacement::CrossPartition => cross_partition_nt_count += 1,
            }
        }

        let mut partition_metrics: Vec<PartitionMetrics> = partitions
            .into_iter()
            .map(|(key, acc)| PartitionMetrics {
                sector: key.sector,
                warehouse: key.warehouse,
                metrics: acc.finish(),
            })
            .collect();
        partition_metrics.sort_by_key(|p| p.warehouse);

        let overall = OverallMetrics {
            metrics: overall.finish(),
            cross_partition_nt_count,
        };

        debug!(
            total_lines = overall.metrics.total_lines,
            nt_count = overall.metrics.nt_count,
            cross_partition_nt_count,
            "聚合完成"
        );

        MetricsSnapshot {
            generated_at: input.generated_at,
            raw_row_count: input.raw_row_count,
            rejected_row_count: input.rejections.len(),
            rejections: input.rejections,
            partitions: partition_metrics,
            overall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use crate::domain::types::{NtStatus, Sector, SegmentTag, Warehouse};
    use crate::engine::segmentation::{SegmentationFilter, StaffRoster};
    use crate::engine::status_classifier::StatusClassifier;
    use chrono::TimeZone;

    fn line(nt: &str, finalized: bool, assignee: Option<&str>, warehouse: Warehouse) -> Record {
        Record {
            nt_id: nt.to_string(),
            item_id: format!("ITEM-{nt}"),
            finalized,
            assignee: assignee.map(str::to_string),
            quantity: 1.5,
            sector: match warehouse {
                Warehouse::Dp01 => Sector::Mercearia,
                Warehouse::Dp40 => Sector::Pereciveis,
            },
            warehouse,
            item_description: None,
            production_date: None,
            row_number: 1,
        }
    }

    fn run(records: &[Record]) -> MetricsSnapshot {
        let config = DashboardConfig::with_source_path("mod.csv").unwrap();
        let aggregates = StatusClassifier::new().group_and_classify(records);
        let segmented =
            SegmentationFilter::new(StaffRoster::from_config(&config)).segment_records(records);
        MetricsAggregator::from_config(&config).aggregate(AggregationInput {
            aggregates: &aggregates,
            segmented: &segmented,
            raw_row_count: records.len(),
            rejections: vec![],
            generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
        })
    }

    #[test]
    fn test_empty_input_keeps_all_partitions() {
        let snapshot = run(&[]);
        assert_eq!(snapshot.partitions.len(), 2);
        assert_eq!(snapshot.partitions[0].warehouse, Warehouse::Dp01);
        assert_eq!(snapshot.partitions[1].warehouse, Warehouse::Dp40);
        assert_eq!(snapshot.overall.metrics.percent_finalized, 0.0);
    }

    #[test]
    fn test_line_totals_and_segments() {
        let records = vec![
            line("1", true, Some("FERN.PINTO"), Warehouse::Dp01),
            line("1", false, Some("TEMP"), Warehouse::Dp01),
            line("2", false, None, Warehouse::Dp40),
        ];
        let snapshot = run(&records);

        let dp01 = snapshot.partition(Warehouse::Dp01).unwrap();
        assert_eq!(dp01.metrics.total_lines, 2);
        assert_eq!(dp01.metrics.finalized_lines, 1);
        assert_eq!(dp01.metrics.percent_finalized, 50.0);
        assert_eq!(dp01.metrics.segments.get(SegmentTag::Reforco).lines, 1);
        assert_eq!(dp01.metrics.nt_status_counts.get(NtStatus::EmSeparacao), 1);

        assert_eq!(snapshot.overall.metrics.total_lines, 3);
        assert_eq!(snapshot.overall.metrics.total_quantity, 4.5);
        assert_eq!(snapshot.overall.metrics.segments.total_lines(), 3);
    }

    #[test]
    fn test_cross_partition_nt_excluded_from_partitions() {
        let records = vec![
            line("9", false, None, Warehouse::Dp01),
            line("9", false, None, Warehouse::Dp40),
        ];
        let snapshot = run(&records);

        assert_eq!(snapshot.overall.cross_partition_nt_count, 1);
        assert_eq!(snapshot.overall.metrics.nt_status_counts.total(), 1);
        let partition_total: usize = snapshot
            .partitions
            .iter()
            .map(|p| p.metrics.nt_status_counts.total())
            .sum();
        assert_eq!(partition_total, 0);
        // 行级仍按各自分区计
        assert_eq!(snapshot.partition(Warehouse::Dp40).unwrap().metrics.total_lines, 1);
    }

    #[test]
    fn test_cut_operator_resolved_per_partition() {
        let zeroed = |mut record: Record| {
            record.production_date = Some("00.00.0000".to_string());
            record
        };
        let records = vec![
            zeroed(line("7", true, None, Warehouse::Dp40)),
            line("7", false, Some("ANA"), Warehouse::Dp01),
            line("7", false, Some("BETO"), Warehouse::Dp40),
        ];
        let snapshot = run(&records);

        let dp40 = &snapshot.partition(Warehouse::Dp40).unwrap().metrics.cuts;
        assert_eq!(dp40.total_cuts, 1);
        assert_eq!(dp40.by_operator[0].key, "BETO");

        // 总计仍取 NT 全部行中的首个分配人员
        let overall = &snapshot.overall.metrics.cuts;
        assert_eq!(overall.by_operator[0].key, "ANA");
    }
}
