// ==========================================
// 指标引擎集成测试
// ==========================================
// 测试目标: 规范化 → 状态判定 → 人员分段 → 聚合 的整体口径
// ==========================================


use chrono::{TimeZone, Utc};
use nt_progress::config::DashboardConfig;
use nt_progress::domain::{MetricsSnapshot, NtStatus, RawExtraction, SegmentTag, Warehouse};
use nt_progress::engine::{
    AggregationInput, MetricsAggregator, SegmentationFilter, StaffRoster, StatusClassifier,
};
use nt_progress::importer::Normalizer;
use test_helpers::{extraction, sample_lines, test_config, ExportLine};

fn run_pipeline(raw: &RawExtraction, config: &DashboardConfig) -> MetricsSnapshot {
    let batch = Normalizer.normalize(raw, config).unwrap();
    let aggregates = StatusClassifier::new().group_and_classify(&batch.records);
    let segmented =
        SegmentationFilter::new(StaffRoster::from_config(config)).segment_records(&batch.records);
    MetricsAggregator::from_config(config).aggregate(AggregationInput {
        aggregates: &aggregates,
        segmented: &segmented,
        raw_row_count: batch.raw_row_count,
        rejections: batch.rejections,
        generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap(),
    })
}

fn status_of(lines: &[ExportLine<'_>], nt: &str) -> NtStatus {
    let config = test_config("mod.csv");
    let batch = Normalizer.normalize(&extraction(lines), &config).unwrap();
    StatusClassifier::new()
        .group_and_classify(&batch.records)
        .into_iter()
        .find(|a| a.nt_id == nt)
        .map(|a| a.status)
        .unwrap()
}

// ==========================================
// 场景 A-D
// ==========================================

#[test]
fn test_all_finalized_nt_is_finalizada_and_sums_quantity() {
    let lines = [
        ("100020", "A", "X", "FERN.PINTO", "1,5", "DP01", "18.10.2026"),
        ("100020", "B", "X", "FERN.PINTO", "2", "DP01", "18.10.2026"),
        ("100020", "C", "X", "", "0,5", "DP01", "18.10.2026"),
    ];
    assert_eq!(status_of(&lines, "100020"), NtStatus::Finalizada);

    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));
    let dp01 = snapshot.partition(Warehouse::Dp01).unwrap();
    assert_eq!(dp01.metrics.total_quantity, 4.0);
    assert_eq!(dp01.metrics.percent_finalized, 100.0);
    assert_eq!(dp01.metrics.nt_status_counts.finalizada, 1);
}

#[test]
fn test_partially_assigned_nt_is_em_separacao() {
    let lines = [
        ("100021", "A", "X", "", "1", "DP01", ""),
        ("100021", "B", "", "joao", "1", "DP01", ""),
        ("100021", "C", "", "", "1", "DP01", ""),
    ];
    assert_eq!(status_of(&lines, "100021"), NtStatus::EmSeparacao);
}

#[test]
fn test_untouched_nt_is_pendente() {
    let lines = [
        ("100022", "A", "", "", "1", "DP40", ""),
        ("100022", "B", "", "", "1", "DP40", ""),
        ("100022", "C", "", "", "1", "DP40", ""),
    ];
    assert_eq!(status_of(&lines, "100022"), NtStatus::Pendente);
}

#[test]
fn test_non_numeric_quantity_is_rejected_and_excluded() {
    let lines = [
        ("100030", "A", "X", "", "2", "DP01", ""),
        ("100030", "B", "X", "", "dois", "DP01", ""),
    ];
    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));

    assert_eq!(snapshot.rejected_row_count, 1);
    assert_eq!(snapshot.overall.metrics.total_lines, 1);
    assert_eq!(snapshot.overall.metrics.total_quantity, 2.0);
    let partition_lines: usize = snapshot
        .partitions
        .iter()
        .map(|p| p.metrics.total_lines)
        .sum();
    assert_eq!(partition_lines, 1);
}

// ==========================================
// 全局性质
// ==========================================

/// 确定性伪随机导出数据（线性同余）
fn generated_lines(seed: u64, count: usize) -> Vec<(String, String, String, String, String, String)> {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let assignees = ["", "", "FERN.PINTO", "gaby.dacosta", "TEMP.01", "TEMP.02"];
    (0..count)
        .map(|_| {
            let nt = format!("{}", 200000 + next() % 25);
            let item = format!("{}", 7000 + next() % 50);
            let done = if next() % 3 == 0 { "" } else { "X" }.to_string();
            let assignee = assignees[next() % assignees.len()].to_string();
            let qty = match next() % 10 {
                0 => "x1".to_string(),
                n => format!("{},{}", n, next() % 100),
            };
            let warehouse = if next() % 2 == 0 { "DP01" } else { "DP40" }.to_string();
            (nt, item, done, assignee, qty, warehouse)
        })
        .collect()
}

fn generated_extraction(seed: u64, count: usize) -> RawExtraction {
    let owned = generated_lines(seed, count);
    let lines: Vec<ExportLine<'_>> = owned
        .iter()
        .map(|(nt, item, done, assignee, qty, wh)| {
            (
                nt.as_str(),
                item.as_str(),
                done.as_str(),
                assignee.as_str(),
                qty.as_str(),
                wh.as_str(),
                "",
            )
        })
        .collect();
    extraction(&lines)
}

#[test]
fn test_snapshot_invariants_hold_for_generated_exports() {
    let config = test_config("mod.csv");

    for seed in 1..=20u64 {
        let raw = generated_extraction(seed, 120);
        let snapshot = run_pipeline(&raw, &config);
        let overall = &snapshot.overall.metrics;

        // 行数守恒
        assert_eq!(
            overall.total_lines + snapshot.rejected_row_count,
            snapshot.raw_row_count,
            "seed {seed}"
        );

        // 状态计数之和 = 不同 NT 数
        let batch = Normalizer.normalize(&raw, &config).unwrap();
        let aggregates = StatusClassifier::new().group_and_classify(&batch.records);
        assert_eq!(overall.nt_status_counts.total(), aggregates.len());
        assert_eq!(snapshot.distinct_nt_count(), aggregates.len());

        let partition_status_total: usize = snapshot
            .partitions
            .iter()
            .map(|p| p.metrics.nt_status_counts.total())
            .sum();
        assert_eq!(
            partition_status_total + snapshot.overall.cross_partition_nt_count,
            aggregates.len()
        );

        // 状态判定口径
        for aggregate in &aggregates {
            let all_done = aggregate.lines.iter().all(|r| r.finalized);
            let any_assigned = aggregate.lines.iter().any(|r| r.has_assignee());
            let expected = if all_done {
                NtStatus::Finalizada
            } else if any_assigned {
                NtStatus::EmSeparacao
            } else {
                NtStatus::Pendente
            };
            assert_eq!(aggregate.status, expected);
        }

        // 百分比范围
        for metrics in snapshot
            .partitions
            .iter()
            .map(|p| &p.metrics)
            .chain(std::iter::once(overall))
        {
            assert!((0.0..=100.0).contains(&metrics.percent_finalized));
            assert_eq!(metrics.segments.total_lines(), metrics.total_lines);
        }

        // 分区行数之和 = 总计行数
        let partition_lines: usize = snapshot.partitions.iter().map(|p| p.metrics.total_lines).sum();
        assert_eq!(partition_lines, overall.total_lines);
    }
}

#[test]
fn test_percent_is_exactly_100_when_everything_finalized() {
    let lines = [
        ("1", "A", "X", "", "1", "DP01", ""),
        ("2", "B", "x", "TEMP", "1", "DP01", ""),
    ];
    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));
    assert_eq!(snapshot.overall.metrics.percent_finalized, 100.0);
    // 无数据的分区仍然输出且为 0
    assert_eq!(
        snapshot.partition(Warehouse::Dp40).unwrap().metrics.percent_finalized,
        0.0
    );
}

#[test]
fn test_aggregation_is_byte_identical_on_rerun() {
    let config = test_config("mod.csv");
    let raw = generated_extraction(42, 200);

    let first = serde_json::to_string(&run_pipeline(&raw, &config)).unwrap();
    let second = serde_json::to_string(&run_pipeline(&raw, &config)).unwrap();
    assert_eq!(first, second);
}

// ==========================================
// 跨分区 NT
// ==========================================

#[test]
fn test_nt_status_follows_majority_partition() {
    let lines = [
        ("300", "A", "", "TEMP", "1", "DP40", ""),
        ("300", "B", "", "", "1", "DP40", ""),
        ("300", "C", "", "", "1", "DP01", ""),
    ];
    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));

    let dp40 = snapshot.partition(Warehouse::Dp40).unwrap();
    let dp01 = snapshot.partition(Warehouse::Dp01).unwrap();
    assert_eq!(dp40.metrics.nt_status_counts.em_separacao, 1);
    assert_eq!(dp01.metrics.nt_status_counts.total(), 0);
    // 行级仍按各自分区
    assert_eq!(dp01.metrics.total_lines, 1);
    assert_eq!(snapshot.overall.cross_partition_nt_count, 0);
}

#[test]
fn test_tied_nt_counts_only_in_overall() {
    let lines = [
        ("301", "A", "X", "", "1", "DP40", ""),
        ("301", "B", "X", "", "1", "DP01", ""),
    ];
    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));

    assert_eq!(snapshot.overall.cross_partition_nt_count, 1);
    assert_eq!(snapshot.overall.metrics.nt_status_counts.finalizada, 1);
    assert!(snapshot
        .partitions
        .iter()
        .all(|p| p.metrics.nt_status_counts.total() == 0 && p.metrics.nt_count == 0));
}

// ==========================================
// 分段 / 排名 / 缺货
// ==========================================

#[test]
fn test_segments_ranking_and_cuts_on_sample_export() {
    let snapshot = run_pipeline(&extraction(&sample_lines()), &test_config("mod.csv"));

    let dp01 = snapshot.partition(Warehouse::Dp01).unwrap();
    assert_eq!(dp01.metrics.segments.get(SegmentTag::Normal).lines, 2);
    assert_eq!(dp01.metrics.segments.get(SegmentTag::Reforco).lines, 1);
    assert_eq!(dp01.metrics.operator_ranking[0].assignee, "FERN.PINTO");
    assert_eq!(dp01.metrics.operator_ranking[0].finalized_lines, 2);
    assert_eq!(dp01.metrics.cuts.total_cuts, 0);

    let dp40 = snapshot.partition(Warehouse::Dp40).unwrap();
    assert_eq!(dp40.metrics.segments.get(SegmentTag::Unassigned).lines, 1);
    assert_eq!(dp40.metrics.cuts.total_cuts, 1);
    assert_eq!(dp40.metrics.cuts.by_item[0].key, "5502");
    // 缺货操作员取 NT 首个非空分配人员
    assert_eq!(dp40.metrics.cuts.by_operator[0].key, "ANDR.DACOSTA");

    assert_eq!(snapshot.overall.metrics.cuts.total_cuts, 1);
    assert_eq!(snapshot.overall.metrics.operator_ranking.len(), 2);
}

#[test]
fn test_partition_cut_operator_comes_from_partition_lines() {
    let lines = [
        ("7", "A", "X", "", "1", "DP40", "00.00.0000"),
        ("7", "B", "", "ANA", "1", "DP01", "18.10.2026"),
        ("7", "D", "", "BETO", "1", "DP40", "18.10.2026"),
    ];
    let snapshot = run_pipeline(&extraction(&lines), &test_config("mod.csv"));

    let dp40 = snapshot.partition(Warehouse::Dp40).unwrap();
    assert_eq!(dp40.metrics.cuts.by_operator.len(), 1);
    assert_eq!(dp40.metrics.cuts.by_operator[0].key, "BETO");
    assert_eq!(snapshot.overall.metrics.cuts.by_operator[0].key, "ANA");
}
