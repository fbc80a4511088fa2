// ==========================================
// DashboardApi 集成测试
// ==========================================
// 测试目标: 只读查询 / 输入校验 / 手动刷新 / 完工预测
// ==========================================


use std::sync::Arc;
use std::time::Duration;

use nt_progress::api::{ApiError, DashboardApi};
use nt_progress::db::open_shared_connection;
use nt_progress::domain::RawExtraction;
use nt_progress::engine::CompletionForecast;
use nt_progress::importer::ImportResult;
use nt_progress::refresh::{RefreshCoordinator, RefreshErrorKind};
use nt_progress::repository::RefreshLogRepository;
use test_helpers::{create_test_db, extraction, sample_lines, test_config, ScriptedRowSource};

fn api_with(script: Vec<ImportResult<RawExtraction>>) -> DashboardApi {
    let source = Arc::new(ScriptedRowSource::new(script));
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(test_config("mod.csv")),
        source,
    ));
    DashboardApi::new(coordinator, None)
}

#[tokio::test]
async fn test_queries_before_first_refresh() {
    let api = api_with(vec![]);

    assert!(api.get_view().snapshot.is_none());
    assert!(matches!(api.get_snapshot(), Err(ApiError::NotFound(_))));
    assert!(matches!(
        api.get_partition_by_warehouse("DP01"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        api.get_completion_forecast("DP01"),
        Ok(CompletionForecast::Insufficient { latest: None })
    ));
    assert!(!api.get_refresh_status().stale);
}

#[tokio::test]
async fn test_partition_lookup_by_sector_and_warehouse() {
    let api = api_with(vec![Ok(extraction(&sample_lines()))]);
    api.trigger_manual_refresh().await.unwrap();

    let by_sector = api.get_partition_by_sector("pereciveis").unwrap();
    let by_warehouse = api.get_partition_by_warehouse("dp40").unwrap();
    assert_eq!(by_sector, by_warehouse);
    assert_eq!(by_sector.metrics.total_lines, 2);

    assert!(matches!(
        api.get_partition_by_sector("Bebidas"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.get_partition_by_warehouse("DP99"),
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_ranking_top_n_and_cut_summary() {
    let api = api_with(vec![Ok(extraction(&sample_lines()))]);
    api.trigger_manual_refresh().await.unwrap();

    let top1 = api.get_operator_ranking(None, 1).unwrap();
    assert_eq!(top1.len(), 1);
    assert_eq!(top1[0].assignee, "FERN.PINTO");
    assert_eq!(top1[0].position, 1);

    let dp40 = api.get_operator_ranking(Some("DP40"), 10).unwrap();
    assert_eq!(dp40.len(), 1);

    assert!(matches!(
        api.get_operator_ranking(None, 0),
        Err(ApiError::InvalidInput(_))
    ));

    assert_eq!(api.get_cut_summary(None).unwrap().total_cuts, 1);
    assert_eq!(api.get_cut_summary(Some("DP01")).unwrap().total_cuts, 0);
}

#[tokio::test]
async fn test_failed_manual_refresh_is_reported() {
    let api = api_with(vec![
        Ok(extraction(&sample_lines())),
        ScriptedRowSource::unavailable(),
    ]);
    api.trigger_manual_refresh().await.unwrap();

    match api.trigger_manual_refresh().await {
        Err(ApiError::RefreshFailed { kind, .. }) => {
            assert_eq!(kind, RefreshErrorKind::SourceUnavailable)
        }
        other => panic!("expected refresh failure, got {other:?}"),
    }

    // 旧快照仍可查询，状态为过期
    assert!(api.get_snapshot().is_ok());
    assert!(api.get_refresh_status().stale);
}

#[tokio::test]
async fn test_forecast_after_two_refreshes() {
    let first = extraction(&[
        ("1", "A", "", "", "1", "DP01", ""),
        ("1", "B", "", "", "1", "DP01", ""),
        ("2", "C", "", "", "1", "DP01", ""),
        ("2", "D", "", "", "1", "DP01", ""),
    ]);
    let second = extraction(&[
        ("1", "A", "X", "TEMP", "1", "DP01", ""),
        ("1", "B", "X", "TEMP", "1", "DP01", ""),
        ("2", "C", "", "", "1", "DP01", ""),
        ("2", "D", "", "", "1", "DP01", ""),
    ]);
    let api = api_with(vec![Ok(first), Ok(second)]);

    api.trigger_manual_refresh().await.unwrap();
    assert!(matches!(
        api.get_completion_forecast("DP01").unwrap(),
        CompletionForecast::Insufficient { latest: Some(_) }
    ));

    tokio::time::sleep(Duration::from_millis(20)).await;
    api.trigger_manual_refresh().await.unwrap();

    match api.get_completion_forecast("DP01").unwrap() {
        CompletionForecast::Estimate {
            remaining_lines,
            rate_per_minute,
            ..
        } => {
            assert_eq!(remaining_lines, 2);
            assert!(rate_per_minute > 0.0);
        }
        other => panic!("expected estimate, got {other:?}"),
    }

    // DP40 两次都没有数据 → 无进展
    assert!(matches!(
        api.get_completion_forecast("DP40").unwrap(),
        CompletionForecast::NoProgress { .. }
    ));
}

#[tokio::test]
async fn test_refresh_log_listing() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_connection(&db_path).unwrap();
    let repo = Arc::new(RefreshLogRepository::new(conn));

    let source = Arc::new(ScriptedRowSource::new(vec![Ok(extraction(&sample_lines()))]));
    let coordinator = Arc::new(
        RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source)
            .with_refresh_log(repo.clone()),
    );
    let api = DashboardApi::new(coordinator, Some(repo));

    let report = api.trigger_manual_refresh().await.unwrap();
    let logs = api.list_refresh_log(5).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].refresh_id, report.refresh_id);

    assert!(matches!(api.list_refresh_log(0), Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_view_serializes_for_presentation() {
    let api = api_with(vec![Ok(extraction(&sample_lines()))]);
    api.trigger_manual_refresh().await.unwrap();

    let json = serde_json::to_value(api.get_view().as_ref()).unwrap();
    assert_eq!(json["snapshot"]["partitions"][0]["warehouse"], "DP01");
    assert_eq!(json["snapshot"]["partitions"][1]["sector"], "Perecíveis");
    assert_eq!(json["status"]["stale"], false);
}
