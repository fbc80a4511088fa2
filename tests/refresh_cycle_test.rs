// ==========================================
// 刷新周期集成测试
// ==========================================
// 测试目标: 发布 / 失败回退 / 备份独立性 / 周期锁
// ==========================================


use std::sync::Arc;
use std::time::Duration;

use nt_progress::db::open_shared_connection;
use nt_progress::importer::ImportError;
use nt_progress::logging;
use nt_progress::refresh::{
    CsvBackupSink, FileRowSource, RefreshCoordinator, RefreshError, RefreshErrorKind,
    RefreshTrigger,
};
use nt_progress::repository::RefreshLogRepository;
use test_helpers::{
    create_test_db, extraction, sample_lines, test_config, test_config_with_threshold,
    write_export_csv, GatedRowSource, RecordingBackupSink, ScriptedRowSource,
};

fn file_coordinator(config: nt_progress::DashboardConfig) -> RefreshCoordinator {
    let source = Arc::new(FileRowSource::new(config.source.clone()));
    RefreshCoordinator::new(Arc::new(config), source)
}

#[tokio::test]
async fn test_successful_refresh_publishes_snapshot() {
    logging::init_test();

    let dir = tempfile::tempdir().unwrap();
    let path = write_export_csv(dir.path(), "mod.csv", &sample_lines());
    let coordinator = file_coordinator(test_config(&path));

    assert!(coordinator.view().snapshot.is_none());

    let report = coordinator.refresh(RefreshTrigger::Manual).await.unwrap();
    let view = coordinator.view();

    let snapshot = view.snapshot.as_ref().unwrap();
    assert!(Arc::ptr_eq(snapshot, &report.snapshot));
    assert_eq!(snapshot.overall.metrics.total_lines, 5);
    assert!(!view.status.stale);
    assert_eq!(view.status.last_success_at, Some(snapshot.generated_at));
    assert!(view.status.last_error.is_none());
}

#[tokio::test]
async fn test_missing_file_keeps_previous_snapshot_and_marks_stale() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_csv(dir.path(), "mod.csv", &sample_lines());
    let coordinator = file_coordinator(test_config(&path));

    coordinator.refresh(RefreshTrigger::Scheduled).await.unwrap();
    let before = coordinator.view();

    std::fs::remove_file(&path).unwrap();
    let err = coordinator
        .refresh(RefreshTrigger::Scheduled)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), RefreshErrorKind::SourceUnavailable);

    let after = coordinator.view();
    // 同一快照对象
    assert!(Arc::ptr_eq(
        before.snapshot.as_ref().unwrap(),
        after.snapshot.as_ref().unwrap()
    ));
    assert!(after.status.stale);
    assert_eq!(after.status.last_success_at, before.status.last_success_at);
    assert_eq!(
        after.status.last_error.as_ref().unwrap().kind,
        RefreshErrorKind::SourceUnavailable
    );
    // 失败不追加进度点
    assert_eq!(after.history, before.history);
}

#[tokio::test]
async fn test_schema_mismatch_is_surfaced_and_previous_retained() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_csv(dir.path(), "mod.csv", &sample_lines());
    let coordinator = file_coordinator(test_config(&path));
    coordinator.refresh(RefreshTrigger::Scheduled).await.unwrap();

    std::fs::write(&path, "NUMERO_NT;MATERIAL\n1;A\n").unwrap();
    match coordinator.refresh(RefreshTrigger::Scheduled).await {
        Err(RefreshError::SchemaMismatch { missing }) => {
            assert!(missing.contains(&"DEPOSITO".to_string()));
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }

    let view = coordinator.view();
    assert!(view.status.stale);
    assert!(view.snapshot.is_some());
    let info = view.status.last_error.as_ref().unwrap();
    assert_eq!(info.kind, RefreshErrorKind::SchemaMismatch);
    assert!(info.message.contains("DEPOSITO"));
}

#[tokio::test]
async fn test_rejection_threshold_blocks_publish_but_not_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_csv(
        dir.path(),
        "mod.csv",
        &[
            ("1", "A", "X", "", "1", "DP01", ""),
            ("2", "B", "", "", "abc", "DP01", ""),
            ("3", "C", "", "", "abc", "DP40", ""),
        ],
    );
    let config = test_config_with_threshold(&path, 0.5);
    let backup_dir = dir.path().join("backup_dados");
    let recording = Arc::new(RecordingBackupSink::default());

    let source = Arc::new(FileRowSource::new(config.source.clone()));
    let coordinator = RefreshCoordinator::new(Arc::new(config), source)
        .with_backup_sink(recording.clone())
        .with_backup_sink(Arc::new(CsvBackupSink::new(&backup_dir, b';')));

    match coordinator.refresh(RefreshTrigger::Manual).await {
        Err(RefreshError::RejectionThresholdExceeded {
            rejected, total, ..
        }) => {
            assert_eq!(rejected, 2);
            assert_eq!(total, 3);
        }
        other => panic!("expected threshold error, got {other:?}"),
    }

    let view = coordinator.view();
    assert!(view.snapshot.is_none());
    assert!(view.status.stale);

    coordinator.flush_backups().await;
    assert_eq!(recording.calls(), 1);
    assert_eq!(recording.rows(), 3);
    let backups: Vec<_> = std::fs::read_dir(&backup_dir).unwrap().collect();
    assert_eq!(backups.len(), 1);
}

#[tokio::test]
async fn test_schema_mismatch_is_not_backed_up() {
    let recording = Arc::new(RecordingBackupSink::default());
    let mut bad = extraction(&sample_lines());
    bad.headers.retain(|h| h != "DEPOSITO");

    let source = Arc::new(ScriptedRowSource::new(vec![Ok(bad)]));
    let coordinator = RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source)
        .with_backup_sink(recording.clone());

    assert!(coordinator.refresh(RefreshTrigger::Manual).await.is_err());
    coordinator.flush_backups().await;
    assert_eq!(recording.calls(), 0);
}

#[tokio::test]
async fn test_empty_export_publishes_zero_snapshot() {
    let source = Arc::new(ScriptedRowSource::new(vec![Ok(extraction(&[]))]));
    let coordinator = RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source);

    let report = coordinator.refresh(RefreshTrigger::Manual).await.unwrap();
    assert_eq!(report.snapshot.raw_row_count, 0);
    assert_eq!(report.snapshot.partitions.len(), 2);
    assert_eq!(report.snapshot.overall.metrics.percent_finalized, 0.0);
}

#[tokio::test]
async fn test_recovery_after_failure_clears_stale() {
    let source = Arc::new(ScriptedRowSource::new(vec![
        Ok(extraction(&sample_lines())),
        ScriptedRowSource::unavailable(),
        Ok(extraction(&sample_lines())),
    ]));
    let coordinator = RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source);

    coordinator.refresh(RefreshTrigger::Scheduled).await.unwrap();
    assert!(coordinator.refresh(RefreshTrigger::Scheduled).await.is_err());
    assert!(coordinator.view().status.stale);

    coordinator.refresh(RefreshTrigger::Scheduled).await.unwrap();
    let view = coordinator.view();
    assert!(!view.status.stale);
    assert!(view.status.last_error.is_none());
    // 两次成功 → 每个仓库两个进度点
    assert_eq!(view.history.points(nt_progress::Warehouse::Dp01).len(), 2);
}

#[tokio::test]
async fn test_try_refresh_rejects_overlapping_cycle() {
    let source = Arc::new(GatedRowSource::new(extraction(&sample_lines())));
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(test_config("mod.csv")),
        source.clone(),
    ));

    let running = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.refresh(RefreshTrigger::Scheduled).await })
    };
    source.entered.notified().await;

    let overlapping = coordinator.try_refresh(RefreshTrigger::Manual).await;
    assert!(matches!(overlapping, Err(RefreshError::RefreshInProgress)));
    // 被拒绝的请求不影响视图
    assert!(!coordinator.view().status.stale);

    source.gate.notify_one();
    let report = running.await.unwrap().unwrap();
    assert_eq!(report.trigger, RefreshTrigger::Scheduled);
    assert!(coordinator.view().snapshot.is_some());
}

#[tokio::test]
async fn test_cancelled_refresh_leaves_view_untouched() {
    let source = Arc::new(GatedRowSource::new(extraction(&sample_lines())));
    let coordinator = RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source.clone());

    let before = coordinator.view();
    let timed_out = tokio::time::timeout(
        Duration::from_millis(50),
        coordinator.refresh(RefreshTrigger::Manual),
    )
    .await;
    assert!(timed_out.is_err());

    let after = coordinator.view();
    assert!(Arc::ptr_eq(&before, &after));

    // 周期锁已释放
    source.gate.notify_one();
    coordinator.try_refresh(RefreshTrigger::Manual).await.unwrap();
}

#[tokio::test]
async fn test_each_cycle_writes_refresh_log() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_connection(&db_path).unwrap();
    let repo = Arc::new(RefreshLogRepository::new(conn));

    let source = Arc::new(ScriptedRowSource::new(vec![
        Ok(extraction(&sample_lines())),
        Err(ImportError::EncodingError("bad byte".to_string())),
    ]));
    let coordinator = RefreshCoordinator::new(Arc::new(test_config("mod.csv")), source)
        .with_refresh_log(repo.clone());

    let report = coordinator.refresh(RefreshTrigger::Manual).await.unwrap();
    let _ = coordinator.refresh(RefreshTrigger::Scheduled).await;

    let success = repo.find_by_id(&report.refresh_id).unwrap().unwrap();
    assert_eq!(success.status, "SUCCESS");
    assert_eq!(success.trigger_type, "MANUAL");
    assert_eq!(success.total_lines, 5);

    let logs = repo.list_recent(10).unwrap();
    assert_eq!(logs.len(), 2);
    let failed = logs.iter().find(|l| l.status == "FAILED").unwrap();
    assert_eq!(failed.error_kind.as_deref(), Some("SOURCE_UNAVAILABLE"));
}

#[tokio::test]
async fn test_threshold_failure_log_keeps_row_counts() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_connection(&db_path).unwrap();
    let repo = Arc::new(RefreshLogRepository::new(conn));

    let source = Arc::new(ScriptedRowSource::new(vec![Ok(extraction(&[
        ("1", "A", "X", "", "1", "DP01", ""),
        ("2", "B", "", "", "abc", "DP01", ""),
        ("3", "C", "", "", "abc", "DP40", ""),
    ]))]));
    let coordinator =
        RefreshCoordinator::new(Arc::new(test_config_with_threshold("mod.csv", 0.5)), source)
            .with_refresh_log(repo.clone());

    assert!(coordinator.refresh(RefreshTrigger::Manual).await.is_err());

    let logs = repo.list_recent(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "FAILED");
    assert_eq!(logs[0].error_kind.as_deref(), Some("REJECTION_THRESHOLD_EXCEEDED"));
    assert_eq!(logs[0].raw_row_count, 3);
    assert_eq!(logs[0].rejected_row_count, 2);
    assert_eq!(logs[0].total_lines, 0);
}
