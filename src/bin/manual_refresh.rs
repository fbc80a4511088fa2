// Small ops utility: run one refresh cycle and print the resulting view as JSON.
//
// Usage:
//   cargo run --bin manual_refresh -- [db_path] [source_path]
//
// Does not start the scheduled loop.

use anyhow::Context;
use nt_progress::app::{get_default_db_path, AppState};
use nt_progress::config::ConfigManager;
use nt_progress::db::open_shared_connection;
use nt_progress::refresh::RefreshTrigger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nt_progress::logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let source_override = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let conn = open_shared_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    let config_manager = ConfigManager::from_connection(conn.clone())?;
    config_manager.seed_defaults()?;
    let mut config = config_manager.load_dashboard_config()?;
    if let Some(path) = source_override {
        config.source.path = path.into();
    }

    let app_state = AppState::with_config(db_path, conn, config);
    let result = app_state.coordinator.refresh(RefreshTrigger::Manual).await;
    app_state.coordinator.flush_backups().await;

    let view = app_state.coordinator.view();
    println!("{}", serde_json::to_string_pretty(view.as_ref())?);

    let report = result?;
    eprintln!(
        "refresh_id={} duration_ms={}",
        report.refresh_id, report.duration_ms
    );
    Ok(())
}
