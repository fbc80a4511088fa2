// ==========================================
// NT 拣货进度看板 - 主入口
// ==========================================
// 运行方式: 定时刷新循环，直到 Ctrl-C
// 启动期配置错误直接退出
// ==========================================

use std::sync::Arc;

use nt_progress::app::{get_default_db_path, AppState};
use nt_progress::refresh::{RefreshCoordinator, RefreshTrigger};
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nt_progress::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", nt_progress::APP_NAME);
    tracing::info!("系统版本: {}", nt_progress::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path)?;
    let coordinator = app_state.coordinator.clone();
    let interval = app_state.config.refresh_interval;
    tracing::info!(interval_secs = interval.as_secs(), "启动定时刷新");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_scheduled(&coordinator).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到退出信号，等待备份任务结束");
                break;
            }
        }
    }

    coordinator.flush_backups().await;
    tracing::info!("已退出");
    Ok(())
}

async fn run_scheduled(coordinator: &Arc<RefreshCoordinator>) {
    match coordinator.try_refresh(RefreshTrigger::Scheduled).await {
        Ok(report) => tracing::info!(
            refresh_id = %report.refresh_id,
            duration_ms = report.duration_ms,
            "定时刷新完成"
        ),
        // 失败已在视图中标记过期，这里只记录
        Err(e) => tracing::warn!(kind = e.kind().as_str(), error = %e, "定时刷新失败"),
    }
}
