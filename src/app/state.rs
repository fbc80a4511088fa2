// ==========================================
// NT 拣货进度看板 - 应用状态
// ==========================================
// 职责: 组装配置 / 仓储 / 刷新协调器 / API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::api::DashboardApi;
use crate::config::{ConfigManager, DashboardConfig};
use crate::db::{open_shared_connection, SharedConnection};
use crate::refresh::{CsvBackupSink, FileRowSource, RefreshCoordinator, SqliteBackupSink};
use crate::repository::{RawBackupRepository, RefreshLogRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "NT_DASHBOARD_DB_PATH";

/// 应用状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 校验后的配置（进程生命周期内不变）
    pub config: Arc<DashboardConfig>,

    /// 刷新协调器
    pub coordinator: Arc<RefreshCoordinator>,

    /// 看板 API
    pub dashboard_api: Arc<DashboardApi>,

    /// 刷新日志仓储
    pub refresh_log_repo: Arc<RefreshLogRepository>,
}

impl AppState {
    /// 打开数据库、写入缺省配置并加载配置后组装
    ///
    /// # 说明
    /// 配置非法（如正式员工名单为空）时返回错误，进程应终止
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;

        let config_manager = ConfigManager::from_connection(conn.clone())?;
        let seeded = config_manager.seed_defaults()?;
        if seeded > 0 {
            tracing::info!(seeded, "已写入缺省配置");
        }
        let config = config_manager.load_dashboard_config()?;

        Ok(Self::with_config(db_path, conn, config))
    }

    /// 使用已加载的配置组装（测试 / 单次刷新工具）
    pub fn with_config(
        db_path: String,
        conn: SharedConnection,
        config: DashboardConfig,
    ) -> Self {
        let config = Arc::new(config);

        // ==========================================
        // 仓储层
        // ==========================================
        let refresh_log_repo = Arc::new(RefreshLogRepository::new(conn.clone()));
        let raw_backup_repo = Arc::new(RawBackupRepository::new(conn));

        // ==========================================
        // 刷新协调器
        // ==========================================
        let source = Arc::new(FileRowSource::new(config.source.clone()));
        let coordinator = Arc::new(
            RefreshCoordinator::new(config.clone(), source)
                .with_backup_sink(Arc::new(CsvBackupSink::new(
                    config.backup_dir.clone(),
                    config.source.delimiter,
                )))
                .with_backup_sink(Arc::new(SqliteBackupSink::new(raw_backup_repo)))
                .with_refresh_log(refresh_log_repo.clone()),
        );

        // ==========================================
        // API 层
        // ==========================================
        let dashboard_api = Arc::new(DashboardApi::new(
            coordinator.clone(),
            Some(refresh_log_repo.clone()),
        ));

        tracing::info!(
            source = %config.source.path.display(),
            partitions = config.warehouse_sectors.len(),
            normal_staff = config.normal_staff.len(),
            "AppState初始化完成"
        );

        Self {
            db_path,
            config,
            coordinator,
            dashboard_api,
            refresh_log_repo,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 NT_DASHBOARD_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./nt_progress_dashboard.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("nt-progress-dashboard");
        // best-effort: 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("nt_progress_dashboard.db");
        }
    }

    path.to_string_lossy().to_string()
}
