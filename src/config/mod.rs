// ==========================================
// NT 拣货进度看板 - 配置层
// ==========================================
// 职责: 启动期加载配置，进程生命周期内静态不变
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod dashboard_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager, SOURCE_PATH_ENV};
pub use dashboard_config::{
    ConfigError, ConfigResult, DashboardConfig, RawDashboardConfig, SourceEncoding,
    SourceSettings,
};
