// ==========================================
// NT 拣货进度看板 - 核心库
// ==========================================
// 职责: NT 状态分类与指标聚合引擎
// 技术栈: Rust + Tokio + SQLite（仅审计/配置）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 行记录 / 快照 / 进度历史
pub mod domain;

// 导入层 - 导出文件解析与规范化
pub mod importer;

// 引擎层 - 状态判定 / 分段 / 聚合
pub mod engine;

// 刷新周期层 - 编排与快照发布
pub mod refresh;

// 数据仓储层 - 审计存储
pub mod repository;

// 配置层 - 启动期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 展示层接口
pub mod api;

// 应用层 - 进程组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    MetricsSnapshot, NtAggregate, NtStatus, PartitionMetrics, ProgressHistory, Record, Sector,
    SegmentTag, Warehouse,
};

pub use config::{ConfigError, ConfigManager, DashboardConfig};
pub use engine::{CompletionForecast, MetricsAggregator, SegmentationFilter, StatusClassifier};
pub use importer::{ImportError, Normalizer};
pub use refresh::{
    DashboardView, RefreshCoordinator, RefreshError, RefreshStatus, RefreshTrigger,
};

// ==========================================
// 系统常量
// ==========================================

/// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 系统名称
pub const APP_NAME: &str = "NT 拣货进度看板";
