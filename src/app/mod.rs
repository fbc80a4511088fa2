// ==========================================
// NT 拣货进度看板 - 应用层
// ==========================================
// 职责: 进程级组装（配置加载、依赖注入）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
