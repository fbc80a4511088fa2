// ==========================================
// NT 拣货进度看板 - API 层
// ==========================================
// 职责: 为展示层提供查询与手动刷新接口
// ==========================================

pub mod dashboard_api;
pub mod error;

pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
