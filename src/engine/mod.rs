// ==========================================
// NT 拣货进度看板 - 引擎层
// ==========================================
// 职责: 状态判定 / 人员分段 / 指标聚合 / 排名 / 缺货 / 完工预测
// 红线: 引擎全部为纯计算，不做 I/O
// ==========================================

pub mod aggregator;
pub mod cuts;
pub mod forecast;
pub mod ranking;
pub mod segmentation;
pub mod status_classifier;

// 重导出核心引擎
pub use aggregator::{AggregationInput, MetricsAggregator};
pub use cuts::{is_cut, CutAccumulator, CutOperators, UNIDENTIFIED_OPERATOR};
pub use forecast::{CompletionForecast, ForecastEngine};
pub use ranking::{top_n, RankingAccumulator};
pub use segmentation::{SegmentationFilter, StaffRoster};
pub use status_classifier::StatusClassifier;
