// ==========================================
// NT 拣货进度看板 - 完工预测
// ==========================================
// 输入: 某仓库的进度历史（按时间顺序）
// 口径: 取最近两个进度点的完成行增量 / 时间增量（行/分钟）
// ==========================================

use crate::domain::progress::ProgressPoint;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionForecast {
    /// 进度点少于 2 个
    Insufficient { latest: Option<ProgressPoint> },
    /// 最近两次刷新之间无进展
    NoProgress { latest: ProgressPoint },
    Estimate {
        rate_per_minute: f64,
        remaining_lines: usize,
        minutes_remaining: f64,
        /// 超出可表示的时间范围时为 None
        estimated_completion: Option<DateTime<Utc>>,
        latest: ProgressPoint,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEngine;

impl ForecastEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn forecast(&self, points: &[ProgressPoint]) -> CompletionForecast {
        let (previous, latest) = match points {
            [.., previous, latest] => (*previous, *latest),
            _ => {
                return CompletionForecast::Insufficient {
                    latest: points.last().copied(),
                }
            }
        };

        let delta_finalized = latest.finalized_lines as f64 - previous.finalized_lines as f64;
        let delta_minutes =
            (latest.recorded_at - previous.recorded_at).num_milliseconds() as f64 / 60_000.0;

        if delta_finalized <= 0.0 || delta_minutes <= 0.0 {
            return CompletionForecast::NoProgress { latest };
        }

        let rate_per_minute = delta_finalized / delta_minutes;
        let remaining_lines = latest.total_lines.saturating_sub(latest.finalized_lines);
        let minutes_remaining = remaining_lines as f64 / rate_per_minute;
        let estimated_completion = eta(latest.recorded_at, minutes_remaining);

        CompletionForecast::Estimate {
            rate_per_minute,
            remaining_lines,
            minutes_remaining,
            estimated_completion,
            latest,
        }
    }
}

/// recorded_at + minutes_remaining；溢出返回 None
fn eta(recorded_at: DateTime<Utc>, minutes_remaining: f64) -> Option<DateTime<Utc>> {
    let millis = (minutes_remaining * 60_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    recorded_at.checked_add_signed(delta)
}
