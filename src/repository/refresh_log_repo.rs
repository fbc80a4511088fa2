// ==========================================
// NT 拣货进度看板 - 刷新日志仓储
// ==========================================
// 表: refresh_log（每次刷新周期一行，尽力写入）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshLogEntity {
    pub refresh_id: String,
    /// SCHEDULED / MANUAL
    pub trigger_type: String,
    pub started_at: String,
    pub completed_at: String,
    pub duration_ms: i64,
    /// SUCCESS / FAILED
    pub status: String,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub raw_row_count: i64,
    pub rejected_row_count: i64,
    pub total_lines: i64,
}

pub struct RefreshLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RefreshLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        // best-effort: 建表失败不阻断启动
        if let Err(e) = repo.ensure_tables() {
            tracing::warn!("refresh_log ensure failed: {}", e);
        }
        repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS refresh_log (
              refresh_id TEXT PRIMARY KEY,
              trigger_type TEXT NOT NULL,
              started_at TEXT NOT NULL,
              completed_at TEXT NOT NULL,
              duration_ms INTEGER NOT NULL DEFAULT 0,
              status TEXT NOT NULL,
              error_kind TEXT,
              error_message TEXT,
              raw_row_count INTEGER NOT NULL DEFAULT 0,
              rejected_row_count INTEGER NOT NULL DEFAULT 0,
              total_lines INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_refresh_log_started
              ON refresh_log(started_at DESC);
            "#,
        )?;
        Ok(())
    }

    pub fn insert(&self, entity: &RefreshLogEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO refresh_log (
              refresh_id, trigger_type, started_at, completed_at, duration_ms,
              status, error_kind, error_message,
              raw_row_count, rejected_row_count, total_lines
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                entity.refresh_id,
                entity.trigger_type,
                entity.started_at,
                entity.completed_at,
                entity.duration_ms,
                entity.status,
                entity.error_kind,
                entity.error_message,
                entity.raw_row_count,
                entity.rejected_row_count,
                entity.total_lines,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, refresh_id: &str) -> RepositoryResult<Option<RefreshLogEntity>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"
            SELECT
              refresh_id, trigger_type, started_at, completed_at, duration_ms,
              status, error_kind, error_message,
              raw_row_count, rejected_row_count, total_lines
            FROM refresh_log
            WHERE refresh_id = ?1
            "#,
            params![refresh_id],
            |row| map_log_row(row),
        )
        .optional()
        .map_err(|e| e.into())
    }

    /// 最近 N 条（按开始时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<RefreshLogEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
              refresh_id, trigger_type, started_at, completed_at, duration_ms,
              status, error_kind, error_message,
              raw_row_count, rejected_row_count, total_lines
            FROM refresh_log
            ORDER BY started_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| map_log_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_log_row(row: &Row) -> rusqlite::Result<RefreshLogEntity> {
    Ok(RefreshLogEntity {
        refresh_id: row.get(0)?,
        trigger_type: row.get(1)?,
        started_at: row.get(2)?,
        completed_at: row.get(3)?,
        duration_ms: row.get(4)?,
        status: row.get(5)?,
        error_kind: row.get(6)?,
        error_message: row.get(7)?,
        raw_row_count: row.get(8)?,
        rejected_row_count: row.get(9)?,
        total_lines: row.get(10)?,
    })
}
