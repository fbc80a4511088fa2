// ==========================================
// NT 拣货进度看板 - 原始行备份仓储
// ==========================================
// 表: raw_row_backup（只追加，按 refresh_id 归组）
// 行内容以 JSON 保存，列名排序后序列化
// ==========================================

use crate::domain::record::RawRow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub struct RawBackupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RawBackupRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        let repo = Self { conn };
        if let Err(e) = repo.ensure_tables() {
            tracing::warn!("raw_row_backup ensure failed: {}", e);
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
            CREATE TABLE IF NOT EXISTS raw_row_backup (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              refresh_id TEXT NOT NULL,
              backed_up_at TEXT NOT NULL,
              row_number INTEGER NOT NULL,
              row_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_raw_row_backup_refresh
              ON raw_row_backup(refresh_id, row_number);
            "#,
        )?;
        Ok(())
    }

    /// 在单个事务中追加一次刷新的全部原始行
    ///
    /// 返回写入行数
    pub fn append_rows(
        &self,
        refresh_id: &str,
        backed_up_at: &str,
        rows: &[RawRow],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO raw_row_backup (refresh_id, backed_up_at, row_number, row_json)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (idx, row) in rows.iter().enumerate() {
                let ordered: BTreeMap<&String, &String> = row.iter().collect();
                let row_json = serde_json::to_string(&ordered)?;
                stmt.execute(params![refresh_id, backed_up_at, (idx + 1) as i64, row_json])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(rows.len())
    }

    pub fn count_by_refresh(&self, refresh_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM raw_row_backup WHERE refresh_id = ?1",
            params![refresh_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 读取某次刷新的备份行（按行号）
    pub fn load_rows(&self, refresh_id: &str) -> RepositoryResult<Vec<RawRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT row_json FROM raw_row_backup WHERE refresh_id = ?1 ORDER BY row_number",
        )?;
        let payloads = stmt
            .query_map(params![refresh_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|json| serde_json::from_str::<RawRow>(json).map_err(RepositoryError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(nt: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert("NUMERO_NT".to_string(), nt.to_string());
        row.insert("DEPOSITO".to_string(), "DP01".to_string());
        row
    }

    #[test]
    fn test_append_and_load() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = RawBackupRepository::new(conn);

        let written = repo
            .append_rows("r1", "2026-10-19T08:00:00Z", &[row("1"), row("2")])
            .unwrap();
        assert_eq!(written, 2);
        repo.append_rows("r2", "2026-10-19T08:05:00Z", &[row("3")]).unwrap();

        assert_eq!(repo.count_by_refresh("r1").unwrap(), 2);
        let loaded = repo.load_rows("r1").unwrap();
        assert_eq!(loaded[1].get("NUMERO_NT"), Some(&"2".to_string()));
    }
}
