// ==========================================
// NT 拣货进度看板 - SQLite 连接初始化
// ==========================================
// 用途: config_kv / refresh_log / raw_row_backup 共用一个连接
// 约束: 备份写入在阻塞线程池执行，可能与刷新日志写入竞争，
//       所有连接统一 busy_timeout
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 进程内共享的连接句柄
pub type SharedConnection = Arc<Mutex<Connection>>;

/// 为连接应用统一设置（每个连接单独生效）
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接并包装为共享句柄（仓储与配置管理器共用）
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<SharedConnection> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}
