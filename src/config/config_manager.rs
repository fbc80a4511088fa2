// ==========================================
// NT 拣货进度看板 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载配置，生成不可变 DashboardConfig
// 存储: config_kv 表 (key-value + scope)
// 覆写: 环境变量 NT_DASHBOARD_SOURCE_PATH 覆盖源文件路径
// ==========================================

use crate::config::dashboard_config::{
    ConfigError, ConfigResult, DashboardConfig, RawDashboardConfig,
};
use crate::db::open_shared_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// 源文件路径覆写环境变量
pub const SOURCE_PATH_ENV: &str = "NT_DASHBOARD_SOURCE_PATH";

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        Self::from_connection(open_shared_connection(db_path)?)
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    fn ensure_table(&self) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
              scope_id TEXT NOT NULL,
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 写入缺失的默认配置（已有值保持不变）
    ///
    /// # 返回
    /// - 实际写入的键数量
    pub fn seed_defaults(&self) -> ConfigResult<usize> {
        let defaults = RawDashboardConfig::default();
        let entries = raw_to_entries(&defaults)?;

        let conn = self.get_conn()?;
        let mut inserted = 0;
        for (key, value) in entries {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        info!(inserted = inserted, "默认配置写入完成");
        Ok(inserted)
    }

    /// 读取 global scope 的配置值
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入/覆盖 global scope 的配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 加载并校验看板配置
    ///
    /// # 规则
    /// 1. 缺失的键使用默认值
    /// 2. 环境变量 NT_DASHBOARD_SOURCE_PATH 覆盖 source_path
    /// 3. 校验失败返回 ConfigError（启动期致命）
    pub fn load_dashboard_config(&self) -> ConfigResult<DashboardConfig> {
        let defaults = RawDashboardConfig::default();

        let mut raw = RawDashboardConfig {
            source_path: self.string_or(config_keys::SOURCE_PATH, &defaults.source_path)?,
            source_encoding: self.string_or(config_keys::SOURCE_ENCODING, &defaults.source_encoding)?,
            source_delimiter: self
                .get_config_value(config_keys::SOURCE_DELIMITER)?
                .unwrap_or(defaults.source_delimiter),
            normal_staff: self.json_or(config_keys::NORMAL_STAFF, defaults.normal_staff)?,
            warehouse_sectors: self
                .json_or::<BTreeMap<String, String>>(config_keys::WAREHOUSE_SECTORS, defaults.warehouse_sectors)?,
            done_marker: self.string_or(config_keys::DONE_MARKER, &defaults.done_marker)?,
            max_rejection_rate: self.parsed_or(config_keys::MAX_REJECTION_RATE, defaults.max_rejection_rate)?,
            refresh_interval_secs: self
                .parsed_or(config_keys::REFRESH_INTERVAL_SECS, defaults.refresh_interval_secs)?,
            backup_dir: self.string_or(config_keys::BACKUP_DIR, &defaults.backup_dir)?,
            history_capacity: self.parsed_or(config_keys::HISTORY_CAPACITY, defaults.history_capacity)?,
        };

        if let Ok(path) = std::env::var(SOURCE_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                debug!(source_path = %trimmed, "使用环境变量覆写源文件路径");
                raw.source_path = trimmed.to_string();
            }
        }

        DashboardConfig::from_raw(raw)
    }

    fn string_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(value) => value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn json_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(value) => serde_json::from_str(&value).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                message: e.to_string(),
            }),
        }
    }
}

fn raw_to_entries(raw: &RawDashboardConfig) -> ConfigResult<Vec<(&'static str, String)>> {
    let to_json = |key: &str, value: serde_json::Result<String>| {
        value.map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: String::new(),
            message: e.to_string(),
        })
    };

    Ok(vec![
        (config_keys::SOURCE_PATH, raw.source_path.clone()),
        (config_keys::SOURCE_ENCODING, raw.source_encoding.clone()),
        (config_keys::SOURCE_DELIMITER, raw.source_delimiter.clone()),
        (
            config_keys::NORMAL_STAFF,
            to_json(config_keys::NORMAL_STAFF, serde_json::to_string(&raw.normal_staff))?,
        ),
        (
            config_keys::WAREHOUSE_SECTORS,
            to_json(config_keys::WAREHOUSE_SECTORS, serde_json::to_string(&raw.warehouse_sectors))?,
        ),
        (config_keys::DONE_MARKER, raw.done_marker.clone()),
        (config_keys::MAX_REJECTION_RATE, raw.max_rejection_rate.to_string()),
        (config_keys::REFRESH_INTERVAL_SECS, raw.refresh_interval_secs.to_string()),
        (config_keys::BACKUP_DIR, raw.backup_dir.clone()),
        (config_keys::HISTORY_CAPACITY, raw.history_capacity.to_string()),
    ])
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 源文件
    pub const SOURCE_PATH: &str = "source_path";
    pub const SOURCE_ENCODING: &str = "source_encoding";
    pub const SOURCE_DELIMITER: &str = "source_delimiter";

    // 人员分段
    pub const NORMAL_STAFF: &str = "normal_staff"; // JSON 数组

    // 仓库→部门映射
    pub const WAREHOUSE_SECTORS: &str = "warehouse_sectors"; // JSON 对象

    // 导入规则
    pub const DONE_MARKER: &str = "done_marker";
    pub const MAX_REJECTION_RATE: &str = "max_rejection_rate";

    // 刷新与备份
    pub const REFRESH_INTERVAL_SECS: &str = "refresh_interval_secs";
    pub const BACKUP_DIR: &str = "backup_dir";
    pub const HISTORY_CAPACITY: &str = "history_capacity";
}
