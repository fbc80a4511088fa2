// ==========================================
// NT 拣货进度看板 - 看板配置
// ==========================================
// 职责: 进程启动时加载、校验后不可变的配置值
// 红线: 配置显式传入流水线，不读取全局状态
// ==========================================

use crate::domain::types::{Sector, Warehouse};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ==========================================
// ConfigError - 配置错误（启动期致命）
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("正式员工名单为空")]
    EmptyStaffSet,

    #[error("正式员工名单包含空白姓名 (位置 {0})")]
    BlankStaffName(usize),

    #[error("仓库→部门映射为空")]
    EmptyWarehouseMapping,

    #[error("未知仓库代码: {0}")]
    UnknownWarehouse(String),

    #[error("未知部门 (仓库 {code}): {sector}")]
    UnknownSector { code: String, sector: String },

    #[error("部门 {0} 被映射到多个仓库")]
    DuplicateSector(String),

    #[error("配置值错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置存储访问失败: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// SourceEncoding - 导出文件编码
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceEncoding {
    Latin1,
    Utf8,
}

impl SourceEncoding {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().replace('-', "_").as_str() {
            "LATIN1" | "LATIN_1" | "ISO_8859_1" => Some(SourceEncoding::Latin1),
            "UTF8" | "UTF_8" => Some(SourceEncoding::Utf8),
            _ => None,
        }
    }
}

// ==========================================
// SourceSettings - 导出文件位置与格式
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub path: PathBuf,
    pub encoding: SourceEncoding,
    pub delimiter: u8,
}

// ==========================================
// RawDashboardConfig - 未校验的配置原值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDashboardConfig {
    pub source_path: String,
    pub source_encoding: String,
    pub source_delimiter: String,
    pub normal_staff: Vec<String>,
    /// 仓库代码 → 部门名称
    pub warehouse_sectors: BTreeMap<String, String>,
    pub done_marker: String,
    pub max_rejection_rate: f64,
    pub refresh_interval_secs: u64,
    pub backup_dir: String,
    pub history_capacity: usize,
}

impl Default for RawDashboardConfig {
    fn default() -> Self {
        let mut warehouse_sectors = BTreeMap::new();
        warehouse_sectors.insert("DP01".to_string(), "Mercearia".to_string());
        warehouse_sectors.insert("DP40".to_string(), "Perecíveis".to_string());

        Self {
            source_path: "mod.csv".to_string(),
            source_encoding: "LATIN1".to_string(),
            source_delimiter: ";".to_string(),
            normal_staff: vec![
                "FERN.PINTO".to_string(),
                "ANDR.DACOSTA".to_string(),
                "GABY.DACOSTA".to_string(),
                "WILL.CARNEIR".to_string(),
                "CLAU.OLIVEIR".to_string(),
            ],
            warehouse_sectors,
            done_marker: "X".to_string(),
            max_rejection_rate: 0.5,
            refresh_interval_secs: 300,
            backup_dir: "backup_dados".to_string(),
            history_capacity: crate::domain::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

// ==========================================
// DashboardConfig - 校验后的不可变配置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub source: SourceSettings,
    /// 已 TRIM + 转大写
    pub normal_staff: BTreeSet<String>,
    pub warehouse_sectors: BTreeMap<Warehouse, Sector>,
    pub done_marker: String,
    pub max_rejection_rate: f64,
    pub refresh_interval: Duration,
    pub backup_dir: PathBuf,
    pub history_capacity: usize,
}

impl DashboardConfig {
    /// 校验原值并构造配置
    pub fn from_raw(raw: RawDashboardConfig) -> ConfigResult<Self> {
        let source_path = raw.source_path.trim();
        if source_path.is_empty() {
            return Err(invalid("source_path", &raw.source_path, "路径不能为空"));
        }

        let encoding = SourceEncoding::parse(&raw.source_encoding)
            .ok_or_else(|| invalid("source_encoding", &raw.source_encoding, "仅支持 LATIN1 / UTF8"))?;

        let delimiter = match raw.source_delimiter.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => *b,
            _ => {
                return Err(invalid(
                    "source_delimiter",
                    &raw.source_delimiter,
                    "分隔符必须是单个 ASCII 字符",
                ))
            }
        };

        let normal_staff = normalize_staff(&raw.normal_staff)?;
        let warehouse_sectors = parse_warehouse_sectors(&raw.warehouse_sectors)?;

        let done_marker = raw.done_marker.trim().to_string();
        if done_marker.is_empty() {
            return Err(invalid("done_marker", &raw.done_marker, "完成标记不能为空"));
        }

        if !(0.0..=1.0).contains(&raw.max_rejection_rate) {
            return Err(invalid(
                "max_rejection_rate",
                &raw.max_rejection_rate.to_string(),
                "必须位于 [0, 1]",
            ));
        }

        if raw.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs", "0", "刷新间隔必须大于 0"));
        }

        if raw.history_capacity < 2 {
            return Err(invalid(
                "history_capacity",
                &raw.history_capacity.to_string(),
                "至少保留 2 个进度点",
            ));
        }

        Ok(Self {
            source: SourceSettings {
                path: PathBuf::from(source_path),
                encoding,
                delimiter,
            },
            normal_staff,
            warehouse_sectors,
            done_marker,
            max_rejection_rate: raw.max_rejection_rate,
            refresh_interval: Duration::from_secs(raw.refresh_interval_secs),
            backup_dir: PathBuf::from(raw.backup_dir.trim()),
            history_capacity: raw.history_capacity,
        })
    }

    /// 以默认值构造，仅替换源文件路径
    pub fn with_source_path(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::from_raw(RawDashboardConfig::default())?;
        config.source.path = path.into();
        Ok(config)
    }

    pub fn sector_of(&self, warehouse: Warehouse) -> Option<Sector> {
        self.warehouse_sectors.get(&warehouse).copied()
    }

    pub fn warehouse_of(&self, sector: Sector) -> Option<Warehouse> {
        self.warehouse_sectors
            .iter()
            .find(|(_, s)| **s == sector)
            .map(|(w, _)| *w)
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn normalize_staff(names: &[String]) -> ConfigResult<BTreeSet<String>> {
    if names.is_empty() {
        return Err(ConfigError::EmptyStaffSet);
    }

    let mut staff = BTreeSet::new();
    for (idx, name) in names.iter().enumerate() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::BlankStaffName(idx));
        }
        staff.insert(trimmed.to_uppercase());
    }
    Ok(staff)
}

fn parse_warehouse_sectors(
    raw: &BTreeMap<String, String>,
) -> ConfigResult<BTreeMap<Warehouse, Sector>> {
    if raw.is_empty() {
        return Err(ConfigError::EmptyWarehouseMapping);
    }

    let mut mapping = BTreeMap::new();
    let mut seen_sectors = BTreeSet::new();
    for (code, sector_name) in raw {
        let warehouse =
            Warehouse::parse_code(code).ok_or_else(|| ConfigError::UnknownWarehouse(code.clone()))?;
        let sector = Sector::parse(sector_name).ok_or_else(|| ConfigError::UnknownSector {
            code: code.clone(),
            sector: sector_name.clone(),
        })?;
        if !seen_sectors.insert(sector) {
            return Err(ConfigError::DuplicateSector(sector.to_string()));
        }
        mapping.insert(warehouse, sector);
    }
    Ok(mapping)
}
