// ==========================================
// NT 拣货进度看板 - 原始数据备份
// ==========================================
// 触发: 每次解析成功（列结构通过）后，与是否发布无关
// 执行: 阻塞线程池，不延迟快照发布
// 形式: 只追加；CSV 文件按 create-new 创建，不覆盖已有文件
// ==========================================

use crate::domain::record::RawExtraction;
use crate::repository::RawBackupRepository;
use anyhow::Context;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 一次备份请求
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub refresh_id: String,
    pub taken_at: DateTime<Utc>,
    pub extraction: Arc<RawExtraction>,
}

pub trait BackupSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// 写入备份，返回写入行数
    fn write(&self, request: &BackupRequest) -> anyhow::Result<usize>;
}

// ==========================================
// CsvBackupSink - 时间戳 CSV 文件
// ==========================================
pub struct CsvBackupSink {
    dir: PathBuf,
    delimiter: u8,
}

impl CsvBackupSink {
    pub fn new(dir: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            dir: dir.into(),
            delimiter,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// dados_brutos_<YYYYmmdd_HHMMSS>_<refresh>.csv
    pub fn file_name(request: &BackupRequest) -> String {
        let short_id: String = request
            .refresh_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();
        format!(
            "dados_brutos_{}_{}.csv",
            request.taken_at.format("%Y%m%d_%H%M%S"),
            short_id
        )
    }
}

impl BackupSink for CsvBackupSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, request: &BackupRequest) -> anyhow::Result<usize> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("无法创建备份目录: {}", self.dir.display()))?;

        let path = self.dir.join(Self::file_name(request));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("无法创建备份文件: {}", path.display()))?;

        let extraction = &request.extraction;
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(file);

        writer.write_record(&extraction.headers)?;
        for row in &extraction.rows {
            writer.write_record(
                extraction
                    .headers
                    .iter()
                    .map(|h| row.get(h).map(String::as_str).unwrap_or("")),
            )?;
        }
        writer.flush()?;

        Ok(extraction.rows.len())
    }
}

// ==========================================
// SqliteBackupSink - raw_row_backup 表
// ==========================================
pub struct SqliteBackupSink {
    repo: Arc<RawBackupRepository>,
}

impl SqliteBackupSink {
    pub fn new(repo: Arc<RawBackupRepository>) -> Self {
        Self { repo }
    }
}

impl BackupSink for SqliteBackupSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write(&self, request: &BackupRequest) -> anyhow::Result<usize> {
        let written = self.repo.append_rows(
            &request.refresh_id,
            &request.taken_at.to_rfc3339(),
            &request.extraction.rows,
        )?;
        Ok(written)
    }
}
