// ==========================================
// NT 拣货进度看板 - 行数据源
// ==========================================
// 职责: 获取一次原始提取结果
// 文件读取为阻塞 I/O，放到 spawn_blocking 执行
// ==========================================

use crate::config::SourceSettings;
use crate::domain::record::RawExtraction;
use crate::importer::{ImportError, ImportResult, UniversalFileParser};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RowSource: Send + Sync {
    /// 获取原始提取结果
    ///
    /// # 返回
    /// - Err(ImportError::SourceUnavailable): 源缺失 / 锁定 / 不可读
    async fn acquire(&self) -> ImportResult<RawExtraction>;

    /// 数据源描述（用于日志）
    fn describe(&self) -> String;
}

// ==========================================
// FileRowSource - 导出文件数据源
// ==========================================
pub struct FileRowSource {
    parser: Arc<UniversalFileParser>,
}

impl FileRowSource {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            parser: Arc::new(UniversalFileParser::new(settings)),
        }
    }
}

#[async_trait]
impl RowSource for FileRowSource {
    async fn acquire(&self) -> ImportResult<RawExtraction> {
        let parser = Arc::clone(&self.parser);
        tokio::task::spawn_blocking(move || parser.parse())
            .await
            .map_err(|e| ImportError::InternalError(format!("读取任务异常终止: {}", e)))?
    }

    fn describe(&self) -> String {
        self.parser.settings().path.display().to_string()
    }
}
