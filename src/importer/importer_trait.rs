// ==========================================
// NT 拣货进度看板 - 导入 Trait
// ==========================================
// 职责: 定义文件解析接口（不包含实现）
// ==========================================

use crate::domain::record::RawExtraction;
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始提取结果（表头 + 行记录）
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(RawExtraction): 表头与行记录（完全空白的行已跳过）
    /// - Err(ImportError::SourceUnavailable): 文件缺失/锁定/不可读
    /// - Err: 格式错误
    fn parse_to_extraction(&self, file_path: &Path) -> ImportResult<RawExtraction>;
}
