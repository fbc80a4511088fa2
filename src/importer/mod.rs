// ==========================================
// NT 拣货进度看板 - 导入层
// ==========================================
// 职责: 导出文件 → 原始行 → 规范化 Record
// 支持: 分隔文本 (CSV/TXT), Excel
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod normalizer;

// 重导出核心类型
pub use data_cleaner::{DataCleaner, QuantityError, ZEROED_DATE_PATTERNS};
pub use error::{ImportError, ImportResult, MalformedRecordError};
pub use field_mapper::{source_columns, ColumnMap, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::FileParser;
pub use normalizer::Normalizer;
