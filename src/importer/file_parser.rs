// ==========================================
// NT 拣货进度看板 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: 分隔文本 (.csv/.txt, 默认 ';' + Latin-1) / Excel (.xlsx/.xls)
// ==========================================

use crate::config::{SourceEncoding, SourceSettings};
use crate::domain::record::{RawExtraction, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn source_unavailable(path: &Path, reason: impl ToString) -> ImportError {
    ImportError::SourceUnavailable {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(source_unavailable(path, "文件不存在"));
    }
    Ok(())
}

/// 将表头与单元格值组装为行记录，完全空白的行返回 None
fn build_row<I>(headers: &[String], values: I) -> Option<RawRow>
where
    I: IntoIterator<Item = String>,
{
    let mut row_map = HashMap::new();
    for (col_idx, value) in values.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            row_map.insert(header.clone(), value.trim().to_string());
        }
    }

    if row_map.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row_map)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
    encoding: SourceEncoding,
}

impl CsvParser {
    pub fn new(delimiter: u8, encoding: SourceEncoding) -> Self {
        Self {
            delimiter,
            encoding,
        }
    }

    /// 按配置编码解码文件内容（带 BOM 的文件一律按 UTF-8 处理）
    fn decode(&self, bytes: &[u8]) -> ImportResult<String> {
        if let Some(stripped) = bytes.strip_prefix(UTF8_BOM) {
            return String::from_utf8(stripped.to_vec())
                .map_err(|e| ImportError::EncodingError(e.to_string()));
        }

        match self.encoding {
            SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            SourceEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| ImportError::EncodingError(e.to_string())),
        }
    }
}

impl FileParser for CsvParser {
    fn parse_to_extraction(&self, file_path: &Path) -> ImportResult<RawExtraction> {
        ensure_exists(file_path)?;

        // 共享盘上的导出文件可能被上游锁定，读取失败统一视为数据源不可用
        let bytes = std::fs::read(file_path).map_err(|e| source_unavailable(file_path, e))?;
        let content = self.decode(&bytes)?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        let mut row_numbers = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if let Some(row) = build_row(&headers, record.iter().map(str::to_string)) {
                rows.push(row);
                row_numbers.push(idx + 1);
            }
        }

        Ok(RawExtraction {
            headers,
            rows,
            row_numbers,
        })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_extraction(&self, file_path: &Path) -> ImportResult<RawExtraction> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path).map_err(|e| match e {
            calamine::Error::Io(io) => source_unavailable(file_path, io),
            other => ImportError::ExcelParseError(other.to_string()),
        })?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut sheet_rows = range.rows();
        let header_row = match sheet_rows.next() {
            Some(row) => row,
            None => return Ok(RawExtraction::default()),
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let (row_numbers, rows) = sheet_rows
            .enumerate()
            .filter_map(|(idx, data_row)| {
                build_row(&headers, data_row.iter().map(|c| c.to_string())).map(|row| (idx + 1, row))
            })
            .unzip();

        Ok(RawExtraction {
            headers,
            rows,
            row_numbers,
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    settings: SourceSettings,
}

impl UniversalFileParser {
    pub fn new(settings: SourceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// 解析配置中的源文件
    pub fn parse(&self) -> ImportResult<RawExtraction> {
        self.parse_path(&self.settings.path)
    }

    pub fn parse_path(&self, path: &Path) -> ImportResult<RawExtraction> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" | "txt" => {
                CsvParser::new(self.settings.delimiter, self.settings.encoding).parse_to_extraction(path)
            }
            "xlsx" | "xls" => ExcelParser.parse_to_extraction(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
