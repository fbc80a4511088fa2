// ==========================================
// NT 拣货进度看板 - 字段映射器
// ==========================================
// 职责: 源列 → Record 字段映射 + 类型转换
// 列名比较: TRIM 后忽略大小写
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::record::{RawRow, Record};
use crate::domain::types::Warehouse;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult, MalformedRecordError};
use std::collections::HashMap;

/// 上游导出列名
pub mod source_columns {
    pub const NT_ID: &str = "NUMERO_NT";
    pub const ITEM_ID: &str = "MATERIAL";
    pub const FINALIZED_FLAG: &str = "ITEM_FINALIZADO";
    pub const ASSIGNEE: &str = "NOME_USUARIO";
    pub const QUANTITY: &str = "QUANT_NT";
    pub const WAREHOUSE: &str = "DEPOSITO";

    // 可选列
    pub const ITEM_DESCRIPTION: &str = "DESC_MATERIAL";
    pub const PRODUCTION_DATE: &str = "DT_PRODUCAO";

    pub const REQUIRED: [&str; 6] = [NT_ID, ITEM_ID, FINALIZED_FLAG, ASSIGNEE, QUANTITY, WAREHOUSE];
}

// ==========================================
// ColumnMap - 标准列名 → 源文件实际表头
// ==========================================
#[derive(Debug, Clone)]
pub struct ColumnMap {
    resolved: HashMap<&'static str, String>,
}

impl ColumnMap {
    /// 解析表头；缺少任一必需列时返回 SchemaMismatch（列出全部缺失列）
    pub fn resolve(headers: &[String]) -> ImportResult<Self> {
        let lookup: HashMap<String, &String> = headers
            .iter()
            .map(|h| (h.trim().to_uppercase(), h))
            .collect();

        let mut resolved = HashMap::new();
        let mut missing = Vec::new();

        for column in source_columns::REQUIRED {
            match lookup.get(column) {
                Some(actual) => {
                    resolved.insert(column, (*actual).clone());
                }
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::SchemaMismatch { missing });
        }

        for column in [
            source_columns::ITEM_DESCRIPTION,
            source_columns::PRODUCTION_DATE,
        ] {
            if let Some(actual) = lookup.get(column) {
                resolved.insert(column, (*actual).clone());
            }
        }

        Ok(Self { resolved })
    }

    pub fn has(&self, column: &str) -> bool {
        self.resolved.contains_key(column)
    }

    fn value<'a>(&self, row: &'a RawRow, column: &str) -> Option<&'a str> {
        self.resolved
            .get(column)
            .and_then(|actual| row.get(actual))
            .map(String::as_str)
    }
}

// ==========================================
// FieldMapper - 单行映射
// ==========================================
pub struct FieldMapper<'a> {
    columns: &'a ColumnMap,
    config: &'a DashboardConfig,
    cleaner: DataCleaner,
}

impl<'a> FieldMapper<'a> {
    pub fn new(columns: &'a ColumnMap, config: &'a DashboardConfig) -> Self {
        Self {
            columns,
            config,
            cleaner: DataCleaner,
        }
    }

    /// 映射一行；任一字段无效时返回行级错误
    pub fn map_to_record(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> Result<Record, MalformedRecordError> {
        let nt_id = self.required(row, source_columns::NT_ID, row_number)?;
        let item_id = self.required(row, source_columns::ITEM_ID, row_number)?;

        let quantity_raw = self.required(row, source_columns::QUANTITY, row_number)?;
        let quantity = self
            .cleaner
            .parse_quantity(&quantity_raw)
            .map_err(|e| {
                MalformedRecordError::new(row_number, source_columns::QUANTITY, e.to_string())
            })?;

        let warehouse_raw = self.required(row, source_columns::WAREHOUSE, row_number)?;
        let warehouse = Warehouse::parse_code(&warehouse_raw).ok_or_else(|| {
            MalformedRecordError::new(
                row_number,
                source_columns::WAREHOUSE,
                format!("未知仓库代码: {}", warehouse_raw),
            )
        })?;
        let sector = self.config.sector_of(warehouse).ok_or_else(|| {
            MalformedRecordError::new(
                row_number,
                source_columns::WAREHOUSE,
                format!("仓库 {} 未配置部门", warehouse),
            )
        })?;

        let finalized = self
            .columns
            .value(row, source_columns::FINALIZED_FLAG)
            .map_or(false, |flag| {
                self.cleaner.is_done_marker(flag, &self.config.done_marker)
            });

        let assignee = self
            .cleaner
            .normalize_null(self.columns.value(row, source_columns::ASSIGNEE));

        let item_description = self
            .cleaner
            .normalize_null(self.columns.value(row, source_columns::ITEM_DESCRIPTION));

        // 有该列时保留原值（含空串），用于缺货判定
        let production_date = if self.columns.has(source_columns::PRODUCTION_DATE) {
            Some(
                self.columns
                    .value(row, source_columns::PRODUCTION_DATE)
                    .unwrap_or("")
                    .trim()
                    .to_string(),
            )
        } else {
            None
        };

        Ok(Record {
            nt_id,
            item_id,
            finalized,
            assignee,
            quantity,
            sector,
            warehouse,
            item_description,
            production_date,
            row_number,
        })
    }

    fn required(
        &self,
        row: &RawRow,
        column: &str,
        row_number: usize,
    ) -> Result<String, MalformedRecordError> {
        self.cleaner
            .normalize_null(self.columns.value(row, column))
            .ok_or_else(|| MalformedRecordError::new(row_number, column, "必填字段为空"))
    }
}
