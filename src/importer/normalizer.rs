// ==========================================
// NT 拣货进度看板 - 导入规范化
// ==========================================
// 流程: 表头校验 → 逐行映射 → 收集拒绝明细
// 红线: 纯函数，无副作用（不写库、不写文件）
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::record::{NormalizedBatch, RawExtraction, RowRejection};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{ColumnMap, FieldMapper};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// 将原始提取结果规范化为有效行 + 拒绝明细
    ///
    /// # 返回
    /// - Ok(NormalizedBatch): records 保持源顺序
    /// - Err(ImportError::SchemaMismatch): 缺少必需列，整个提取失败
    #[instrument(skip_all, fields(rows = extraction.raw_row_count()))]
    pub fn normalize(
        &self,
        extraction: &RawExtraction,
        config: &DashboardConfig,
    ) -> ImportResult<NormalizedBatch> {
        let columns = ColumnMap::resolve(&extraction.headers)?;
        let mapper = FieldMapper::new(&columns, config);

        let mut records = Vec::with_capacity(extraction.rows.len());
        let mut rejections = Vec::new();

        for (idx, row) in extraction.rows.iter().enumerate() {
            let row_number = extraction.row_number(idx);
            match mapper.map_to_record(row, row_number) {
                Ok(record) => records.push(record),
                Err(err) => {
                    debug!(row_number, field = %err.field, reason = %err.reason, "行被拒绝");
                    rejections.push(RowRejection {
                        row_number: err.row_number,
                        field: err.field,
                        reason: err.reason,
                    });
                }
            }
        }

        debug!(
            valid = records.len(),
            rejected = rejections.len(),
            "规范化完成"
        );

        Ok(NormalizedBatch {
            records,
            rejections,
            raw_row_count: extraction.raw_row_count(),
        })
    }
}
