// ==========================================
// NT 拣货进度看板 - 领域类型定义
// ==========================================
// 职责: 部门 / 仓库 / NT 状态 / 人员分段 枚举
// 序列化格式: 与上游导出及看板展示保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 部门 (Setor)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    Mercearia,  // 杂货
    #[serde(rename = "Perecíveis")]
    Pereciveis, // 生鲜
}

impl Sector {
    /// 解析部门名称（忽略大小写，兼容无重音写法）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mercearia" => Some(Sector::Mercearia),
            "perecíveis" | "pereciveis" => Some(Sector::Pereciveis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Mercearia => "Mercearia",
            Sector::Pereciveis => "Perecíveis",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 仓库 (Depósito)
// ==========================================
// 排序: DP01 < DP40（快照中分区按此顺序输出）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Warehouse {
    Dp01,
    Dp40,
}

impl Warehouse {
    /// 解析仓库代码（TRIM + 忽略大小写）
    pub fn parse_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "DP01" => Some(Warehouse::Dp01),
            "DP40" => Some(Warehouse::Dp40),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Warehouse::Dp01 => "DP01",
            Warehouse::Dp40 => "DP40",
        }
    }
}

impl fmt::Display for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ==========================================
// NT 状态
// ==========================================
// 判定优先级: Finalizada > EmSeparacao > Pendente
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NtStatus {
    Finalizada,  // 全部行已完成
    EmSeparacao, // 拣货中（至少一行已分配人员）
    Pendente,    // 待处理
}

impl NtStatus {
    pub const ALL: [NtStatus; 3] = [NtStatus::Finalizada, NtStatus::EmSeparacao, NtStatus::Pendente];

    pub fn label(&self) -> &'static str {
        match self {
            NtStatus::Finalizada => "Finalizada",
            NtStatus::EmSeparacao => "Em Separação",
            NtStatus::Pendente => "Pendente",
        }
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 人员分段 (Normal / Reforço)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentTag {
    Normal,     // 正式员工
    #[serde(rename = "Reforço")]
    Reforco,    // 支援/临时人员
    Unassigned, // 未分配
}

impl SegmentTag {
    pub fn label(&self) -> &'static str {
        match self {
            SegmentTag::Normal => "Normal",
            SegmentTag::Reforco => "Reforço",
            SegmentTag::Unassigned => "Unassigned",
        }
    }
}

impl fmt::Display for SegmentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warehouse_parse_code() {
        assert_eq!(Warehouse::parse_code(" dp01 "), Some(Warehouse::Dp01));
        assert_eq!(Warehouse::parse_code("DP40"), Some(Warehouse::Dp40));
        assert_eq!(Warehouse::parse_code("DP99"), None);
        assert_eq!(Warehouse::parse_code(""), None);
    }

    #[test]
    fn test_sector_parse_accepts_unaccented() {
        assert_eq!(Sector::parse("Perecíveis"), Some(Sector::Pereciveis));
        assert_eq!(Sector::parse("pereciveis"), Some(Sector::Pereciveis));
        assert_eq!(Sector::parse("MERCEARIA"), Some(Sector::Mercearia));
        assert_eq!(Sector::parse("Açougue"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Warehouse::Dp40).unwrap(), "\"DP40\"");
        assert_eq!(serde_json::to_string(&Sector::Pereciveis).unwrap(), "\"Perecíveis\"");
        assert_eq!(serde_json::to_string(&SegmentTag::Reforco).unwrap(), "\"Reforço\"");
    }
}
