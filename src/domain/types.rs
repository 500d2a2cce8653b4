// ==========================================
// 台账同步系统 - 领域类型定义
// ==========================================
// 职责: 台账类型枚举（编解码器选择键）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 台账类型 (Register Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterType {
    ChartOfAccounts, // 会计科目表
    Categories,      // 分类
    CostCodes,       // 成本代码
    Suppliers,       // 供应商
}

impl RegisterType {
    /// 全部台账类型（固定顺序）
    pub const ALL: [RegisterType; 4] = [
        RegisterType::ChartOfAccounts,
        RegisterType::Categories,
        RegisterType::CostCodes,
        RegisterType::Suppliers,
    ];

    /// 数据库存储值
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterType::ChartOfAccounts => "CHART_OF_ACCOUNTS",
            RegisterType::Categories => "CATEGORIES",
            RegisterType::CostCodes => "COST_CODES",
            RegisterType::Suppliers => "SUPPLIERS",
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RegisterType {
    type Err = String;

    /// 解析台账类型，兼容数据库值与命令行简写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "chart_of_accounts" | "accounts" | "account" => Ok(RegisterType::ChartOfAccounts),
            "categories" | "category" => Ok(RegisterType::Categories),
            "cost_codes" | "cost_code" | "costcodes" => Ok(RegisterType::CostCodes),
            "suppliers" | "supplier" => Ok(RegisterType::Suppliers),
            other => Err(format!("未知的台账类型: {}", other)),
        }
    }
}
