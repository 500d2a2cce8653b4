// ==========================================
// 台账同步系统 - 台账实体
// ==========================================
// 职责: 四类台账的领域对象（科目/分类/成本代码/供应商）
// 红线: id 仅由存储层分配，引擎视为不透明且不可变
// ==========================================

use crate::domain::types::RegisterType;
use serde::{Deserialize, Serialize};

// ==========================================
// 会计科目
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String, // 科目编号（纯数字，定宽）
    pub designation: String,    // 科目名称
    pub description: String,    // 说明
}

// ==========================================
// 分类
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub note: String,
}

// ==========================================
// 成本代码
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCode {
    pub code: String,
    pub name: String,
    pub note: String,
    pub is_default: bool, // 是否为默认代码
}

// ==========================================
// 供应商
// ==========================================
// 地址字段不在导出表格中，导入补丁为 None 时保留原值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub company_name: String,
    pub organization_number: String,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub city: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

// ==========================================
// RegisterRecord - 台账记录（不含 id）
// ==========================================
// 既作为新建载荷，也作为更新补丁
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "register_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterRecord {
    ChartOfAccounts(Account),
    Categories(Category),
    CostCodes(CostCode),
    Suppliers(Supplier),
}

impl RegisterRecord {
    /// 记录所属台账类型
    pub fn register_type(&self) -> RegisterType {
        match self {
            RegisterRecord::ChartOfAccounts(_) => RegisterType::ChartOfAccounts,
            RegisterRecord::Categories(_) => RegisterType::Categories,
            RegisterRecord::CostCodes(_) => RegisterType::CostCodes,
            RegisterRecord::Suppliers(_) => RegisterType::Suppliers,
        }
    }

    /// 主字段值（编号/名称），为空的新建载荷不会写入存储
    pub fn primary_value(&self) -> &str {
        match self {
            RegisterRecord::ChartOfAccounts(a) => &a.account_number,
            RegisterRecord::Categories(c) => &c.name,
            RegisterRecord::CostCodes(c) => &c.code,
            RegisterRecord::Suppliers(s) => &s.company_name,
        }
    }

    /// 将补丁应用到当前记录
    ///
    /// # 返回
    /// - true: 应用成功
    /// - false: 台账类型不一致，记录未改动
    ///
    /// # 规则
    /// - 表格中存在的列整体覆盖
    /// - 供应商地址字段: 补丁为 None 时保留原值
    pub fn apply_patch(&mut self, patch: RegisterRecord) -> bool {
        match (self, patch) {
            (RegisterRecord::ChartOfAccounts(current), RegisterRecord::ChartOfAccounts(p)) => {
                *current = p;
            }
            (RegisterRecord::Categories(current), RegisterRecord::Categories(p)) => {
                *current = p;
            }
            (RegisterRecord::CostCodes(current), RegisterRecord::CostCodes(p)) => {
                *current = p;
            }
            (RegisterRecord::Suppliers(current), RegisterRecord::Suppliers(p)) => {
                current.company_name = p.company_name;
                current.organization_number = p.organization_number;
                current.city = p.city;
                current.categories = p.categories;
                if p.street_address.is_some() {
                    current.street_address = p.street_address;
                }
                if p.postal_code.is_some() {
                    current.postal_code = p.postal_code;
                }
            }
            _ => return false,
        }
        true
    }
}

// ==========================================
// RegisterItem - 已持久化的台账条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub id: String,
    pub record: RegisterRecord,
}

impl RegisterItem {
    pub fn new(id: impl Into<String>, record: RegisterRecord) -> Self {
        Self {
            id: id.into(),
            record,
        }
    }
}
