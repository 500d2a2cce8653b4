// ==========================================
// 台账同步系统 - 台账编解码器表
// ==========================================
// 职责: 每类台账一份固定配置
// - headers: 导出列顺序，同时是导入必需列
// - key_field: 标识列（仅说明用途，实际取键走函数）
// - key_from_row / item_to_key: 行与条目的对账键
// - row_to_payload / item_to_row: 行 ↔ 条目映射
// 不变量: item_to_key(row_to_payload(row)) == key_from_row(row)
// ==========================================

use crate::domain::register::{Account, Category, CostCode, RegisterItem, RegisterRecord, Supplier};
use crate::domain::sheet::{CellValue, RowRecord};
use crate::domain::types::RegisterType;
use crate::importer::cell_normalizer::normalize_str;

/// 科目编号位数
pub const ACCOUNT_NUMBER_WIDTH: usize = 4;

// ===== 列名 =====
pub mod columns {
    pub const ACCOUNT: &str = "Account";
    pub const DESIGNATION: &str = "Designation";
    pub const DESCRIPTION: &str = "Description";

    pub const CATEGORY: &str = "Category";
    pub const NOTE: &str = "Note";

    pub const CODE: &str = "Code";
    pub const NAME: &str = "Name";
    pub const DEFAULT: &str = "Default";

    pub const SUPPLIER: &str = "Supplier";
    pub const ORG_NO: &str = "Org. no.";
    pub const CITY: &str = "City";
    pub const CATEGORIES: &str = "Categories";
}

use columns::*;

// ==========================================
// RegisterCodec - 单类台账的编解码配置
// ==========================================
pub struct RegisterCodec {
    pub register_type: RegisterType,
    pub sheet_name: &'static str,
    pub file_prefix: &'static str,
    pub headers: &'static [&'static str],
    pub key_field: &'static str,
    pub key_from_row: fn(&RowRecord) -> String,
    pub row_to_payload: fn(&RowRecord) -> RegisterRecord,
    pub item_to_key: fn(&RegisterItem) -> String,
    pub item_to_row: fn(&RegisterItem) -> Vec<CellValue>,
}

impl RegisterCodec {
    /// 按台账类型选择编解码器
    pub fn for_type(register_type: RegisterType) -> &'static RegisterCodec {
        match register_type {
            RegisterType::ChartOfAccounts => &CHART_OF_ACCOUNTS_CODEC,
            RegisterType::Categories => &CATEGORIES_CODEC,
            RegisterType::CostCodes => &COST_CODES_CODEC,
            RegisterType::Suppliers => &SUPPLIERS_CODEC,
        }
    }

    /// 条目 → 导出行（按 headers 顺序）
    pub fn export_rows(&self, items: &[RegisterItem]) -> Vec<Vec<CellValue>> {
        items.iter().map(|item| (self.item_to_row)(item)).collect()
    }
}

impl std::fmt::Debug for RegisterCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCodec")
            .field("register_type", &self.register_type)
            .field("headers", &self.headers)
            .field("key_field", &self.key_field)
            .finish()
    }
}

// ==========================================
// 公共字段规则
// ==========================================

/// 读取行中某列（缺失为空，TRIM）
fn cell(row: &RowRecord, column: &str) -> String {
    row.get(column).map(|v| normalize_str(v)).unwrap_or_default()
}

/// 科目编号: 仅保留数字并截断至固定位数
pub fn normalize_account_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(ACCOUNT_NUMBER_WIDTH)
        .collect()
}

/// 默认标志: 1 / true / ja / j（不区分大小写）为真，其余为假
pub fn parse_default_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "ja" | "j"
    )
}

/// 分类列表: 逗号分隔，逐项 TRIM，丢弃空项
pub fn split_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

/// 供应商对账键: 组织编号 → 公司名 → ""
fn supplier_key(organization_number: &str, company_name: &str) -> String {
    let org = normalize_str(organization_number);
    if !org.is_empty() {
        return org;
    }
    normalize_str(company_name)
}

// ==========================================
// 会计科目
// ==========================================
pub static CHART_OF_ACCOUNTS_CODEC: RegisterCodec = RegisterCodec {
    register_type: RegisterType::ChartOfAccounts,
    sheet_name: "Accounts",
    file_prefix: "chart_of_accounts",
    headers: &[ACCOUNT, DESIGNATION, DESCRIPTION],
    key_field: ACCOUNT,
    key_from_row: account_key_from_row,
    row_to_payload: account_row_to_payload,
    item_to_key: account_item_to_key,
    item_to_row: account_item_to_row,
};

fn account_key_from_row(row: &RowRecord) -> String {
    normalize_account_number(&cell(row, ACCOUNT))
}

fn account_row_to_payload(row: &RowRecord) -> RegisterRecord {
    RegisterRecord::ChartOfAccounts(Account {
        account_number: normalize_account_number(&cell(row, ACCOUNT)),
        designation: cell(row, DESIGNATION),
        description: cell(row, DESCRIPTION),
    })
}

fn account_item_to_key(item: &RegisterItem) -> String {
    match &item.record {
        RegisterRecord::ChartOfAccounts(a) => normalize_account_number(&a.account_number),
        _ => String::new(),
    }
}

fn account_item_to_row(item: &RegisterItem) -> Vec<CellValue> {
    match &item.record {
        RegisterRecord::ChartOfAccounts(a) => vec![
            CellValue::from(a.account_number.as_str()),
            CellValue::from(a.designation.as_str()),
            CellValue::from(a.description.as_str()),
        ],
        _ => Vec::new(),
    }
}

// ==========================================
// 分类
// ==========================================
pub static CATEGORIES_CODEC: RegisterCodec = RegisterCodec {
    register_type: RegisterType::Categories,
    sheet_name: "Categories",
    file_prefix: "categories",
    headers: &[CATEGORY, NOTE],
    key_field: CATEGORY,
    key_from_row: category_key_from_row,
    row_to_payload: category_row_to_payload,
    item_to_key: category_item_to_key,
    item_to_row: category_item_to_row,
};

fn category_key_from_row(row: &RowRecord) -> String {
    cell(row, CATEGORY)
}

fn category_row_to_payload(row: &RowRecord) -> RegisterRecord {
    RegisterRecord::Categories(Category {
        name: cell(row, CATEGORY),
        note: cell(row, NOTE),
    })
}

fn category_item_to_key(item: &RegisterItem) -> String {
    match &item.record {
        RegisterRecord::Categories(c) => normalize_str(&c.name),
        _ => String::new(),
    }
}

fn category_item_to_row(item: &RegisterItem) -> Vec<CellValue> {
    match &item.record {
        RegisterRecord::Categories(c) => vec![
            CellValue::from(c.name.as_str()),
            CellValue::from(c.note.as_str()),
        ],
        _ => Vec::new(),
    }
}

// ==========================================
// 成本代码
// ==========================================
pub static COST_CODES_CODEC: RegisterCodec = RegisterCodec {
    register_type: RegisterType::CostCodes,
    sheet_name: "Cost codes",
    file_prefix: "cost_codes",
    headers: &[CODE, NAME, NOTE, DEFAULT],
    key_field: CODE,
    key_from_row: cost_code_key_from_row,
    row_to_payload: cost_code_row_to_payload,
    item_to_key: cost_code_item_to_key,
    item_to_row: cost_code_item_to_row,
};

fn cost_code_key_from_row(row: &RowRecord) -> String {
    cell(row, CODE)
}

fn cost_code_row_to_payload(row: &RowRecord) -> RegisterRecord {
    RegisterRecord::CostCodes(CostCode {
        code: cell(row, CODE),
        name: cell(row, NAME),
        note: cell(row, NOTE),
        is_default: parse_default_flag(&cell(row, DEFAULT)),
    })
}

fn cost_code_item_to_key(item: &RegisterItem) -> String {
    match &item.record {
        RegisterRecord::CostCodes(c) => normalize_str(&c.code),
        _ => String::new(),
    }
}

fn cost_code_item_to_row(item: &RegisterItem) -> Vec<CellValue> {
    match &item.record {
        RegisterRecord::CostCodes(c) => vec![
            CellValue::from(c.code.as_str()),
            CellValue::from(c.name.as_str()),
            CellValue::from(c.note.as_str()),
            CellValue::Bool(c.is_default),
        ],
        _ => Vec::new(),
    }
}

// ==========================================
// 供应商
// ==========================================
pub static SUPPLIERS_CODEC: RegisterCodec = RegisterCodec {
    register_type: RegisterType::Suppliers,
    sheet_name: "Suppliers",
    file_prefix: "suppliers",
    headers: &[SUPPLIER, ORG_NO, CITY, CATEGORIES],
    key_field: ORG_NO,
    key_from_row: supplier_key_from_row,
    row_to_payload: supplier_row_to_payload,
    item_to_key: supplier_item_to_key,
    item_to_row: supplier_item_to_row,
};

fn supplier_key_from_row(row: &RowRecord) -> String {
    supplier_key(&cell(row, ORG_NO), &cell(row, SUPPLIER))
}

fn supplier_row_to_payload(row: &RowRecord) -> RegisterRecord {
    RegisterRecord::Suppliers(Supplier {
        company_name: cell(row, SUPPLIER),
        organization_number: cell(row, ORG_NO),
        // 地址不在表格中，更新时保留原值
        street_address: None,
        postal_code: None,
        city: cell(row, CITY),
        categories: split_categories(&cell(row, CATEGORIES)),
    })
}

fn supplier_item_to_key(item: &RegisterItem) -> String {
    match &item.record {
        RegisterRecord::Suppliers(s) => supplier_key(&s.organization_number, &s.company_name),
        _ => String::new(),
    }
}

fn supplier_item_to_row(item: &RegisterItem) -> Vec<CellValue> {
    match &item.record {
        RegisterRecord::Suppliers(s) => vec![
            CellValue::from(s.company_name.as_str()),
            CellValue::from(s.organization_number.as_str()),
            CellValue::from(s.city.as_str()),
            CellValue::from(s.categories.join(", ")),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RowRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn as_item(record: RegisterRecord) -> RegisterItem {
        RegisterItem::new("", record)
    }

    #[test]
    fn test_codec_table_matches_register_types() {
        for register_type in RegisterType::ALL {
            let codec = RegisterCodec::for_type(register_type);
            assert_eq!(codec.register_type, register_type);
            assert!(codec.headers.contains(&codec.key_field));
        }
        assert_eq!(CHART_OF_ACCOUNTS_CODEC.headers, &["Account", "Designation", "Description"]);
        assert_eq!(CATEGORIES_CODEC.headers, &["Category", "Note"]);
        assert_eq!(COST_CODES_CODEC.headers, &["Code", "Name", "Note", "Default"]);
        assert_eq!(SUPPLIERS_CODEC.headers, &["Supplier", "Org. no.", "City", "Categories"]);
    }

    #[test]
    fn test_account_number_digits_only_fixed_width() {
        assert_eq!(normalize_account_number("19 30"), "1930");
        assert_eq!(normalize_account_number("1930.0"), "1930");
        assert_eq!(normalize_account_number("konto 2440x"), "2440");
        assert_eq!(normalize_account_number("abc"), "");
    }

    #[test]
    fn test_cost_code_default_flag() {
        let yes = row(&[("Code", "45"), ("Name", "Golv"), ("Note", ""), ("Default", "Ja")]);
        match cost_code_row_to_payload(&yes) {
            RegisterRecord::CostCodes(c) => assert!(c.is_default),
            other => panic!("unexpected payload: {:?}", other),
        }

        for raw in ["1", "TRUE", " j ", "ja"] {
            assert!(parse_default_flag(raw), "{raw}");
        }
        for raw in ["nej", "0", "", "yes", "false"] {
            assert!(!parse_default_flag(raw), "{raw}");
        }
    }

    #[test]
    fn test_supplier_categories_split() {
        let r = row(&[
            ("Supplier", "Bygg AB"),
            ("Org. no.", "556000-0001"),
            ("City", "Lund"),
            ("Categories", "Golv, Måleri ,  El"),
        ]);

        match supplier_row_to_payload(&r) {
            RegisterRecord::Suppliers(s) => {
                assert_eq!(s.categories, vec!["Golv", "Måleri", "El"]);
                assert_eq!(s.street_address, None);
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        assert_eq!(split_categories(",, ,"), Vec::<String>::new());
    }

    #[test]
    fn test_supplier_key_fallback() {
        let item = as_item(RegisterRecord::Suppliers(Supplier {
            company_name: "Måleri i Lund AB".to_string(),
            organization_number: "  ".to_string(),
            ..Default::default()
        }));
        assert_eq!(supplier_item_to_key(&item), "Måleri i Lund AB");

        let anonymous = as_item(RegisterRecord::Suppliers(Supplier::default()));
        assert_eq!(supplier_item_to_key(&anonymous), "");

        let keyed_row = row(&[("Supplier", "Bygg AB"), ("Org. no.", "556000-0001")]);
        assert_eq!(supplier_key_from_row(&keyed_row), "556000-0001");
    }

    #[test]
    fn test_round_trip_key_stability() {
        let samples: Vec<(RegisterType, RowRecord)> = vec![
            (
                RegisterType::ChartOfAccounts,
                row(&[("Account", " 1930 kassa"), ("Designation", "Företagskonto"), ("Description", "")]),
            ),
            (RegisterType::Categories, row(&[("Category", " Golv "), ("Note", "")])),
            (
                RegisterType::CostCodes,
                row(&[("Code", "45"), ("Name", "Golv"), ("Note", ""), ("Default", "nej")]),
            ),
            (
                RegisterType::Suppliers,
                row(&[("Supplier", "Bygg AB"), ("Org. no.", "556000-0001"), ("City", ""), ("Categories", "")]),
            ),
            (
                RegisterType::Suppliers,
                row(&[("Supplier", "Utan Org AB"), ("Org. no.", ""), ("City", ""), ("Categories", "")]),
            ),
        ];

        for (register_type, r) in samples {
            let codec = RegisterCodec::for_type(register_type);
            let key = (codec.key_from_row)(&r);
            assert!(!key.is_empty());
            let item = as_item((codec.row_to_payload)(&r));
            assert_eq!((codec.item_to_key)(&item), key, "{:?}", register_type);
        }
    }

    #[test]
    fn test_item_to_row_follows_header_order() {
        let item = as_item(RegisterRecord::Suppliers(Supplier {
            company_name: "Bygg AB".to_string(),
            organization_number: "556000-0001".to_string(),
            city: "Lund".to_string(),
            categories: vec!["Golv".to_string(), "El".to_string()],
            ..Default::default()
        }));

        let cells = supplier_item_to_row(&item);

        assert_eq!(cells.len(), SUPPLIERS_CODEC.headers.len());
        assert_eq!(cells[3], CellValue::from("Golv, El"));
    }

    #[test]
    fn test_foreign_record_has_no_key() {
        let item = as_item(RegisterRecord::Categories(Category {
            name: "Golv".to_string(),
            note: String::new(),
        }));
        assert_eq!((COST_CODES_CODEC.item_to_key)(&item), "");
    }
}
