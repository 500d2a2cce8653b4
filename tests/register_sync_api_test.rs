// ==========================================
// 台账同步 API 集成测试
// ==========================================
// 覆盖: 导出 → 再导入 / 阻断错误无副作用 / 仅表头清空台账 / 部分失败 / 仅预览模式
// ==========================================

use register_sync::api::{ApiError, RegisterSyncApi};
use register_sync::domain::{Category, CostCode, RegisterRecord, RegisterType, Supplier};
use register_sync::importer::parse_sheet;
use register_sync::repository::{RegisterRepository, RegisterRepositoryImpl};
use std::sync::Arc;

use test_helpers::{create_test_db, xlsx_bytes, MemorySaveSurface, MockConfig, RejectingRepository};

fn setup(
    db_path: &str,
    config: MockConfig,
) -> (
    RegisterSyncApi<RegisterRepositoryImpl, MockConfig>,
    Arc<RegisterRepositoryImpl>,
    Arc<MemorySaveSurface>,
) {
    register_sync::logging::init_test();
    let repo = Arc::new(RegisterRepositoryImpl::new(db_path).expect("创建仓储失败"));
    let surface = Arc::new(MemorySaveSurface::default());
    let api = RegisterSyncApi::new(repo.clone(), Arc::new(config)).with_save_surface(surface.clone());
    (api, repo, surface)
}

fn cost_code(code: &str, name: &str, is_default: bool) -> RegisterRecord {
    RegisterRecord::CostCodes(CostCode {
        code: code.to_string(),
        name: name.to_string(),
        note: String::new(),
        is_default,
    })
}

fn category(name: &str) -> RegisterRecord {
    RegisterRecord::Categories(Category {
        name: name.to_string(),
        note: String::new(),
    })
}

#[tokio::test]
async fn test_export_then_reimport_only_updates() {
    let (_temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let (api, repo, surface) = setup(&db_path, MockConfig::default());

    repo.create_item(RegisterType::CostCodes, cost_code("45", "Golv", true)).await.unwrap();
    repo.create_item(RegisterType::CostCodes, cost_code("46", "Måleri", false)).await.unwrap();

    let exported = api.export_register(RegisterType::CostCodes).await.unwrap();
    assert_eq!(exported.row_count, 2);
    assert!(exported.file_name.starts_with("cost_codes_"));

    let (file_name, bytes) = surface.last().unwrap();
    let preview = api
        .preview_import(RegisterType::CostCodes, &file_name, &bytes)
        .await
        .unwrap();

    assert!(preview.plan.to_create.is_empty());
    assert!(preview.plan.to_delete.is_empty());
    let existing = repo.fetch_register_items(RegisterType::CostCodes).await.unwrap();
    let updated: Vec<_> = preview.plan.to_update.iter().map(|u| u.item.clone()).collect();
    assert_eq!(updated, existing);

    // 执行后内容不变
    let response = api.apply_import(&preview, None).await.unwrap();
    assert_eq!(response.summary.updated, 2);
    assert_eq!(repo.fetch_register_items(RegisterType::CostCodes).await.unwrap(), existing);
}

#[tokio::test]
async fn test_template_contains_only_headers() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, surface) = setup(&db_path, MockConfig::default());
    repo.create_item(RegisterType::Suppliers, RegisterRecord::Suppliers(Supplier {
        company_name: "Bygg AB".to_string(),
        ..Default::default()
    }))
    .await
    .unwrap();

    let exported = api.export_template(RegisterType::Suppliers).await.unwrap();

    assert_eq!(exported.row_count, 0);
    let (_, bytes) = surface.last().unwrap();
    let sheet = parse_sheet(&bytes);
    assert_eq!(sheet.headers, vec!["Supplier", "Org. no.", "City", "Categories"]);
    assert!(sheet.rows.is_empty());
}

#[tokio::test]
async fn test_import_creates_updates_and_deletes() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, _surface) = setup(&db_path, MockConfig::default());

    repo.create_item(RegisterType::Suppliers, RegisterRecord::Suppliers(Supplier {
        company_name: "Bygg AB".to_string(),
        organization_number: "556000-0001".to_string(),
        street_address: Some("Storgatan 1".to_string()),
        city: "Lund".to_string(),
        ..Default::default()
    }))
    .await
    .unwrap();
    repo.create_item(RegisterType::Suppliers, RegisterRecord::Suppliers(Supplier {
        company_name: "Gamla El AB".to_string(),
        organization_number: "556000-0002".to_string(),
        ..Default::default()
    }))
    .await
    .unwrap();

    let bytes = xlsx_bytes(&[
        vec!["Supplier", "Org. no.", "City", "Categories", "Kommentar"],
        vec!["Bygg & Golv AB", "556000-0001", "Malmö", "Golv, El", "x"],
        vec!["Måleri i Lund AB", "", "Lund", "Måleri", ""],
        vec!["", "", "", "", "rad utan namn"],
    ]);

    let response = api
        .import_register(RegisterType::Suppliers, "suppliers.xlsx", &bytes)
        .await
        .unwrap();

    assert_eq!(
        (response.summary.created, response.summary.updated, response.summary.deleted),
        (1, 1, 1)
    );
    assert!(response.failure_preview.is_empty());

    let items = repo.fetch_register_items(RegisterType::Suppliers).await.unwrap();
    assert_eq!(items.len(), 2);
    match &items[0].record {
        RegisterRecord::Suppliers(s) => {
            assert_eq!(s.company_name, "Bygg & Golv AB");
            assert_eq!(s.city, "Malmö");
            assert_eq!(s.categories, vec!["Golv", "El"]);
            // 地址不在表格中，保持原值
            assert_eq!(s.street_address.as_deref(), Some("Storgatan 1"));
        }
        other => panic!("unexpected record: {:?}", other),
    }
    match &items[1].record {
        RegisterRecord::Suppliers(s) => assert_eq!(s.company_name, "Måleri i Lund AB"),
        other => panic!("unexpected record: {:?}", other),
    }
}

#[tokio::test]
async fn test_schema_mismatch_has_no_side_effects() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, _surface) = setup(&db_path, MockConfig::default());
    repo.create_item(RegisterType::ChartOfAccounts, RegisterRecord::ChartOfAccounts(Default::default()))
        .await
        .unwrap();

    let bytes = xlsx_bytes(&[vec!["Account"], vec!["1930"]]);

    let err = api
        .import_register(RegisterType::ChartOfAccounts, "accounts.xlsx", &bytes)
        .await
        .unwrap_err();

    match err {
        ApiError::SchemaMismatch { missing } => assert_eq!(missing, vec!["Designation", "Description"]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(repo.count_items(RegisterType::ChartOfAccounts).unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_file_is_blocking() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, _surface) = setup(&db_path, MockConfig::default());
    repo.create_item(RegisterType::Categories, category("Golv")).await.unwrap();

    let err = api
        .preview_import(RegisterType::Categories, "categories.xlsx", b"not a workbook")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedFile(_)));

    assert_eq!(repo.count_items(RegisterType::Categories).unwrap(), 1);
}

#[tokio::test]
async fn test_header_only_file_clears_register() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, surface) = setup(&db_path, MockConfig::default());
    repo.create_item(RegisterType::Categories, category("Golv")).await.unwrap();
    repo.create_item(RegisterType::Categories, category("El")).await.unwrap();
    let existing = repo.fetch_register_items(RegisterType::Categories).await.unwrap();

    // 空白模板即仅表头文件
    api.export_template(RegisterType::Categories).await.unwrap();
    let (file_name, bytes) = surface.last().unwrap();
    let preview = api
        .preview_import(RegisterType::Categories, &file_name, &bytes)
        .await
        .unwrap();

    assert_eq!(preview.row_count, 0);
    assert!(preview.diagnostics.no_data_rows);
    assert!(preview.plan.to_create.is_empty());
    assert!(preview.plan.to_update.is_empty());
    assert_eq!(preview.plan.to_delete.len(), existing.len());

    let response = api.apply_import(&preview, None).await.unwrap();

    assert_eq!(response.summary.deleted, 2);
    assert_eq!(repo.count_items(RegisterType::Categories).unwrap(), 0);
}

#[tokio::test]
async fn test_partial_failure_reports_bounded_preview() {
    register_sync::logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let inner = Arc::new(RegisterRepositoryImpl::new(&db_path).unwrap());
    let repo = Arc::new(RejectingRepository::new(inner.clone(), &["B", "C", "D", "E"]));
    let api = RegisterSyncApi::new(repo, Arc::new(MockConfig::default()));

    let bytes = xlsx_bytes(&[
        vec!["Category", "Note"],
        vec!["A", ""],
        vec!["B", ""],
        vec!["C", ""],
        vec!["D", ""],
        vec!["E", ""],
        vec!["F", ""],
    ]);

    let response = api
        .import_register(RegisterType::Categories, "categories.xlsx", &bytes)
        .await
        .unwrap();

    assert_eq!(response.summary.created, 2);
    assert_eq!(response.total_failures, 4);
    assert_eq!(response.failure_preview.len(), 3);
    assert!(response.failure_preview[0].starts_with("创建 B: "));
    assert!(response.message.contains("失败 4 条"));
    assert_eq!(inner.count_items(RegisterType::Categories).unwrap(), 2);
}

#[tokio::test]
async fn test_preview_reports_diagnostics_without_changing_plan() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, _repo, _surface) = setup(&db_path, MockConfig::default());

    let bytes = xlsx_bytes(&[
        vec!["Category", "Note"],
        vec!["Golv", "a"],
        vec!["", "utan namn"],
        vec!["Golv", "b"],
    ]);

    let preview = api
        .preview_import(RegisterType::Categories, "categories.xlsx", &bytes)
        .await
        .unwrap();

    assert_eq!(preview.row_count, 3);
    assert_eq!(preview.diagnostics.keyless_rows, vec![3]);
    assert_eq!(preview.diagnostics.duplicate_keys[0].rows, vec![2, 4]);
    // 未匹配的重复行逐行新建
    assert_eq!(preview.summary.to_create, 2);
}

#[tokio::test]
async fn test_preview_only_mode_rejects_apply() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let (api, repo, _surface) = setup(&db_path, MockConfig::preview_only());

    let bytes = xlsx_bytes(&[vec!["Category", "Note"], vec!["Golv", ""]]);
    let preview = api
        .preview_import(RegisterType::Categories, "categories.xlsx", &bytes)
        .await
        .unwrap();
    assert_eq!(preview.summary.to_create, 1);

    let err = api.apply_import(&preview, None).await.unwrap_err();

    assert!(matches!(err, ApiError::ApplyDisabled));
    assert_eq!(repo.count_items(RegisterType::Categories).unwrap(), 0);
}

#[tokio::test]
async fn test_export_without_surface_writes_into_configured_dir() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(RegisterRepositoryImpl::new(&db_path).unwrap());
    let config = MockConfig {
        export_dir: Some(dir.path().to_path_buf()),
        ..MockConfig::default()
    };
    let api = RegisterSyncApi::new(repo, Arc::new(config));

    let exported = api.export_template(RegisterType::Categories).await.unwrap();

    assert_eq!(exported.path.parent(), Some(dir.path()));
    assert!(exported.path.exists());
}
