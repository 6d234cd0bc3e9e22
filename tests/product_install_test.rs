// ==========================================
// 商品安装集成测试
// ==========================================
// 测试目标: 主批次导入 + 店铺视图可见性限制 + 容错策略 + 图片目录回退
// ==========================================


use data_install::config::Settings;
use data_install::domain::{Product, Visibility};
use data_install::importer::{InstallReport, MessageLevel, PackEntry};
use data_install::logging;
use data_install::repository::{ProductRepository, SearchCriteria, Searchable, StoreRepository};
use test_helpers::{seed_stores, write_file, TestEnv};

fn product_count(env: &TestEnv) -> usize {
    let products: Vec<Product> = env.catalog.get_list(&SearchCriteria::default()).unwrap();
    products.len()
}

fn infos_of(report: &InstallReport) -> Vec<&str> {
    report
        .messages
        .iter()
        .filter(|m| m.level == MessageLevel::Info)
        .map(|m| m.message.as_str())
        .collect()
}

fn restricted_settings(view: &str) -> Settings {
    let mut settings = Settings::new();
    settings.set("restrict_products_from_views", "Y");
    settings.set("store_view_code", view);
    settings
}

#[test]
fn test_restrict_products_from_views() {
    logging::init_test();
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    // 已有商品 A / B / C
    let first = env.pack_dir("first");
    write_file(
        &first,
        "products.csv",
        "sku,name,product_websites,visibility\nA,Alpha,base,\"Catalog, Search\"\nB,Beta,base,\"Catalog, Search\"\nC,Gamma,base,\"Catalog, Search\"\n",
    );
    env.installer().install(&first, &Settings::new()).unwrap();
    assert_eq!(product_count(&env), 3);

    // 本次导入 B / C / D，当前视图 v1
    let second = env.pack_dir("second");
    write_file(
        &second,
        "products.csv",
        "sku,name,product_websites,store_view_code,visibility\nB,Beta,base,v1,\"Catalog, Search\"\nC,Gamma,base,v1,\"Catalog, Search\"\nD,Delta,base,v1,\"Catalog, Search\"\n",
    );
    let report = env.installer().install(&second, &restricted_settings("v1")).unwrap();
    assert!(report.entity(PackEntry::Products).unwrap().error.is_none());
    assert_eq!(product_count(&env), 4);

    let v1 = env.catalog.find_store_view("v1").unwrap().unwrap().store_id;
    let v2 = env.catalog.find_store_view("v2").unwrap().unwrap().store_id;
    let v3 = env.catalog.find_store_view("v3").unwrap().unwrap().store_id;

    // 已有但本次未导入: 只在 v1 下隐藏
    assert_eq!(
        env.catalog.find_visibility("A", v1).unwrap(),
        Some(Visibility::NotVisibleIndividually)
    );
    assert_eq!(env.catalog.find_visibility("A", v2).unwrap(), None);

    // 新增商品: 在 v1 以外的每个视图隐藏
    assert_eq!(
        env.catalog.find_visibility("D", v1).unwrap(),
        Some(Visibility::CatalogSearch)
    );
    for view in [v2, v3] {
        assert_eq!(
            env.catalog.find_visibility("D", view).unwrap(),
            Some(Visibility::NotVisibleIndividually)
        );
    }

    // 本次更新的已有商品不受限制
    assert_eq!(env.catalog.find_visibility("B", v2).unwrap(), None);

    let infos = infos_of(&report);
    assert!(infos.contains(&"Restricting 1 products from new store view"));
    assert!(infos.contains(&"Restricting 2 new products from existing store views"));
}

#[test]
fn test_restriction_does_not_create_rejected_products() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,name,price,store_view_code\nD,Delta,5,v1\nE,Echo,notaprice,v1\n",
    );
    let report = env.installer().install(&pack, &restricted_settings("v1")).unwrap();

    let outcome = &report.entity(PackEntry::Products).unwrap().outcome;
    assert_eq!(outcome.rows_imported, 1);
    assert_eq!(outcome.rows_skipped, 1);

    // 被主批次拒绝的 E 不会被限制批次补建
    assert!(env.catalog.find_by_sku("D").unwrap().is_some());
    assert!(env.catalog.find_by_sku("E").unwrap().is_none());
    assert_eq!(product_count(&env), 1);

    let v2 = env.catalog.find_store_view("v2").unwrap().unwrap().store_id;
    assert_eq!(
        env.catalog.find_visibility("D", v2).unwrap(),
        Some(Visibility::NotVisibleIndividually)
    );
    assert_eq!(env.catalog.find_visibility("E", v2).unwrap(), None);
    assert!(infos_of(&report).contains(&"Restricting 2 new products from existing store views"));
}

#[test]
fn test_restriction_after_stop_on_errors_abort() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,name,visibility\nD,Delta,Catalog\nE,Echo,Hidden\n",
    );

    let mut settings = restricted_settings("v1");
    settings.set("product_validation_strategy", "validation-stop-on-errors");
    env.installer().install(&pack, &settings).unwrap();

    // 主批次终止后，限制批次不得写入任何商品
    assert_eq!(product_count(&env), 0);
    assert!(env.catalog.find_by_sku("D").unwrap().is_none());
    assert!(env.catalog.find_by_sku("E").unwrap().is_none());
}

#[test]
fn test_visibility_only_row_for_unknown_sku_is_rejected() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,store_view_code,visibility\nGhost,v2,Not Visible Individually\n",
    );
    let report = env.installer().install(&pack, &Settings::new()).unwrap();

    assert_eq!(product_count(&env), 0);
    assert!(report
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Error && m.message.contains("sku=Ghost")));
}

#[test]
fn test_rerun_is_idempotent() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,name,product_websites,store_view_code,visibility\nA,Alpha,base,v1,Catalog\nB,Beta,base,v1,Catalog\n",
    );

    env.installer().install(&pack, &restricted_settings("v1")).unwrap();
    env.installer().install(&pack, &restricted_settings("v1")).unwrap();

    assert_eq!(product_count(&env), 2);
    let v2 = env.catalog.find_store_view("v2").unwrap().unwrap().store_id;
    assert_eq!(
        env.catalog.find_visibility("A", v2).unwrap(),
        Some(Visibility::NotVisibleIndividually)
    );
}

#[test]
fn test_restriction_disabled_by_default() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(&pack, "products.csv", "sku,name\nA,Alpha\n");
    env.installer().install(&pack, &Settings::new()).unwrap();

    let v2 = env.catalog.find_store_view("v2").unwrap().unwrap().store_id;
    assert_eq!(env.catalog.find_visibility("A", v2).unwrap(), None);
}

#[test]
fn test_base_website_replaced_by_default_website() {
    let env = TestEnv::new();
    env.catalog.save_website("base", "Base", false).unwrap();
    env.catalog.save_website("luma", "Luma", true).unwrap();

    let pack = env.pack_dir("pack");
    write_file(&pack, "products.csv", "sku,name,product_websites\nA,Alpha,\"base,luma\"\n");
    env.installer().install(&pack, &Settings::new()).unwrap();

    let product = env.catalog.find_by_sku("A").unwrap().unwrap();
    assert_eq!(product.product_websites.as_deref(), Some("luma,luma"));
}

#[test]
fn test_stop_on_errors_imports_nothing() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,name,visibility\nA,Alpha,Catalog\nB,Beta,Hidden\n",
    );

    let mut settings = Settings::new();
    settings.set("product_validation_strategy", "validation-stop-on-errors");
    let report = env.installer().install(&pack, &settings).unwrap();

    assert_eq!(product_count(&env), 0);
    // 引擎失败在分发边界被捕获，不影响报告生成
    assert!(report.entity(PackEntry::Products).unwrap().error.is_none());
    assert!(report.count_at(MessageLevel::Error) >= 2);
}

#[test]
fn test_skip_errors_imports_valid_rows() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "products.csv",
        "sku,name,visibility\nA,Alpha,Catalog\nB,Beta,Hidden\n",
    );
    let report = env.installer().install(&pack, &Settings::new()).unwrap();

    assert_eq!(product_count(&env), 1);
    let outcome = &report.entity(PackEntry::Products).unwrap().outcome;
    assert_eq!(outcome.rows_imported, 1);
    assert_eq!(outcome.rows_skipped, 1);
}

#[test]
fn test_missing_image_dir_falls_back_with_warning() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    write_file(&pack, "settings.csv", "name,value\nproduct_image_import_directory,nowhere/images\n");
    write_file(&pack, "products.csv", "sku,name\nA,Alpha\n");
    let report = env.installer().install(&pack, &Settings::new()).unwrap();

    assert!(report
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Warning && m.message.contains("nowhere/images")));
    assert_eq!(product_count(&env), 1);
}

#[test]
fn test_local_image_under_pack_media_dir() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let pack = env.pack_dir("pack");
    let images = pack.join("media/catalog/product");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("a.jpg"), b"jpg").unwrap();
    write_file(&pack, "products.csv", "sku,name,image\nA,Alpha,a.jpg\nB,Beta,missing.jpg\n");

    env.installer().install(&pack, &Settings::new()).unwrap();
    assert_eq!(
        env.catalog.find_by_sku("A").unwrap().unwrap().image.as_deref(),
        Some("a.jpg")
    );
    assert!(env.catalog.find_by_sku("B").unwrap().is_none());
}
