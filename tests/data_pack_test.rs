// ==========================================
// 数据包安装端到端测试
// ==========================================
// 测试目标: 目录 / zip 数据包、settings 与覆写、各实体按序安装
// ==========================================


use data_install::config::Settings;
use data_install::domain::{Product, SharedCatalog};
use data_install::importer::data_installer::EXTRACT_SUBDIR;
use data_install::importer::{ImportError, MessageLevel, PackEntry};
use data_install::repository::{ProductRepository, SearchCriteria, Searchable};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use test_helpers::{seed_company, seed_stores, write_file, TestEnv};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

const PRODUCTS: &str = "sku,name,product_websites\nA,Alpha,base\nB,Beta,base\n";
const CATALOGS: &str = "name,companies\nWholesale,Acme\n";
const TEAMS: &str = "name,company_name,members\nEast,Acme,buyer@acme.test\n";

fn build_zip(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_install_directory_pack() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);
    seed_company(&env.b2b, "Acme", "boss@acme.test");
    env.b2b.create_customer("buyer@acme.test").unwrap();

    let pack = env.pack_dir("luma");
    write_file(&pack, "settings.csv", "name,value\nsite_code,base\n");
    write_file(&pack, "products.csv", PRODUCTS);
    write_file(&pack, "b2b_shared_catalogs.csv", CATALOGS);
    write_file(&pack, "b2b_teams.csv", TEAMS);

    let report = env.installer().install(&pack, &Settings::new()).unwrap();

    assert!(!report.batch_id.is_empty());
    assert!(report.finished_at >= report.started_at);
    assert_eq!(report.entities.len(), 5);
    assert_eq!(report.settings.get("site_code"), Some("base"));
    assert_eq!(report.count_at(MessageLevel::Error), 0);

    // 实体按固定顺序安装
    let order: Vec<&str> = report.entities.iter().map(|e| e.entity).collect();
    assert_eq!(
        order,
        vec![
            "products",
            "advanced_pricing",
            "dynamic_blocks",
            "b2b_shared_catalogs",
            "b2b_teams"
        ]
    );
    assert!(report.entity(PackEntry::AdvancedPricing).unwrap().file.is_none());
    assert_eq!(report.entity(PackEntry::Products).unwrap().outcome.rows_imported, 2);
    assert_eq!(report.entity(PackEntry::Teams).unwrap().outcome.rows_imported, 1);

    let products: Vec<Product> = env.catalog.get_list(&SearchCriteria::default()).unwrap();
    assert_eq!(products.len(), 2);
}

#[test]
fn test_install_zip_pack_with_nested_folder() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);
    seed_company(&env.b2b, "Acme", "boss@acme.test");

    let zip_path = env.root.path().join("vertical.zip");
    build_zip(
        &zip_path,
        &[
            ("vertical/data/settings.csv", "name,value\nstore_view_code,v1\n"),
            ("vertical/data/products.csv", PRODUCTS),
            ("vertical/data/b2b_shared_catalogs.csv", CATALOGS),
            ("__MACOSX/vertical/data/._products.csv", "junk"),
        ],
    );

    let report = env.installer().install(&zip_path, &Settings::new()).unwrap();

    let extracted = env.root.path().join(EXTRACT_SUBDIR).join("vertical");
    assert!(extracted.join("vertical/data/products.csv").is_file());
    assert_eq!(report.settings.get("store_view_code"), Some("v1"));

    let products = report.entity(PackEntry::Products).unwrap();
    assert!(products.file.as_deref().unwrap().ends_with("products.csv"));
    assert_eq!(products.outcome.rows_imported, 2);

    let catalogs: Vec<SharedCatalog> = env.b2b.get_list(&SearchCriteria::default()).unwrap();
    assert_eq!(catalogs.len(), 1);
}

#[test]
fn test_zip_pack_images_resolved_beside_data_files() {
    let env = TestEnv::new();
    seed_stores(&env.catalog);

    let zip_path = env.root.path().join("luma.zip");
    build_zip(
        &zip_path,
        &[
            ("luma/settings.csv", "name,value\nsite_code,base\n"),
            ("luma/products.csv", "sku,name,image\nA,Alpha,a.jpg\n"),
            ("luma/media/catalog/product/a.jpg", "jpg"),
        ],
    );

    let report = env.installer().install(&zip_path, &Settings::new()).unwrap();

    assert!(!report
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Warning && m.message.contains("商品图片目录")));
    assert_eq!(report.count_at(MessageLevel::Error), 0);
    let product = env.catalog.find_by_sku("A").unwrap().unwrap();
    assert_eq!(product.image.as_deref(), Some("a.jpg"));
}

#[test]
fn test_overrides_take_precedence_over_settings_file() {
    let env = TestEnv::new();
    let pack = env.pack_dir("pack");
    write_file(
        &pack,
        "settings.csv",
        "name,value\nstore_view_code,v1\nrestrict_products_from_views,N\n",
    );

    let mut overrides = Settings::new();
    overrides.set("store_view_code", "v2");
    let report = env.installer().install(&pack, &overrides).unwrap();

    assert_eq!(report.settings.get("store_view_code"), Some("v2"));
    assert_eq!(report.settings.get("restrict_products_from_views"), Some("N"));
    assert_eq!(report.count_at(MessageLevel::Warning), 0);
}

#[test]
fn test_missing_settings_file_uses_defaults() {
    let env = TestEnv::new();
    let pack = env.pack_dir("empty");

    let report = env.installer().install(&pack, &Settings::new()).unwrap();

    assert!(report.entities.iter().all(|e| e.file.is_none()));
    assert_eq!(report.settings.store_view_code(), "default");
    assert_eq!(report.settings.site_code(), "base");
    assert!(!report.settings.restrict_products_from_views());
    assert!(report
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Warning && m.message.contains("settings")));
}

#[test]
fn test_unsupported_pack_format_is_rejected() {
    let env = TestEnv::new();
    let path = env.root.path().join("pack.tar");
    std::fs::write(&path, b"not a pack").unwrap();

    let err = env.installer().install(&path, &Settings::new()).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "tar"));
}

#[test]
fn test_report_serializes_to_json() {
    let env = TestEnv::new();
    let pack = env.pack_dir("pack");
    write_file(&pack, "products.csv", "sku,name\nA,Alpha\n");

    let report = env.installer().install(&pack, &Settings::new()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["batch_id"], report.batch_id.as_str());
    assert_eq!(json["entities"][0]["entity"], "products");
    assert_eq!(json["entities"][0]["outcome"]["rows_imported"], 1);
}
