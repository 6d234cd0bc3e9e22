// ==========================================
// 数据包导入工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 / busy_timeout）
// - 提供参考平台库的建表脚本
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开可在仓储间共享的连接
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化参考平台库 schema（幂等）
///
/// 预置数据：
/// - admin 网站 / admin 店铺视图（store_id = 0）
/// - 客户组 0 NOT LOGGED IN / 1 General
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ===== 网站与店铺视图 =====
        CREATE TABLE IF NOT EXISTS store_website (
            website_id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS store_view (
            store_id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            website_id INTEGER NOT NULL REFERENCES store_website(website_id),
            name TEXT NOT NULL
        );

        -- ===== 商品 =====
        CREATE TABLE IF NOT EXISTS catalog_product (
            sku TEXT PRIMARY KEY,
            name TEXT,
            product_type TEXT NOT NULL DEFAULT 'simple',
            attribute_set_code TEXT NOT NULL DEFAULT 'Default',
            price REAL,
            product_websites TEXT,
            image TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_store_visibility (
            sku TEXT NOT NULL REFERENCES catalog_product(sku) ON DELETE CASCADE,
            store_id INTEGER NOT NULL REFERENCES store_view(store_id),
            visibility INTEGER NOT NULL,
            PRIMARY KEY (sku, store_id)
        );

        -- ===== 客户组与阶梯价 =====
        CREATE TABLE IF NOT EXISTS customer_group (
            group_id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            tax_class_id INTEGER NOT NULL DEFAULT 3
        );

        CREATE TABLE IF NOT EXISTS tier_price (
            sku TEXT NOT NULL REFERENCES catalog_product(sku) ON DELETE CASCADE,
            website TEXT NOT NULL,
            customer_group TEXT NOT NULL,
            qty REAL NOT NULL,
            value REAL NOT NULL,
            value_type TEXT NOT NULL DEFAULT 'Fixed',
            PRIMARY KEY (sku, website, customer_group, qty)
        );

        -- ===== 动态内容块与客户分群 =====
        CREATE TABLE IF NOT EXISTS banner (
            banner_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            is_enabled INTEGER NOT NULL DEFAULT 1,
            types TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS banner_content (
            banner_id INTEGER NOT NULL REFERENCES banner(banner_id) ON DELETE CASCADE,
            store_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            PRIMARY KEY (banner_id, store_id)
        );

        CREATE TABLE IF NOT EXISTS customer_segment (
            segment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS banner_segment_link (
            banner_id INTEGER NOT NULL REFERENCES banner(banner_id) ON DELETE CASCADE,
            segment_id INTEGER NOT NULL REFERENCES customer_segment(segment_id) ON DELETE CASCADE,
            PRIMARY KEY (banner_id, segment_id)
        );

        -- ===== B2B =====
        CREATE TABLE IF NOT EXISTS customer (
            customer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS company (
            company_id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name TEXT NOT NULL,
            super_user_id INTEGER NOT NULL REFERENCES customer(customer_id)
        );

        CREATE TABLE IF NOT EXISTS shared_catalog (
            catalog_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            customer_group_id INTEGER NOT NULL REFERENCES customer_group(group_id),
            created_by INTEGER NOT NULL,
            tax_class_id INTEGER NOT NULL,
            type INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shared_catalog_company (
            company_id INTEGER PRIMARY KEY REFERENCES company(company_id) ON DELETE CASCADE,
            catalog_id INTEGER NOT NULL REFERENCES shared_catalog(catalog_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS company_team (
            team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER NOT NULL REFERENCES company(company_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS company_structure (
            structure_id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER,
            entity_id INTEGER NOT NULL,
            entity_type INTEGER NOT NULL,
            path TEXT NOT NULL,
            level INTEGER NOT NULL,
            UNIQUE (entity_id, entity_type)
        );

        -- ===== 预置数据 =====
        INSERT OR IGNORE INTO store_website (website_id, code, name, is_default)
            VALUES (0, 'admin', 'Admin', 0);
        INSERT OR IGNORE INTO store_view (store_id, code, website_id, name)
            VALUES (0, 'admin', 0, 'Admin');
        INSERT OR IGNORE INTO customer_group (group_id, code) VALUES (0, 'NOT LOGGED IN');
        INSERT OR IGNORE INTO customer_group (group_id, code) VALUES (1, 'General');
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
