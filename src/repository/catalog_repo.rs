// ==========================================
// 数据包导入工具 - 商品目录仓储
// ==========================================
// 职责: 商品 / 店铺视图 / 可见性 / 阶梯价 数据访问
// 红线: Repository 不含业务逻辑，校验与容错由导入引擎负责
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::{Product, StoreView};
use crate::domain::types::Visibility;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::search_criteria::{SearchCriteria, Searchable};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 商品查询字段白名单
const PRODUCT_COLUMNS: &[(&str, &str)] = &[
    ("sku", "sku"),
    ("name", "name"),
    ("type_id", "product_type"),
];

/// 店铺视图查询字段白名单
const STORE_VIEW_COLUMNS: &[(&str, &str)] = &[
    ("code", "v.code"),
    ("store_id", "v.store_id"),
    ("website_code", "w.code"),
];

// ==========================================
// 写入模型
// ==========================================

/// 商品写入记录（None 字段保留库中已有值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductWrite {
    pub sku: String,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub attribute_set_code: Option<String>,
    pub price: Option<f64>,
    pub product_websites: Option<String>,
    pub image: Option<String>,
    pub visibility: Option<(i64, Visibility)>, // (store_id, 可见性)
}

/// 阶梯价写入记录
#[derive(Debug, Clone, PartialEq)]
pub struct TierPriceWrite {
    pub sku: String,
    pub website: String,
    pub customer_group: String,
    pub qty: f64,
    pub value: f64,
    pub value_type: String,
}

// ==========================================
// 仓储接口
// ==========================================

/// 商品仓储
pub trait ProductRepository: Searchable<Product> + Send + Sync {
    fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>>;

    /// 指定店铺下的可见性
    fn find_visibility(&self, sku: &str, store_id: i64) -> RepositoryResult<Option<Visibility>>;
}

/// 店铺仓储
pub trait StoreRepository: Searchable<StoreView> + Send + Sync {
    /// 全部店铺视图（不含 admin）
    fn list_store_views(&self) -> RepositoryResult<Vec<StoreView>>;

    fn find_store_view(&self, code: &str) -> RepositoryResult<Option<StoreView>>;

    /// 默认网站代码
    fn default_website_code(&self) -> RepositoryResult<Option<String>>;
}

// ==========================================
// SqliteCatalogRepository - SQLite 实现
// ==========================================
pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    /// 创建新的仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 店铺维护 =====

    /// 新增或更新网站
    pub fn save_website(&self, code: &str, name: &str, is_default: bool) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        if is_default {
            tx.execute("UPDATE store_website SET is_default = 0", [])?;
        }
        tx.execute(
            r#"
            INSERT INTO store_website (code, name, is_default) VALUES (?1, ?2, ?3)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name, is_default = excluded.is_default
            "#,
            params![code, name, is_default as i32],
        )?;
        let id: i64 = tx.query_row(
            "SELECT website_id FROM store_website WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// 新增或更新店铺视图
    pub fn save_store_view(
        &self,
        code: &str,
        website_code: &str,
        name: &str,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let website_id: i64 = conn
            .query_row(
                "SELECT website_id FROM store_website WHERE code = ?1",
                params![website_code],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "store_website".to_string(),
                id: website_code.to_string(),
            })?;
        conn.execute(
            r#"
            INSERT INTO store_view (code, website_id, name) VALUES (?1, ?2, ?3)
            ON CONFLICT(code) DO UPDATE SET website_id = excluded.website_id, name = excluded.name
            "#,
            params![code, website_id, name],
        )?;
        let id: i64 = conn.query_row(
            "SELECT store_id FROM store_view WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 网站代码是否存在
    pub fn website_exists(&self, code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM store_website WHERE code = ?1",
                params![code],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ===== 批量写入（事务化）=====

    /// 批量 upsert 商品（含店铺可见性）
    ///
    /// # 说明
    /// - 已存在的 SKU 仅覆盖非 None 字段
    /// - 整批在一个事务内，任一失败全部回滚
    pub fn upsert_products(&self, products: &[ProductWrite]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        let mut count = 0;
        for p in products {
            tx.execute(
                r#"
                INSERT INTO catalog_product (
                    sku, name, product_type, attribute_set_code, price,
                    product_websites, image, created_at, updated_at
                ) VALUES (?1, ?2, COALESCE(?3, 'simple'), COALESCE(?4, 'Default'), ?5, ?6, ?7, ?8, ?8)
                ON CONFLICT(sku) DO UPDATE SET
                    name = COALESCE(excluded.name, catalog_product.name),
                    product_type = COALESCE(?3, catalog_product.product_type),
                    attribute_set_code = COALESCE(?4, catalog_product.attribute_set_code),
                    price = COALESCE(excluded.price, catalog_product.price),
                    product_websites = COALESCE(excluded.product_websites, catalog_product.product_websites),
                    image = COALESCE(excluded.image, catalog_product.image),
                    updated_at = excluded.updated_at
                "#,
                params![
                    p.sku,
                    p.name,
                    p.product_type,
                    p.attribute_set_code,
                    p.price,
                    p.product_websites,
                    p.image,
                    now,
                ],
            )?;

            if let Some((store_id, visibility)) = p.visibility {
                tx.execute(
                    r#"
                    INSERT INTO product_store_visibility (sku, store_id, visibility)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(sku, store_id) DO UPDATE SET visibility = excluded.visibility
                    "#,
                    params![p.sku, store_id, visibility.to_db_value()],
                )?;
            }
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 批量 upsert 阶梯价
    pub fn upsert_tier_prices(&self, prices: &[TierPriceWrite]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for t in prices {
            tx.execute(
                r#"
                INSERT INTO tier_price (sku, website, customer_group, qty, value, value_type)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(sku, website, customer_group, qty) DO UPDATE SET
                    value = excluded.value,
                    value_type = excluded.value_type
                "#,
                params![t.sku, t.website, t.customer_group, t.qty, t.value, t.value_type],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询商品阶梯价（按数量升序）
    pub fn list_tier_prices(&self, sku: &str) -> RepositoryResult<Vec<TierPriceWrite>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT sku, website, customer_group, qty, value, value_type
            FROM tier_price WHERE sku = ?1
            ORDER BY website, customer_group, qty
            "#,
        )?;
        let rows = stmt.query_map(params![sku], |row| {
            Ok(TierPriceWrite {
                sku: row.get(0)?,
                website: row.get(1)?,
                customer_group: row.get(2)?,
                qty: row.get(3)?,
                value: row.get(4)?,
                value_type: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_product(row: &rusqlite::Row) -> rusqlite::Result<Product> {
        Ok(Product {
            sku: row.get(0)?,
            name: row.get(1)?,
            product_type: row.get(2)?,
            attribute_set_code: row.get(3)?,
            price: row.get(4)?,
            product_websites: row.get(5)?,
            image: row.get(6)?,
        })
    }

    fn map_store_view(row: &rusqlite::Row) -> rusqlite::Result<StoreView> {
        Ok(StoreView {
            store_id: row.get(0)?,
            code: row.get(1)?,
            website_code: row.get(2)?,
            name: row.get(3)?,
        })
    }
}

impl Searchable<Product> for SqliteCatalogRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<Product>> {
        let (clause, values) = criteria.to_sql("catalog_product", PRODUCT_COLUMNS)?;
        let sql = format!(
            "SELECT sku, name, product_type, attribute_set_code, price, product_websites, image \
             FROM catalog_product{}",
            clause
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::map_product)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl ProductRepository for SqliteCatalogRepository {
    fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                r#"
                SELECT sku, name, product_type, attribute_set_code, price, product_websites, image
                FROM catalog_product WHERE sku = ?1
                "#,
                params![sku],
                Self::map_product,
            )
            .optional()?;
        Ok(product)
    }

    fn find_visibility(&self, sku: &str, store_id: i64) -> RepositoryResult<Option<Visibility>> {
        let conn = self.get_conn()?;
        let value: Option<i32> = conn
            .query_row(
                "SELECT visibility FROM product_store_visibility WHERE sku = ?1 AND store_id = ?2",
                params![sku, store_id],
                |row| row.get(0),
            )
            .optional()?;
        match value {
            None => Ok(None),
            Some(v) => Visibility::from_db_value(v).map(Some).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "visibility".to_string(),
                    message: format!("未知可见性取值: {}", v),
                }
            }),
        }
    }
}

impl Searchable<StoreView> for SqliteCatalogRepository {
    fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<StoreView>> {
        let (clause, values) = criteria.to_sql("store_view", STORE_VIEW_COLUMNS)?;
        let sql = format!(
            "SELECT v.store_id, v.code, w.code, v.name \
             FROM store_view v JOIN store_website w ON w.website_id = v.website_id{}",
            clause
        );
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::map_store_view)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl StoreRepository for SqliteCatalogRepository {
    fn list_store_views(&self) -> RepositoryResult<Vec<StoreView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT v.store_id, v.code, w.code, v.name
            FROM store_view v JOIN store_website w ON w.website_id = v.website_id
            WHERE v.store_id <> 0
            ORDER BY v.store_id
            "#,
        )?;
        let rows = stmt.query_map([], Self::map_store_view)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find_store_view(&self, code: &str) -> RepositoryResult<Option<StoreView>> {
        let conn = self.get_conn()?;
        let view = conn
            .query_row(
                r#"
                SELECT v.store_id, v.code, w.code, v.name
                FROM store_view v JOIN store_website w ON w.website_id = v.website_id
                WHERE v.code = ?1
                "#,
                params![code],
                Self::map_store_view,
            )
            .optional()?;
        Ok(view)
    }

    fn default_website_code(&self) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let code = conn
            .query_row(
                "SELECT code FROM store_website WHERE is_default = 1 ORDER BY website_id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(code)
    }
}
