// ==========================================
// 数据包导入工具 - SQLite 批量导入引擎
// ==========================================
// 职责: 行校验 + 错误计数 + 容错判断 + 事务化落库
// 支持实体: catalog_product / advanced_pricing
// 流程:
// 1. 逐行校验，记录错误（行号 + 原因）
// 2. 按策略判断是否终止（终止时不写入任何行）
// 3. 有效行在一个事务内 upsert
// ==========================================

use crate::domain::b2b::CustomerGroup;
use crate::domain::row::Row;
use crate::domain::types::{EntityCode, ValidationStrategy, Visibility};
use crate::engine::bulk_import::{BulkImporter, BulkImporterFactory, ImportContext, ImportSummary};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::b2b_repo::SqliteB2bRepository;
use crate::repository::catalog_repo::{
    ProductRepository, ProductWrite, SqliteCatalogRepository, StoreRepository, TierPriceWrite,
};
use crate::repository::search_criteria::{SearchCriteria, Searchable};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// 全部网站的阶梯价标记前缀（如 "All Websites [USD]"）
const ALL_WEBSITES_PREFIX: &str = "All Websites";
/// 全部客户组
const ALL_GROUPS: &str = "ALL GROUPS";
/// 新建商品所需的字段（至少出现一个）
const PRODUCT_CREATE_COLUMNS: &[&str] = &["name", "product_type", "attribute_set_code"];

// ==========================================
// SqliteBulkImporter
// ==========================================
pub struct SqliteBulkImporter {
    catalog: SqliteCatalogRepository,
    b2b: SqliteB2bRepository,
    log_trace: Vec<String>,
    errors: Vec<String>,
}

impl SqliteBulkImporter {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            catalog: SqliteCatalogRepository::from_connection(conn.clone()),
            b2b: SqliteB2bRepository::from_connection(conn),
            log_trace: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn trace(&mut self, message: String) {
        debug!(target: "data_install::engine", "{}", message);
        self.log_trace.push(message);
    }

    fn add_error(&mut self, row_number: usize, message: String) {
        self.errors.push(format!("行 {}: {}", row_number, message));
    }

    /// 是否触发终止
    ///
    /// # 规则
    /// - 遇错即停: 错误数 ≥ 容错数
    /// - 跳过错误: 错误数 > 容错数
    fn should_terminate(ctx: &ImportContext, error_count: usize) -> bool {
        match ctx.validation_strategy {
            ValidationStrategy::StopOnErrors => error_count > 0 && error_count >= ctx.allowed_error_count,
            ValidationStrategy::SkipErrors => error_count > ctx.allowed_error_count,
        }
    }

    // ===== catalog_product =====

    /// 校验商品行
    ///
    /// 仅含可见性等附加字段的行只能更新已有商品（或本批次中已带新建字段的商品），
    /// 不会凭空新建商品
    fn validate_product(
        &mut self,
        row: &Row,
        row_number: usize,
        ctx: &ImportContext,
        store_ids: &mut HashMap<String, Option<i64>>,
        creatable: &mut HashSet<String>,
    ) -> EngineResult<Option<ProductWrite>> {
        let sku = match row.value("sku") {
            Some(sku) => sku.to_string(),
            None => {
                self.add_error(row_number, "sku 不能为空".to_string());
                return Ok(None);
            }
        };

        let mut problems = Vec::new();

        let has_create_data = PRODUCT_CREATE_COLUMNS.iter().any(|c| row.is_present(c));
        if !has_create_data
            && !creatable.contains(&sku)
            && self.catalog.find_by_sku(&sku)?.is_none()
        {
            problems.push("商品不存在，且缺少新建字段 (name / product_type / attribute_set_code)".to_string());
        }

        let visibility = match row.value("visibility") {
            None => None,
            Some(label) => match Visibility::from_label(label) {
                Some(v) => Some(v),
                None => {
                    problems.push(format!("可见性取值无效: {}", label));
                    None
                }
            },
        };

        let store_code = row.value("store_view_code").unwrap_or("admin").to_string();
        let store_id = match store_ids.get(&store_code) {
            Some(cached) => *cached,
            None => {
                let found = self.catalog.find_store_view(&store_code)?.map(|v| v.store_id);
                store_ids.insert(store_code.clone(), found);
                found
            }
        };
        if store_id.is_none() {
            problems.push(format!("店铺视图不存在: {}", store_code));
        }

        let price = match row.value("price") {
            None => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(v) if v >= 0.0 => Some(v),
                _ => {
                    problems.push(format!("价格格式错误: {}", raw));
                    None
                }
            },
        };

        if let Some(websites) = row.value("product_websites") {
            for code in websites.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                if !self.catalog.website_exists(code)? {
                    problems.push(format!("网站不存在: {}", code));
                }
            }
        }

        if let Some(image) = row.value("image") {
            if let Err(msg) = Self::check_image(image, ctx.images_file_dir.as_deref()) {
                problems.push(msg);
            }
        }

        if !problems.is_empty() {
            for p in problems {
                self.add_error(row_number, format!("sku={} {}", sku, p));
            }
            return Ok(None);
        }

        if has_create_data {
            creatable.insert(sku.clone());
        }
        Ok(Some(ProductWrite {
            sku,
            name: row.value("name").map(str::to_string),
            product_type: row.value("product_type").map(str::to_string),
            attribute_set_code: row.value("attribute_set_code").map(str::to_string),
            price,
            product_websites: row.value("product_websites").map(str::to_string),
            image: row.value("image").map(str::to_string),
            visibility: match (store_id, visibility) {
                (Some(id), Some(v)) => Some((id, v)),
                _ => None,
            },
        }))
    }

    /// 图片校验: 远程地址直接放行，本地文件必须位于图片目录下
    fn check_image(image: &str, images_dir: Option<&Path>) -> Result<(), String> {
        if image.starts_with("http://") || image.starts_with("https://") {
            return Ok(());
        }
        let dir = images_dir.ok_or_else(|| format!("未设置图片目录，无法导入图片: {}", image))?;
        let path = dir.join(image.trim_start_matches('/'));
        if path.is_file() {
            Ok(())
        } else {
            Err(format!("图片文件不存在: {}", path.display()))
        }
    }

    // ===== advanced_pricing =====

    fn validate_tier_price(
        &mut self,
        row: &Row,
        row_number: usize,
        groups: &HashSet<String>,
    ) -> EngineResult<Option<TierPriceWrite>> {
        let sku = match row.value("sku") {
            Some(sku) => sku.to_string(),
            None => {
                self.add_error(row_number, "sku 不能为空".to_string());
                return Ok(None);
            }
        };

        let mut problems = Vec::new();

        if self.catalog.find_by_sku(&sku)?.is_none() {
            problems.push("商品不存在".to_string());
        }

        let website = row.value("tier_price_website").unwrap_or_default().to_string();
        if !website.starts_with(ALL_WEBSITES_PREFIX) && !self.catalog.website_exists(&website)? {
            problems.push(format!("网站不存在: {}", website));
        }

        let group = row
            .value("tier_price_customer_group")
            .unwrap_or_default()
            .to_string();
        if group != ALL_GROUPS && !groups.contains(&group) {
            problems.push(format!("客户组不存在: {}", group));
        }

        let qty = Self::parse_positive(row, "tier_price_qty", &mut problems);
        let value = Self::parse_positive(row, "tier_price", &mut problems);

        let value_type = row.value("tier_price_value_type").unwrap_or("Fixed").to_string();
        if value_type != "Fixed" && value_type != "Discount" {
            problems.push(format!("价格类型无效: {}", value_type));
        }

        match (qty, value) {
            (Some(qty), Some(value)) if problems.is_empty() => Ok(Some(TierPriceWrite {
                sku,
                website,
                customer_group: group,
                qty,
                value,
                value_type,
            })),
            _ => {
                for p in problems {
                    self.add_error(row_number, format!("sku={} {}", sku, p));
                }
                Ok(None)
            }
        }
    }

    fn parse_positive(row: &Row, column: &str, problems: &mut Vec<String>) -> Option<f64> {
        match row.value(column).map(|raw| (raw, raw.parse::<f64>())) {
            Some((_, Ok(v))) if v > 0.0 => Some(v),
            Some((raw, _)) => {
                problems.push(format!("{} 必须为正数: {}", column, raw));
                None
            }
            None => {
                problems.push(format!("{} 不能为空", column));
                None
            }
        }
    }

    fn customer_group_codes(&self) -> EngineResult<HashSet<String>> {
        let groups: Vec<CustomerGroup> = self.b2b.get_list(&SearchCriteria::default())?;
        Ok(groups.into_iter().map(|g| g.code).collect())
    }

    fn finish(
        &mut self,
        ctx: &ImportContext,
        summary: &mut ImportSummary,
        valid_count: usize,
    ) -> EngineResult<()> {
        summary.error_count = self.errors.len();
        summary.invalid_rows = summary.processed_rows - valid_count;
        self.trace(format!(
            "校验完成: 有效行 {}，无效行 {}，错误 {}",
            valid_count, summary.invalid_rows, summary.error_count
        ));

        if Self::should_terminate(ctx, summary.error_count) {
            self.trace("错误数达到容错上限，导入终止".to_string());
            return Err(EngineError::ErrorLimitExceeded {
                errors: summary.error_count,
                allowed: ctx.allowed_error_count,
                strategy: ctx.validation_strategy.to_string(),
            });
        }
        Ok(())
    }
}

impl BulkImporter for SqliteBulkImporter {
    #[instrument(skip(self, rows, ctx), fields(entity = %ctx.entity_code.as_str(), rows = rows.len(), area = %ctx.area))]
    fn process_import(&mut self, rows: &[Row], ctx: &ImportContext) -> EngineResult<ImportSummary> {
        self.log_trace.clear();
        self.errors.clear();

        let mut summary = ImportSummary {
            processed_rows: rows.len(),
            ..Default::default()
        };
        self.trace(format!(
            "开始导入: entity={} 行数={} 策略={} 容错={}",
            ctx.entity_code.as_str(),
            rows.len(),
            ctx.validation_strategy,
            ctx.allowed_error_count
        ));
        if let Some(dir) = &ctx.images_file_dir {
            self.trace(format!("图片目录: {}", dir.display()));
        }

        match ctx.entity_code {
            EntityCode::CatalogProduct => {
                let mut store_ids = HashMap::new();
                let mut creatable = HashSet::new();
                let mut valid = Vec::with_capacity(rows.len());
                for (idx, row) in rows.iter().enumerate() {
                    if let Some(write) =
                        self.validate_product(row, idx + 1, ctx, &mut store_ids, &mut creatable)?
                    {
                        valid.push(write);
                    }
                }
                self.finish(ctx, &mut summary, valid.len())?;
                summary.imported_rows = self.catalog.upsert_products(&valid)?;
            }
            EntityCode::AdvancedPricing => {
                let groups = self.customer_group_codes()?;
                let mut valid = Vec::with_capacity(rows.len());
                for (idx, row) in rows.iter().enumerate() {
                    if let Some(write) = self.validate_tier_price(row, idx + 1, &groups)? {
                        valid.push(write);
                    }
                }
                self.finish(ctx, &mut summary, valid.len())?;
                summary.imported_rows = self.catalog.upsert_tier_prices(&valid)?;
            }
        }

        self.trace(format!("导入完成: 写入 {} 行", summary.imported_rows));
        if summary.invalid_rows > 0 {
            warn!(invalid = summary.invalid_rows, "部分行校验失败已跳过");
        }
        info!(imported = summary.imported_rows, "批量导入完成");
        Ok(summary)
    }

    fn log_trace(&self) -> &[String] {
        &self.log_trace
    }

    fn error_messages(&self) -> &[String] {
        &self.errors
    }
}

// ==========================================
// SqliteBulkImporterFactory
// ==========================================
#[derive(Clone)]
pub struct SqliteBulkImporterFactory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBulkImporterFactory {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl BulkImporterFactory for SqliteBulkImporterFactory {
    fn create(&self) -> Box<dyn BulkImporter> {
        Box::new(SqliteBulkImporter::new(self.conn.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn setup() -> (Arc<Mutex<Connection>>, SqliteCatalogRepository) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let shared = Arc::new(Mutex::new(conn));
        let catalog = SqliteCatalogRepository::from_connection(shared.clone());
        catalog.save_website("base", "Main Website", true).unwrap();
        catalog.save_store_view("default", "base", "Default Store View").unwrap();
        (shared, catalog)
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_skip_errors_imports_valid_rows() {
        let (conn, catalog) = setup();
        let mut importer = SqliteBulkImporter::new(conn);
        let ctx = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::SkipErrors);
        let rows = vec![
            row(&[("sku", "A"), ("name", "Alpha"), ("visibility", "Catalog, Search")]),
            row(&[("sku", ""), ("name", "Nameless")]),
            row(&[("sku", "B"), ("name", "Beta"), ("store_view_code", "nowhere")]),
        ];

        let summary = importer.process_import(&rows, &ctx).unwrap();
        assert_eq!(summary.imported_rows, 1);
        assert_eq!(summary.invalid_rows, 2);
        assert_eq!(importer.error_messages().len(), 2);
        assert!(!importer.log_trace().is_empty());
        assert_eq!(
            catalog.find_visibility("A", 0).unwrap(),
            Some(Visibility::CatalogSearch)
        );
    }

    #[test]
    fn test_stop_on_errors_terminates_without_writes() {
        let (conn, catalog) = setup();
        let mut importer = SqliteBulkImporter::new(conn);
        let ctx = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::StopOnErrors);
        let rows = vec![
            row(&[("sku", "A"), ("name", "Alpha")]),
            row(&[("sku", "B"), ("name", "Beta"), ("visibility", "Everywhere")]),
        ];

        let err = importer.process_import(&rows, &ctx).unwrap_err();
        assert!(matches!(err, EngineError::ErrorLimitExceeded { errors: 1, allowed: 1, .. }));
        assert!(catalog.find_by_sku("A").unwrap().is_none());
    }

    #[test]
    fn test_visibility_only_row_never_creates_product() {
        let (conn, catalog) = setup();
        catalog.save_store_view("v2", "base", "Second").unwrap();
        catalog
            .upsert_products(&[ProductWrite { sku: "A".to_string(), ..Default::default() }])
            .unwrap();

        let mut importer = SqliteBulkImporter::new(conn);
        let ctx = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::SkipErrors);
        let rows = vec![
            // 已有商品: 仅更新可见性
            row(&[("sku", "A"), ("store_view_code", "v2"), ("visibility", "Not Visible Individually")]),
            // 未知商品且无新建字段
            row(&[("sku", "Z"), ("store_view_code", "v2"), ("visibility", "Not Visible Individually")]),
            // 同批次先新建再限制
            row(&[("sku", "N"), ("name", "New")]),
            row(&[("sku", "N"), ("store_view_code", "v2"), ("visibility", "Not Visible Individually")]),
        ];

        let summary = importer.process_import(&rows, &ctx).unwrap();
        assert_eq!(summary.imported_rows, 3);
        assert_eq!(summary.invalid_rows, 1);
        assert!(importer.error_messages()[0].contains("sku=Z"));
        assert!(catalog.find_by_sku("Z").unwrap().is_none());

        let v2 = catalog.find_store_view("v2").unwrap().unwrap().store_id;
        assert_eq!(
            catalog.find_visibility("A", v2).unwrap(),
            Some(Visibility::NotVisibleIndividually)
        );
        assert_eq!(
            catalog.find_visibility("N", v2).unwrap(),
            Some(Visibility::NotVisibleIndividually)
        );
    }

    #[test]
    fn test_missing_local_image_is_row_error() {
        let (conn, _) = setup();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"img").unwrap();

        let mut importer = SqliteBulkImporter::new(conn);
        let ctx = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::SkipErrors)
            .with_images_dir(dir.path());
        let rows = vec![
            row(&[("sku", "A"), ("name", "Alpha"), ("image", "/a.jpg")]),
            row(&[("sku", "B"), ("name", "Beta"), ("image", "missing.jpg")]),
        ];
        let summary = importer.process_import(&rows, &ctx).unwrap();
        assert_eq!(summary.imported_rows, 1);
        assert!(importer.error_messages()[0].contains("missing.jpg"));
    }

    #[test]
    fn test_tier_price_validation() {
        let (conn, catalog) = setup();
        catalog
            .upsert_products(&[ProductWrite { sku: "A".to_string(), ..Default::default() }])
            .unwrap();
        let mut importer = SqliteBulkImporter::new(conn);
        let ctx = ImportContext::new(EntityCode::AdvancedPricing, ValidationStrategy::SkipErrors);
        let rows = vec![
            row(&[
                ("sku", "A"),
                ("tier_price_website", "All Websites [USD]"),
                ("tier_price_customer_group", "ALL GROUPS"),
                ("tier_price_qty", "10"),
                ("tier_price", "4.5"),
            ]),
            row(&[
                ("sku", "A"),
                ("tier_price_website", "base"),
                ("tier_price_customer_group", "Unknown"),
                ("tier_price_qty", "x"),
                ("tier_price", "1"),
            ]),
            row(&[
                ("sku", "Z"),
                ("tier_price_website", "base"),
                ("tier_price_customer_group", "General"),
                ("tier_price_qty", "1"),
                ("tier_price", "1"),
            ]),
        ];

        let summary = importer.process_import(&rows, &ctx).unwrap();
        assert_eq!(summary.imported_rows, 1);
        assert_eq!(summary.invalid_rows, 2);
        assert_eq!(catalog.list_tier_prices("A").unwrap().len(), 1);
    }

    #[test]
    fn test_should_terminate_thresholds() {
        let stop = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::StopOnErrors);
        let skip = ImportContext::new(EntityCode::CatalogProduct, ValidationStrategy::SkipErrors);
        assert!(!SqliteBulkImporter::should_terminate(&stop, 0));
        assert!(SqliteBulkImporter::should_terminate(&stop, 1));
        assert!(!SqliteBulkImporter::should_terminate(&skip, 100));
        assert!(SqliteBulkImporter::should_terminate(&skip, 101));
    }
}
