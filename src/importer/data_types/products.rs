// ==========================================
// 数据包导入工具 - 商品安装
// ==========================================
// 流程:
// 1. 确定图片目录（不存在时回退到 var 并警告）
// 2. restrict_products_from_views = Y 时，在主导入之前计算限制记录
// 3. product_websites 中的 base 替换为平台默认网站
// 4. 分发主批次，再依次分发已有商品 / 新商品的限制批次
//    （主批次中未落库的新商品不参与限制）
// ==========================================

use super::{EntityOutcome, InstallContext};
use crate::domain::row::Row;
use crate::domain::types::EntityCode;
use crate::importer::error::ImportResult;
use crate::importer::import_dispatcher::{resolve_image_dir, DispatchRequest, ImportDispatcher};
use crate::importer::reconciler::{plan_restrictions, to_rows};
use crate::domain::product::RestrictionRecord;
use crate::importer::row_normalizer::replace_base_website_codes;
use crate::repository::catalog_repo::ProductRepository;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[instrument(skip_all, fields(rows = rows.len()))]
pub fn install(mut rows: Vec<Row>, ctx: &InstallContext) -> ImportResult<EntityOutcome> {
    let mut outcome = EntityOutcome::new(rows.len());
    let settings = ctx.settings;
    let image_dir = resolve_image_dir(settings, ctx.module_path, ctx.config, ctx.reporter);

    let plan = if settings.restrict_products_from_views() {
        Some(plan_restrictions(
            ctx.repos.products,
            ctx.repos.stores,
            &rows,
            settings.store_view_code(),
        )?)
    } else {
        None
    };

    if let Some(default_code) = ctx.repos.stores.default_website_code()? {
        for row in rows.iter_mut() {
            replace_base_website_codes(row, &default_code);
        }
    }

    let request = DispatchRequest::new(EntityCode::CatalogProduct, settings.validation_strategy())
        .with_images_dir(image_dir);
    let dispatcher = ImportDispatcher::new(ctx.factory, ctx.reporter);

    ctx.reporter.info("Importing products");
    match dispatcher.dispatch(&rows, &request) {
        Some(summary) => {
            outcome.rows_imported = summary.imported_rows;
            outcome.rows_skipped = summary.invalid_rows;
        }
        None => outcome.rows_skipped = rows.len(),
    }

    if let Some(mut plan) = plan {
        ctx.reporter.info("Restricting products from other store views");

        let planned = plan.new.len();
        retain_persisted(&mut plan.new, ctx.repos.products)?;
        if plan.new.len() < planned {
            debug!(
                dropped = planned - plan.new.len(),
                "主批次未落库的新商品已从限制记录中移除"
            );
        }

        if !plan.existing.is_empty() {
            ctx.reporter.info(&format!(
                "Restricting {} products from new store view",
                plan.existing.len()
            ));
            dispatcher.dispatch(&to_rows(&plan.existing), &request);
        }

        if !plan.new.is_empty() {
            ctx.reporter.info(&format!(
                "Restricting {} new products from existing store views",
                plan.new.len()
            ));
            dispatcher.dispatch(&to_rows(&plan.new), &request);
        }
        info!(
            existing = plan.existing.len(),
            new = plan.new.len(),
            "商品可见性限制已分发"
        );
    }

    Ok(outcome)
}

/// 只保留主批次之后确已存在的商品的限制记录
fn retain_persisted(
    records: &mut Vec<RestrictionRecord>,
    products: &dyn ProductRepository,
) -> ImportResult<()> {
    let mut exists: HashMap<String, bool> = HashMap::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records.drain(..) {
        let found = match exists.get(&record.sku) {
            Some(found) => *found,
            None => {
                let found = products.find_by_sku(&record.sku)?.is_some();
                exists.insert(record.sku.clone(), found);
                found
            }
        };
        if found {
            kept.push(record);
        }
    }
    *records = kept;
    Ok(())
}
