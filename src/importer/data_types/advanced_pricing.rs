// ==========================================
// 数据包导入工具 - 阶梯价安装
// ==========================================
// 流程: 填充默认网站 / 客户组 → 以 advanced_pricing 实体分发
// ==========================================

use super::{EntityOutcome, InstallContext};
use crate::domain::row::Row;
use crate::domain::types::EntityCode;
use crate::importer::error::ImportResult;
use crate::importer::import_dispatcher::{DispatchRequest, ImportDispatcher};
use crate::importer::row_normalizer::fill_tier_price_defaults;
use tracing::instrument;

#[instrument(skip_all, fields(rows = rows.len()))]
pub fn install(mut rows: Vec<Row>, ctx: &InstallContext) -> ImportResult<EntityOutcome> {
    let mut outcome = EntityOutcome::new(rows.len());
    for row in rows.iter_mut() {
        fill_tier_price_defaults(row);
    }

    let request = DispatchRequest::new(EntityCode::AdvancedPricing, ctx.settings.validation_strategy());
    let dispatcher = ImportDispatcher::new(ctx.factory, ctx.reporter);
    if let Some(summary) = dispatcher.dispatch(&rows, &request) {
        outcome.rows_imported = summary.imported_rows;
        outcome.rows_skipped = summary.invalid_rows;
    } else {
        outcome.rows_skipped = rows.len();
    }
    Ok(outcome)
}
