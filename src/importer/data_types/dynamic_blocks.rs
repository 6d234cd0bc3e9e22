// ==========================================
// 数据包导入工具 - 动态内容块安装
// ==========================================
// 流程（逐行）:
// 1. name 为空 → 警告并跳过（视为成功）
// 2. 规范化（默认值 / type 去空白 / 店铺视图回退）
// 3. 按名称查找已有内容块，决定新建或更新
// 4. 写入当前店铺视图内容；新建内容块同时写入 admin（0）默认内容
// 5. 整体替换分群关联
// ==========================================

use super::{EntityOutcome, InstallContext};
use crate::domain::content::{DynamicBlock, ADMIN_STORE_ID};
use crate::domain::row::Row;
use crate::importer::entity_resolver::resolve;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::relationship_linker::link_segments;
use crate::importer::row_normalizer::{normalize_dynamic_block, parse_enabled_flag, require_name};
use tracing::{debug, instrument};

const FILE_LABEL: &str = "Dynamic Blocks";

/// 逐行安装，单行失败报告后继续
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn install(rows: Vec<Row>, ctx: &InstallContext) -> ImportResult<EntityOutcome> {
    let mut outcome = EntityOutcome::new(rows.len());
    for mut row in rows {
        match install_row(&mut row, ctx) {
            Ok(true) => outcome.rows_imported += 1,
            Ok(false) => outcome.rows_skipped += 1,
            Err(e) => {
                ctx.reporter.error(&format!("动态内容块导入失败: {}", e));
                outcome.rows_skipped += 1;
            }
        }
    }
    Ok(outcome)
}

/// 安装单行
///
/// # 返回
/// - Ok(true): 已写入
/// - Ok(false): name 为空，已跳过
pub fn install_row(row: &mut Row, ctx: &InstallContext) -> ImportResult<bool> {
    let name = match require_name(row, FILE_LABEL) {
        Ok(name) => name.to_string(),
        Err(ImportError::MissingRequiredField { .. }) => {
            ctx.reporter.warning(
                "A row in the Dynamic Blocks file does not have a value for name. Row is skipped",
            );
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    normalize_dynamic_block(row);

    let existing: Option<DynamicBlock> = resolve(ctx.repos.banners, "name", name.as_str())?;
    let is_new = existing.is_none();
    let mut block = existing.unwrap_or_else(|| DynamicBlock::new(&name));

    block.name = name;
    block.is_enabled = parse_enabled_flag(row.get("is_enabled").unwrap_or_default());
    block.types = row.get("type").unwrap_or_default().to_string();

    let content = row.get("banner_content").unwrap_or_default().to_string();
    let store_view_code = row.get("store_view_code").unwrap_or_default().trim().to_string();
    let store_id = store_id_for(&store_view_code, ctx)?;

    block.store_contents.insert(store_id, content.clone());
    if is_new {
        block.store_contents.insert(ADMIN_STORE_ID, content);
    }

    let saved = ctx.repos.banners.save(&block)?;
    let banner_id = saved.banner_id.ok_or_else(|| {
        ImportError::InternalError(format!("内容块 {} 保存后缺少 ID", saved.name))
    })?;

    let segments = row.get("segments").unwrap_or_default().to_string();
    let linked = link_segments(ctx.repos.banners, ctx.repos.segments, banner_id, &segments)?;

    debug!(banner_id, is_new, store_id, segments = linked.len(), "动态内容块已保存");
    Ok(true)
}

/// 店铺视图代码 → store_id（admin 或无法解析时为 0）
fn store_id_for(store_view_code: &str, ctx: &InstallContext) -> ImportResult<i64> {
    if store_view_code.is_empty() || store_view_code == "admin" {
        return Ok(ADMIN_STORE_ID);
    }
    match ctx.repos.stores.find_store_view(store_view_code)? {
        Some(view) => Ok(view.store_id),
        None => {
            ctx.reporter.warning(&format!(
                "店铺视图 {} 不存在，动态内容块内容写入默认店铺",
                store_view_code
            ));
            Ok(ADMIN_STORE_ID)
        }
    }
}
