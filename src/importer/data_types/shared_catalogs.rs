// ==========================================
// 数据包导入工具 - B2B 共享目录安装
// ==========================================
// 流程（逐行）:
// 1. name 必填，缺失则警告并跳过
// 2. 按名称查找已有共享目录；新目录同时安装同名客户组
// 3. 设置客户组 / 创建人 / 税类 / 描述 / 类型后保存
// 4. 将解析到的公司分配给该目录
// ==========================================

use super::{EntityOutcome, InstallContext};
use crate::domain::b2b::SharedCatalog;
use crate::domain::row::Row;
use crate::domain::types::CatalogType;
use crate::importer::entity_resolver::resolve;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::relationship_linker::link_companies;
use crate::importer::row_normalizer::{normalize_shared_catalog, require_name};
use tracing::{debug, instrument};

const FILE_LABEL: &str = "b2b_shared_catalogs.csv";

#[instrument(skip_all, fields(rows = rows.len()))]
pub fn install(rows: Vec<Row>, ctx: &InstallContext) -> ImportResult<EntityOutcome> {
    let mut outcome = EntityOutcome::new(rows.len());
    for mut row in rows {
        match install_row(&mut row, ctx) {
            Ok(true) => outcome.rows_imported += 1,
            Ok(false) => outcome.rows_skipped += 1,
            Err(e) => {
                ctx.reporter.error(&format!("共享目录导入失败: {}", e));
                outcome.rows_skipped += 1;
            }
        }
    }
    Ok(outcome)
}

/// 安装单行
pub fn install_row(row: &mut Row, ctx: &InstallContext) -> ImportResult<bool> {
    let name = match require_name(row, FILE_LABEL) {
        Ok(name) => name.to_string(),
        Err(ImportError::MissingRequiredField { .. }) => {
            ctx.reporter
                .warning("name is required in b2b_shared_catalogs.csv, row skipped");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    normalize_shared_catalog(row);

    let existing: Option<SharedCatalog> = resolve(ctx.repos.shared_catalogs, "name", name.as_str())?;
    let is_new = existing.is_none();
    let mut catalog = existing.unwrap_or_else(|| SharedCatalog::new(&name));

    // 客户组与目录同名；已存在时直接返回
    let group = ctx.repos.customer_groups.install_group(&name)?;

    catalog.name = name;
    catalog.customer_group_id = group.group_id;
    catalog.created_by = SharedCatalog::DEFAULT_CREATED_BY;
    catalog.tax_class_id = SharedCatalog::DEFAULT_TAX_CLASS_ID;
    if let Some(description) = row.value("description") {
        catalog.description = Some(description.to_string());
    }
    catalog.catalog_type = CatalogType::from_row_value(row.get("type"));

    let saved = ctx.repos.shared_catalogs.save(&catalog)?;
    let catalog_id = saved.catalog_id.ok_or_else(|| {
        ImportError::InternalError(format!("共享目录 {} 保存后缺少 ID", saved.name))
    })?;

    let companies = row.get("companies").unwrap_or_default().to_string();
    let assigned = link_companies(
        ctx.repos.shared_catalogs,
        ctx.repos.companies,
        catalog_id,
        &companies,
    )?;

    debug!(catalog_id, is_new, companies = assigned.len(), "共享目录已保存");
    Ok(true)
}
