// ==========================================
// 数据包导入工具 - B2B 团队安装
// ==========================================
// 流程（逐行）:
// 1. 按名称查找公司（不存在 → 报告错误，本行跳过）
// 2. 定位公司管理员根节点
// 3. 查找或新建同公司同名团队，挂到根节点下
// 4. 逐个成员: 删除原节点，重新挂到团队节点下
// 全部行结束后校验整棵组织结构树，问题逐条报告为错误
// ==========================================

use super::{EntityOutcome, InstallContext};
use crate::domain::b2b::{Company, Team};
use crate::domain::row::Row;
use crate::domain::types::StructureEntityType;
use crate::importer::entity_resolver::{resolve, resolve_structure};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::relationship_linker::{attach_team, move_member};
use crate::importer::row_normalizer::{require_name, split_list};
use crate::repository::search_criteria::{ConditionType, SearchCriteria};
use crate::repository::structure_repo::StructureRepository;
use tracing::{debug, instrument, warn};

const FILE_LABEL: &str = "b2b_teams.csv";

#[instrument(skip_all, fields(rows = rows.len()))]
pub fn install(rows: Vec<Row>, ctx: &InstallContext) -> ImportResult<EntityOutcome> {
    let mut outcome = EntityOutcome::new(rows.len());
    for row in rows {
        match install_row(&row, ctx) {
            Ok(true) => outcome.rows_imported += 1,
            Ok(false) => outcome.rows_skipped += 1,
            Err(e) => {
                ctx.reporter.error(&e.to_string());
                outcome.rows_skipped += 1;
            }
        }
    }

    let problems = ctx.repos.structure.load_tree()?.violations();
    if !problems.is_empty() {
        warn!(count = problems.len(), "组织结构校验发现问题");
    }
    for problem in problems {
        ctx.reporter.error(&format!("组织结构校验失败: {}", problem));
    }
    Ok(outcome)
}

/// 安装单行
///
/// # 错误
/// - CompanyNotFound: 公司不存在
/// - CompanyRootMissing: 公司管理员没有结构根节点
pub fn install_row(row: &Row, ctx: &InstallContext) -> ImportResult<bool> {
    let name = match require_name(row, FILE_LABEL) {
        Ok(name) => name.to_string(),
        Err(ImportError::MissingRequiredField { .. }) => {
            ctx.reporter.warning("name is required in b2b_teams.csv, row skipped");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let company_name = row.value("company_name").unwrap_or_default().trim().to_string();
    let company: Company = resolve(ctx.repos.companies, "company_name", company_name.as_str())?
        .ok_or_else(|| ImportError::CompanyNotFound(company_name.clone()))?;

    let admin_root = resolve_structure(
        ctx.repos.structure,
        company.super_user_id,
        StructureEntityType::Customer,
    )?
    .ok_or_else(|| ImportError::CompanyRootMissing {
        company: company.company_name.clone(),
        admin_id: company.super_user_id,
    })?;

    let team = find_or_create_team(&company, &name, ctx)?;
    let team_id = team
        .team_id
        .ok_or_else(|| ImportError::InternalError(format!("团队 {} 保存后缺少 ID", team.name)))?;
    let team_node = attach_team(ctx.repos.structure, &admin_root, team_id)?;

    let mut moved = 0usize;
    for email in split_list(row.get("members").unwrap_or_default()) {
        if move_member(
            ctx.repos.structure,
            ctx.repos.customers,
            &team_node,
            &email,
            ctx.reporter,
        )?
        .is_some()
        {
            moved += 1;
        }
    }

    debug!(
        company = %company.company_name,
        team_id,
        team_node = team_node.structure_id,
        moved,
        "团队已安装"
    );
    Ok(true)
}

/// 同一公司下按名称复用团队，不存在则新建
fn find_or_create_team(company: &Company, name: &str, ctx: &InstallContext) -> ImportResult<Team> {
    let criteria = SearchCriteria::builder()
        .add_filter("company_id", company.company_id, ConditionType::Eq)
        .add_filter("name", name, ConditionType::Eq)
        .create()
        .set_page_size(1)
        .set_current_page(1);
    if let Some(team) = ctx.repos.teams.get_list(&criteria)?.into_iter().next() {
        return Ok(team);
    }

    Ok(ctx.repos.teams.save(&Team {
        team_id: None,
        company_id: company.company_id,
        name: name.to_string(),
    })?)
}
