// ==========================================
// 数据包导入工具 - 关联关系维护
// ==========================================
// 职责: 内容块 ↔ 客户分群、共享目录 ↔ 公司、团队 ↔ 组织结构
// 约束: 无法解析的名称直接丢弃，不视为错误
// 约束: 每个实体在组织结构中至多一个节点
// ==========================================

use crate::domain::b2b::{Company, Customer};
use crate::domain::content::CustomerSegment;
use crate::domain::structure::StructureNode;
use crate::domain::types::StructureEntityType;
use crate::importer::entity_resolver::{resolve, resolve_structure};
use crate::importer::error::ImportResult;
use crate::importer::reporter::Reporter;
use crate::importer::row_normalizer::split_list;
use crate::repository::b2b_repo::{CompanyRepository, CustomerRepository, SharedCatalogRepository};
use crate::repository::content_repo::{BannerRepository, SegmentRepository};
use crate::repository::structure_repo::StructureRepository;
use tracing::{debug, instrument};

// ==========================================
// 内容块 ↔ 客户分群
// ==========================================

/// 以分群名称列表整体替换内容块的分群关联
///
/// # 返回
/// 实际关联的分群 ID
#[instrument(skip(banners, segments))]
pub fn link_segments<B, S>(
    banners: &B,
    segments: &S,
    banner_id: i64,
    segments_csv: &str,
) -> ImportResult<Vec<i64>>
where
    B: BannerRepository + ?Sized,
    S: SegmentRepository + ?Sized,
{
    let mut segment_ids = Vec::new();
    for name in split_list(segments_csv) {
        let found: Option<CustomerSegment> = resolve(segments, "name", name.as_str())?;
        match found {
            Some(segment) => segment_ids.push(segment.segment_id),
            None => debug!(segment = %name, "分群不存在，忽略"),
        }
    }

    banners.save_banner_segments(banner_id, &segment_ids)?;
    Ok(segment_ids)
}

// ==========================================
// 共享目录 ↔ 公司
// ==========================================

/// 将公司名称列表分配到共享目录（解析结果为空时不分配）
///
/// # 返回
/// 实际分配的公司 ID
#[instrument(skip(catalogs, companies))]
pub fn link_companies<C, P>(
    catalogs: &C,
    companies: &P,
    catalog_id: i64,
    companies_csv: &str,
) -> ImportResult<Vec<i64>>
where
    C: SharedCatalogRepository + ?Sized,
    P: CompanyRepository + ?Sized,
{
    let mut company_ids = Vec::new();
    for name in split_list(companies_csv) {
        let found: Option<Company> = resolve(companies, "company_name", name.as_str())?;
        match found {
            Some(company) => company_ids.push(company.company_id),
            None => debug!(company = %name, "公司不存在，忽略"),
        }
    }

    if !company_ids.is_empty() {
        catalogs.assign_companies(catalog_id, &company_ids)?;
    }
    Ok(company_ids)
}

// ==========================================
// 团队 ↔ 组织结构
// ==========================================

/// 确保团队节点挂在公司管理员根节点下（已有节点则复用）
pub fn attach_team<S>(structure: &S, admin_root: &StructureNode, team_id: i64) -> ImportResult<StructureNode>
where
    S: StructureRepository + ?Sized,
{
    if let Some(existing) = resolve_structure(structure, team_id, StructureEntityType::Team)? {
        return Ok(existing);
    }
    Ok(structure.insert_under(admin_root.structure_id, team_id, StructureEntityType::Team)?)
}

/// 将成员移动到团队节点下
///
/// # 规则
/// - 邮箱无法解析 → 警告，跳过
/// - 成员是公司根节点（管理员）→ 警告，跳过
/// - 否则删除原有节点，再插入到团队节点下
///
/// # 返回
/// - Ok(Some(node)): 新的成员节点
/// - Ok(None): 已跳过
pub fn move_member<S, C>(
    structure: &S,
    customers: &C,
    team_node: &StructureNode,
    email: &str,
    reporter: &dyn Reporter,
) -> ImportResult<Option<StructureNode>>
where
    S: StructureRepository + ?Sized,
    C: CustomerRepository + ?Sized,
{
    let email = email.trim();
    let customer: Option<Customer> = resolve(customers, "email", email)?;
    let customer = match customer {
        Some(c) => c,
        None => {
            reporter.warning(&format!("团队成员 {} 不存在，已跳过", email));
            return Ok(None);
        }
    };

    if let Some(prior) = resolve_structure(structure, customer.customer_id, StructureEntityType::Customer)? {
        if prior.parent_id.is_none() {
            reporter.warning(&format!("{} 是公司管理员，不能移动到团队下", email));
            return Ok(None);
        }
        structure.delete_by_id(prior.structure_id)?;
    }

    let node = structure.insert_under(
        team_node.structure_id,
        customer.customer_id,
        StructureEntityType::Customer,
    )?;
    debug!(email, structure_id = node.structure_id, "成员已移动到团队");
    Ok(Some(node))
}
