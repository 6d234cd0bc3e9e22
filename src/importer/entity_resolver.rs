// ==========================================
// 数据包导入工具 - 实体解析
// ==========================================
// 职责: 按自然键（名称 / SKU / 邮箱 / (entity_id, entity_type)）查找实体
// 约束: 单个 eq 过滤条件，page size 1，取第一条；未找到返回 None 而非错误
// ==========================================

use crate::domain::structure::StructureNode;
use crate::domain::types::StructureEntityType;
use crate::importer::error::ImportResult;
use crate::repository::search_criteria::{ConditionType, FilterValue, SearchCriteria, Searchable};
use tracing::trace;

/// 单字段查找条件（第一页，每页 1 条）
pub fn natural_key_criteria(field: &str, value: impl Into<FilterValue>) -> SearchCriteria {
    SearchCriteria::builder()
        .add_filter(field, value, ConditionType::Eq)
        .create()
        .set_page_size(1)
        .set_current_page(1)
}

/// 按自然键解析实体
///
/// # 参数
/// - repo: 实现 Searchable<E> 的仓储
/// - field: 查找字段
/// - value: 查找值
///
/// # 返回
/// - Ok(Some(E)): 第一条匹配
/// - Ok(None): 未找到
pub fn resolve<E, R>(repo: &R, field: &str, value: impl Into<FilterValue>) -> ImportResult<Option<E>>
where
    R: Searchable<E> + ?Sized,
{
    let criteria = natural_key_criteria(field, value);
    let found = repo.get_list(&criteria)?.into_iter().next();
    trace!(field, found = found.is_some(), "实体解析");
    Ok(found)
}

/// 按 (entity_id, entity_type) 解析组织结构节点
pub fn resolve_structure<R>(
    repo: &R,
    entity_id: i64,
    entity_type: StructureEntityType,
) -> ImportResult<Option<StructureNode>>
where
    R: Searchable<StructureNode> + ?Sized,
{
    let criteria = SearchCriteria::builder()
        .add_filter("entity_id", entity_id, ConditionType::Eq)
        .add_filter("entity_type", entity_type.to_db_value(), ConditionType::Eq)
        .create()
        .set_page_size(1)
        .set_current_page(1);
    Ok(repo.get_list(&criteria)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::CustomerSegment;
    use crate::repository::error::RepositoryResult;
    use std::cell::RefCell;

    struct FakeSegments {
        items: Vec<CustomerSegment>,
        seen: RefCell<Vec<SearchCriteria>>,
    }

    impl Searchable<CustomerSegment> for FakeSegments {
        fn get_list(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<CustomerSegment>> {
            self.seen.borrow_mut().push(criteria.clone());
            let wanted = match &criteria.filters[0].value {
                FilterValue::Text(s) => s.clone(),
                FilterValue::Integer(i) => i.to_string(),
            };
            Ok(self.items.iter().filter(|s| s.name == wanted).cloned().collect())
        }
    }

    #[test]
    fn test_resolve_uses_single_eq_filter_page_one() {
        let repo = FakeSegments {
            items: vec![CustomerSegment { segment_id: 3, name: "VIP".to_string() }],
            seen: RefCell::new(Vec::new()),
        };

        let found: Option<CustomerSegment> = resolve(&repo, "name", "VIP").unwrap();
        assert_eq!(found.map(|s| s.segment_id), Some(3));

        let missing: Option<CustomerSegment> = resolve(&repo, "name", "Nobody").unwrap();
        assert!(missing.is_none());

        let criteria = &repo.seen.borrow()[0];
        assert_eq!(criteria.filters.len(), 1);
        assert_eq!(criteria.filters[0].condition, ConditionType::Eq);
        assert_eq!(criteria.page_size, Some(1));
        assert_eq!(criteria.current_page, 1);
    }
}
