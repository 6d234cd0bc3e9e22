// ==========================================
// 数据包导入工具 - 商品集合对账
// ==========================================
// 职责: 已有商品与本次导入商品的 SKU 集合差 → 可见性限制记录
// 规则:
// - 已有 − 本次 → 在当前店铺视图下设为不单独显示
// - 本次 − 已有 → 在其他每个店铺视图下设为不单独显示
// 注意: 每次调用全量读取商品目录，目录规模大时开销线性增长
// ==========================================

use crate::domain::product::{Product, RestrictionRecord, SkuSet};
use crate::domain::row::Row;
use crate::importer::error::ImportResult;
use crate::repository::catalog_repo::StoreRepository;
use crate::repository::search_criteria::{ConditionType, SearchCriteria, Searchable};
use tracing::{debug, instrument};

/// 两批限制记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionPlan {
    /// 本次未出现的已有商品（当前视图）
    pub existing: Vec<RestrictionRecord>,
    /// 本次新增商品（其他视图）
    pub new: Vec<RestrictionRecord>,
}

/// 读取全部已持久化商品的 SKU（sku ≠ ''，不分页）
pub fn fetch_all_skus<R>(repo: &R) -> ImportResult<SkuSet>
where
    R: Searchable<Product> + ?Sized,
{
    let criteria = SearchCriteria::builder()
        .add_filter("sku", "", ConditionType::Neq)
        .create();
    let products = repo.get_list(&criteria)?;
    Ok(products.into_iter().map(|p| p.sku).collect())
}

/// 已有但本次未导入的商品 → 当前视图限制记录
pub fn restrict_existing_products(
    all_skus: &SkuSet,
    incoming: &SkuSet,
    store_view_code: &str,
) -> Vec<RestrictionRecord> {
    all_skus
        .difference(incoming)
        .iter()
        .map(|sku| RestrictionRecord::not_visible(sku, store_view_code))
        .collect()
}

/// 本次新增的商品 → 其他每个视图的限制记录
pub fn restrict_new_products(
    all_skus: &SkuSet,
    incoming: &SkuSet,
    store_view_code: &str,
    view_codes: &[String],
) -> Vec<RestrictionRecord> {
    let new_skus = incoming.difference(all_skus);
    let mut records = Vec::with_capacity(new_skus.len() * view_codes.len());
    for sku in new_skus.iter() {
        for code in view_codes.iter().filter(|c| c.as_str() != store_view_code) {
            records.push(RestrictionRecord::not_visible(sku, code));
        }
    }
    records
}

/// 在主导入之前计算两批限制记录
#[instrument(skip(products, stores, rows), fields(rows = rows.len()))]
pub fn plan_restrictions<P, S>(
    products: &P,
    stores: &S,
    rows: &[Row],
    store_view_code: &str,
) -> ImportResult<RestrictionPlan>
where
    P: Searchable<Product> + ?Sized,
    S: StoreRepository + ?Sized,
{
    let all_skus = fetch_all_skus(products)?;
    let incoming = SkuSet::from_rows(rows);
    let view_codes: Vec<String> = stores
        .list_store_views()?
        .into_iter()
        .map(|v| v.code)
        .collect();

    let plan = RestrictionPlan {
        existing: restrict_existing_products(&all_skus, &incoming, store_view_code),
        new: restrict_new_products(&all_skus, &incoming, store_view_code, &view_codes),
    };
    debug!(
        catalog = all_skus.len(),
        incoming = incoming.len(),
        existing = plan.existing.len(),
        new = plan.new.len(),
        "限制记录已计算"
    );
    Ok(plan)
}

/// 限制记录转为导入行
pub fn to_rows(records: &[RestrictionRecord]) -> Vec<Row> {
    records.iter().map(RestrictionRecord::to_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(skus: &[&str]) -> SkuSet {
        skus.iter().copied().collect()
    }

    #[test]
    fn test_existing_restriction_is_set_difference() {
        let records = restrict_existing_products(&set(&["A", "B", "C"]), &set(&["B", "C", "D"]), "v1");
        assert_eq!(records, vec![RestrictionRecord::not_visible("A", "v1")]);
    }

    #[test]
    fn test_new_restriction_covers_other_views() {
        let views = vec!["v1".to_string(), "v2".to_string(), "v3".to_string()];
        let records =
            restrict_new_products(&set(&["A", "B", "C"]), &set(&["B", "C", "D"]), "v1", &views);
        assert_eq!(
            records,
            vec![
                RestrictionRecord::not_visible("D", "v2"),
                RestrictionRecord::not_visible("D", "v3"),
            ]
        );
    }

    #[test]
    fn test_no_new_skus_no_records() {
        let views = vec!["v1".to_string(), "v2".to_string()];
        assert!(restrict_new_products(&set(&["A"]), &set(&["A"]), "v1", &views).is_empty());
        assert!(restrict_existing_products(&set(&["A"]), &set(&["A"]), "v1").is_empty());
    }
}
