// ==========================================
// 数据包导入工具 - 商品领域模型
// ==========================================
// 职责: 商品 / 店铺视图 / SKU 集合 / 限制记录
// ==========================================

use crate::domain::row::Row;
use crate::domain::types::Visibility;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Product - 已持久化商品（对账只关心 SKU）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: Option<String>,
    pub product_type: String,
    pub attribute_set_code: String,
    pub price: Option<f64>,
    pub product_websites: Option<String>,
    pub image: Option<String>,
}

// ==========================================
// StoreView - 店铺视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreView {
    pub store_id: i64,
    pub code: String,
    pub website_code: String,
    pub name: String,
}

// ==========================================
// SkuSet - SKU 集合（仅用于集合差运算）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkuSet {
    skus: BTreeSet<String>,
}

impl SkuSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从行记录提取 SKU（忽略缺失 sku 的行）
    pub fn from_rows(rows: &[Row]) -> Self {
        rows.iter().filter_map(|r| r.value("sku")).collect()
    }

    /// self − other
    pub fn difference(&self, other: &SkuSet) -> SkuSet {
        SkuSet {
            skus: self.skus.difference(&other.skus).cloned().collect(),
        }
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.skus.contains(sku)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skus.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SkuSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SkuSet {
            skus: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ==========================================
// RestrictionRecord - 可见性限制记录
// ==========================================
// 由对账器合成，不直接落库；转换为 Row 后重新进入导入管道
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRecord {
    pub sku: String,
    pub store_view_code: String,
    pub visibility: Visibility,
}

impl RestrictionRecord {
    pub fn not_visible(sku: &str, store_view_code: &str) -> Self {
        Self {
            sku: sku.to_string(),
            store_view_code: store_view_code.to_string(),
            visibility: Visibility::NotVisibleIndividually,
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.set("sku", self.sku.as_str());
        row.set("store_view_code", self.store_view_code.as_str());
        row.set("visibility", self.visibility.label());
        row
    }
}
