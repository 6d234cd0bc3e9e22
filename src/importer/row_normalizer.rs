// ==========================================
// 数据包导入工具 - 行规范化
// ==========================================
// 职责: 默认值填充 + 文本变换（纯函数，不访问仓储）
// 约束: "缺失" 指字段不存在或为空白；已有值一律不覆盖
// ==========================================

use crate::domain::row::Row;
use crate::importer::error::{ImportError, ImportResult};

/// 阶梯价默认网站
pub const DEFAULT_TIER_PRICE_WEBSITE: &str = "All Websites [USD]";
/// 阶梯价默认客户组
pub const DEFAULT_TIER_PRICE_CUSTOMER_GROUP: &str = "ALL GROUPS";
/// 内容块默认店铺视图
pub const DEFAULT_BLOCK_STORE_VIEW: &str = "admin";
/// 商品网站列表中需替换为默认网站的占位代码
pub const BASE_WEBSITE_PLACEHOLDER: &str = "base";

// ==========================================
// 阶梯价
// ==========================================

/// 填充阶梯价默认网站 / 客户组
pub fn fill_tier_price_defaults(row: &mut Row) {
    row.set_default("tier_price_website", DEFAULT_TIER_PRICE_WEBSITE);
    row.set_default("tier_price_customer_group", DEFAULT_TIER_PRICE_CUSTOMER_GROUP);
}

// ==========================================
// 动态内容块
// ==========================================

/// 规范化动态内容块行
///
/// # 规则
/// - is_enabled 缺失 → "Y"
/// - type / segments 缺失 → ""
/// - type 去除全部空白
/// - store_view_code 缺失 → 旧列 store → "admin"
/// - content 存在时作为 banner_content
pub fn normalize_dynamic_block(row: &mut Row) {
    row.set_default("is_enabled", "Y");
    row.set_default("type", "");
    row.set_default("segments", "");

    let compact_type: String = row
        .get("type")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    row.set("type", compact_type);

    if !row.is_present("store_view_code") {
        let store = row
            .value("store")
            .unwrap_or(DEFAULT_BLOCK_STORE_VIEW)
            .to_string();
        row.set("store_view_code", store);
    }

    if let Some(content) = row.value("content").map(str::to_string) {
        row.set("banner_content", content);
    }
    row.set_default("banner_content", "");
}

/// 启用标记解析（Y / 1 / yes / true 为启用）
pub fn parse_enabled_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "y" | "1" | "yes" | "true"
    )
}

// ==========================================
// 共享目录
// ==========================================

/// 规范化共享目录行（companies 缺失 → ""）
pub fn normalize_shared_catalog(row: &mut Row) {
    row.set_default("companies", "");
}

// ==========================================
// 通用
// ==========================================

/// 必填 name 校验
///
/// # 返回
/// - Ok(name): 去除首尾空白后的名称
/// - Err(MissingRequiredField): 调用方报告警告并跳过该行
pub fn require_name<'a>(row: &'a Row, file: &str) -> ImportResult<&'a str> {
    row.value("name")
        .map(str::trim)
        .ok_or_else(|| ImportError::MissingRequiredField {
            file: file.to_string(),
            field: "name".to_string(),
        })
}

/// 将 product_websites 列表中的 "base" 替换为平台默认网站代码
pub fn replace_base_website_codes(row: &mut Row, default_website_code: &str) {
    let websites = match row.value("product_websites") {
        Some(v) => v.to_string(),
        None => return,
    };

    let entries: Vec<&str> = websites.split(',').collect();
    if !entries.iter().any(|e| e.trim() == BASE_WEBSITE_PLACEHOLDER) {
        return;
    }

    let replaced: Vec<&str> = entries
        .into_iter()
        .map(|e| {
            if e.trim() == BASE_WEBSITE_PLACEHOLDER {
                default_website_code
            } else {
                e
            }
        })
        .collect();
    row.set("product_websites", replaced.join(","));
}

/// 逗号分隔列表: 去除首尾空白，丢弃空项
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_tier_price_defaults_only_when_absent() {
        let mut blank = row(&[("sku", "A"), ("tier_price_website", " ")]);
        fill_tier_price_defaults(&mut blank);
        assert_eq!(blank.get("tier_price_website"), Some("All Websites [USD]"));
        assert_eq!(blank.get("tier_price_customer_group"), Some("ALL GROUPS"));

        let mut given = row(&[
            ("sku", "A"),
            ("tier_price_website", "base"),
            ("tier_price_customer_group", "Wholesale"),
        ]);
        fill_tier_price_defaults(&mut given);
        assert_eq!(given.get("tier_price_website"), Some("base"));
        assert_eq!(given.get("tier_price_customer_group"), Some("Wholesale"));
    }

    #[test]
    fn test_dynamic_block_defaults() {
        let mut r = row(&[("name", "Hero"), ("type", "header, footer"), ("content", "<p/>")]);
        normalize_dynamic_block(&mut r);
        assert_eq!(r.get("is_enabled"), Some("Y"));
        assert_eq!(r.get("type"), Some("header,footer"));
        assert_eq!(r.get("segments"), Some(""));
        assert_eq!(r.get("store_view_code"), Some("admin"));
        assert_eq!(r.get("banner_content"), Some("<p/>"));
    }

    #[test]
    fn test_dynamic_block_legacy_store_column() {
        let mut r = row(&[("name", "Hero"), ("store", "fr"), ("banner_content", "x")]);
        normalize_dynamic_block(&mut r);
        assert_eq!(r.get("store_view_code"), Some("fr"));
        assert_eq!(r.get("banner_content"), Some("x"));

        let mut explicit = row(&[("name", "Hero"), ("store", "fr"), ("store_view_code", "de")]);
        normalize_dynamic_block(&mut explicit);
        assert_eq!(explicit.get("store_view_code"), Some("de"));
    }

    #[test]
    fn test_enabled_flag() {
        assert!(parse_enabled_flag("Y"));
        assert!(parse_enabled_flag("1"));
        assert!(!parse_enabled_flag("N"));
        assert!(!parse_enabled_flag("0"));
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name(&row(&[("name", " Hero ")]), "dynamic_blocks").unwrap(), "Hero");
        assert!(matches!(
            require_name(&row(&[("name", "")]), "dynamic_blocks"),
            Err(ImportError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_replace_base_website_codes() {
        let mut r = row(&[("product_websites", "notbase,base")]);
        replace_base_website_codes(&mut r, "main");
        assert_eq!(r.get("product_websites"), Some("notbase,main"));

        let mut untouched = row(&[("product_websites", "b2b")]);
        replace_base_website_codes(&mut untouched, "main");
        assert_eq!(untouched.get("product_websites"), Some("b2b"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" VIP, ,New,"), vec!["VIP", "New"]);
        assert!(split_list("").is_empty());
    }
}
