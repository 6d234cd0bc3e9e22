// ==========================================
// 数据包导入工具 - 数据包设置
// ==========================================
// 来源: 数据包 settings 文件（name,value 两列）+ 命令行覆写
// 约束: 空白值视为未设置，读取时回落到默认值
// ==========================================

use crate::config::config_keys;
use crate::domain::row::Row;
use crate::domain::types::ValidationStrategy;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 各设置项默认值
pub mod defaults {
    pub const STORE_VIEW_CODE: &str = "default";
    pub const SITE_CODE: &str = "base";
    pub const STORE_CODE: &str = "main_website_store";
    pub const RESTRICT_PRODUCTS_FROM_VIEWS: &str = "N";
}

// ==========================================
// Settings - 设置键值集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 settings 文件行构造
    ///
    /// 每行取 `name` / `value` 两列，name 为空的行忽略
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut settings = Settings::new();
        for row in rows {
            if let Some(name) = row.value("name") {
                settings.set(name, row.get("value").unwrap_or_default().trim());
            }
        }
        settings
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.trim().to_string(), value.to_string());
    }

    /// 合并覆写（other 优先）
    pub fn merge(&mut self, other: &Settings) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// 解析 `key=value` 形式的覆写
    pub fn parse_override(raw: &str) -> ImportResult<(String, String)> {
        match raw.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
            _ => Err(ImportError::ConfigValueError {
                key: raw.to_string(),
                value: String::new(),
                message: "覆写格式应为 key=value".to_string(),
            }),
        }
    }

    /// 已设置且非空白的值
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn get_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    // ===== 类型化读取 =====

    pub fn store_view_code(&self) -> &str {
        self.get_or_default(config_keys::STORE_VIEW_CODE, defaults::STORE_VIEW_CODE)
    }

    pub fn site_code(&self) -> &str {
        self.get_or_default(config_keys::SITE_CODE, defaults::SITE_CODE)
    }

    pub fn store_code(&self) -> &str {
        self.get_or_default(config_keys::STORE_CODE, defaults::STORE_CODE)
    }

    pub fn validation_strategy(&self) -> ValidationStrategy {
        self.get(config_keys::PRODUCT_VALIDATION_STRATEGY)
            .map(ValidationStrategy::parse)
            .unwrap_or_default()
    }

    /// 仅当取值为 "Y" 时开启
    pub fn restrict_products_from_views(&self) -> bool {
        self.get_or_default(
            config_keys::RESTRICT_PRODUCTS_FROM_VIEWS,
            defaults::RESTRICT_PRODUCTS_FROM_VIEWS,
        ) == "Y"
    }

    pub fn product_image_import_directory(&self) -> Option<&str> {
        self.get(config_keys::PRODUCT_IMAGE_IMPORT_DIRECTORY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let settings = Settings::new();
        assert_eq!(settings.store_view_code(), "default");
        assert_eq!(settings.site_code(), "base");
        assert_eq!(settings.store_code(), "main_website_store");
        assert_eq!(settings.validation_strategy(), ValidationStrategy::SkipErrors);
        assert!(!settings.restrict_products_from_views());
        assert_eq!(settings.product_image_import_directory(), None);
    }

    #[test]
    fn test_from_rows_and_blank_values() {
        let rows: Vec<Row> = vec![
            vec![("name", "store_view_code"), ("value", "fr")].into_iter().collect(),
            vec![("name", "site_code"), ("value", "  ")].into_iter().collect(),
            vec![("name", ""), ("value", "ignored")].into_iter().collect(),
            vec![("name", "restrict_products_from_views"), ("value", "Y")]
                .into_iter()
                .collect(),
        ];
        let settings = Settings::from_rows(&rows);
        assert_eq!(settings.store_view_code(), "fr");
        assert_eq!(settings.site_code(), "base");
        assert!(settings.restrict_products_from_views());
        assert_eq!(settings.len(), 3);
    }

    #[test]
    fn test_restrict_requires_exact_y() {
        let mut settings = Settings::new();
        settings.set("restrict_products_from_views", "yes");
        assert!(!settings.restrict_products_from_views());
    }

    #[test]
    fn test_strategy_parsing() {
        let mut settings = Settings::new();
        settings.set("product_validation_strategy", "validation-stop-on-errors");
        assert_eq!(settings.validation_strategy(), ValidationStrategy::StopOnErrors);
        settings.set("product_validation_strategy", "whatever");
        assert_eq!(settings.validation_strategy(), ValidationStrategy::SkipErrors);
    }

    #[test]
    fn test_parse_override_and_merge() {
        assert_eq!(
            Settings::parse_override("site_code = b2b").unwrap(),
            ("site_code".to_string(), "b2b".to_string())
        );
        assert!(Settings::parse_override("novalue").is_err());

        let mut base = Settings::new();
        base.set("site_code", "base");
        let mut over = Settings::new();
        over.set("site_code", "b2b");
        base.merge(&over);
        assert_eq!(base.site_code(), "b2b");
    }
}
