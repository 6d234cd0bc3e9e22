// ==========================================
// 数据包导入工具 - 领域类型定义
// ==========================================
// 依据: 平台导入引擎约定（可见性 / 校验策略 / 实体代码）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 商品可见性 (Visibility)
// ==========================================
// 导入文件中使用文字标签，落库使用数值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    NotVisibleIndividually, // 1: 不单独显示
    Catalog,                // 2: 仅目录
    Search,                 // 3: 仅搜索
    CatalogSearch,          // 4: 目录 + 搜索
}

impl Visibility {
    /// 导入文件中的标签
    pub fn label(&self) -> &'static str {
        match self {
            Visibility::NotVisibleIndividually => "Not Visible Individually",
            Visibility::Catalog => "Catalog",
            Visibility::Search => "Search",
            Visibility::CatalogSearch => "Catalog, Search",
        }
    }

    /// 数据库存储值
    pub fn to_db_value(&self) -> i32 {
        match self {
            Visibility::NotVisibleIndividually => 1,
            Visibility::Catalog => 2,
            Visibility::Search => 3,
            Visibility::CatalogSearch => 4,
        }
    }

    pub fn from_db_value(value: i32) -> Option<Self> {
        match value {
            1 => Some(Visibility::NotVisibleIndividually),
            2 => Some(Visibility::Catalog),
            3 => Some(Visibility::Search),
            4 => Some(Visibility::CatalogSearch),
            _ => None,
        }
    }

    /// 解析标签（大小写不敏感）
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "not visible individually" => Some(Visibility::NotVisibleIndividually),
            "catalog" => Some(Visibility::Catalog),
            "search" => Some(Visibility::Search),
            "catalog, search" => Some(Visibility::CatalogSearch),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// 导入校验策略 (Validation Strategy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationStrategy {
    #[default]
    SkipErrors,   // validation-skip-errors: 跳过错误行
    StopOnErrors, // validation-stop-on-errors: 遇错即停
}

impl ValidationStrategy {
    pub const SKIP_ERRORS: &'static str = "validation-skip-errors";
    pub const STOP_ON_ERRORS: &'static str = "validation-stop-on-errors";

    /// 解析策略字符串
    ///
    /// 除 `validation-stop-on-errors` 以外的任何值均视为跳过错误
    pub fn parse(value: &str) -> Self {
        if value.trim() == Self::STOP_ON_ERRORS {
            ValidationStrategy::StopOnErrors
        } else {
            ValidationStrategy::SkipErrors
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStrategy::SkipErrors => Self::SKIP_ERRORS,
            ValidationStrategy::StopOnErrors => Self::STOP_ON_ERRORS,
        }
    }

    /// 允许的错误数量
    ///
    /// # 规则
    /// - 遇错即停 → 1
    /// - 跳过错误 → 100（实际等同于不限）
    pub fn allowed_error_count(&self) -> usize {
        match self {
            ValidationStrategy::StopOnErrors => 1,
            ValidationStrategy::SkipErrors => 100,
        }
    }
}

impl fmt::Display for ValidationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 应用区域 (Area)
// ==========================================
// 导入调用显式携带区域，不再修改全局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppArea {
    Global,
    Adminhtml,
    Frontend,
}

impl fmt::Display for AppArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppArea::Global => write!(f, "global"),
            AppArea::Adminhtml => write!(f, "adminhtml"),
            AppArea::Frontend => write!(f, "frontend"),
        }
    }
}

// ==========================================
// 批量导入实体代码 (Entity Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityCode {
    CatalogProduct,
    AdvancedPricing,
}

impl EntityCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCode::CatalogProduct => "catalog_product",
            EntityCode::AdvancedPricing => "advanced_pricing",
        }
    }
}

impl fmt::Display for EntityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 组织结构节点实体类型
// ==========================================
// 数据库存储: 0 = 客户, 1 = 团队
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureEntityType {
    Customer,
    Team,
}

impl StructureEntityType {
    pub fn to_db_value(&self) -> i32 {
        match self {
            StructureEntityType::Customer => 0,
            StructureEntityType::Team => 1,
        }
    }

    pub fn from_db_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(StructureEntityType::Customer),
            1 => Some(StructureEntityType::Team),
            _ => None,
        }
    }
}

// ==========================================
// 共享目录类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogType {
    Custom, // 0
    Public, // 1
}

impl CatalogType {
    /// 空值或 "Custom" → Custom，其他值 → Public
    pub fn from_row_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("Custom") => CatalogType::Custom,
            Some(_) => CatalogType::Public,
        }
    }

    pub fn to_db_value(&self) -> i32 {
        match self {
            CatalogType::Custom => 0,
            CatalogType::Public => 1,
        }
    }

    pub fn from_db_value(value: i32) -> Self {
        if value == 1 {
            CatalogType::Public
        } else {
            CatalogType::Custom
        }
    }
}
