// ==========================================
// 数据包导入工具 - B2B 领域模型
// ==========================================
// 职责: 共享目录 / 公司 / 客户 / 客户组 / 团队
// ==========================================

use crate::domain::types::CatalogType;
use serde::{Deserialize, Serialize};

// ==========================================
// SharedCatalog - 共享目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedCatalog {
    pub catalog_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub customer_group_id: i64,
    pub created_by: i64,
    pub tax_class_id: i64,
    pub catalog_type: CatalogType,
}

impl SharedCatalog {
    /// 创建人（管理员用户 1）
    pub const DEFAULT_CREATED_BY: i64 = 1;
    /// 税类（零售客户 3）
    pub const DEFAULT_TAX_CLASS_ID: i64 = 3;

    pub fn new(name: &str) -> Self {
        Self {
            catalog_id: None,
            name: name.to_string(),
            description: None,
            customer_group_id: 0,
            created_by: Self::DEFAULT_CREATED_BY,
            tax_class_id: Self::DEFAULT_TAX_CLASS_ID,
            catalog_type: CatalogType::Custom,
        }
    }
}

// ==========================================
// Company - 公司
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub company_id: i64,
    pub company_name: String,
    pub super_user_id: i64, // 公司管理员客户 ID
}

// ==========================================
// Customer - 客户（仅用于邮箱 → ID 解析）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub email: String,
}

// ==========================================
// CustomerGroup - 客户组
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    pub group_id: i64,
    pub code: String,
}

// ==========================================
// Team - 公司团队
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: Option<i64>,
    pub company_id: i64,
    pub name: String,
}
