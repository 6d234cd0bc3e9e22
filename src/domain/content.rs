// ==========================================
// 数据包导入工具 - 内容块领域模型
// ==========================================
// 职责: 动态内容块（Banner）/ 客户分群
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 默认（admin）店铺 ID
pub const ADMIN_STORE_ID: i64 = 0;

// ==========================================
// DynamicBlock - 动态内容块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicBlock {
    pub banner_id: Option<i64>, // None 表示尚未落库
    pub name: String,
    pub is_enabled: bool,
    pub types: String,
    pub store_contents: BTreeMap<i64, String>, // store_id → 内容
}

impl DynamicBlock {
    pub fn new(name: &str) -> Self {
        Self {
            banner_id: None,
            name: name.to_string(),
            is_enabled: true,
            types: String::new(),
            store_contents: BTreeMap::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.banner_id.is_none()
    }
}

// ==========================================
// CustomerSegment - 客户分群
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub segment_id: i64,
    pub name: String,
}
