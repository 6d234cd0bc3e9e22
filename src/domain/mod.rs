// ==========================================
// 数据包导入工具 - 领域模型层
// ==========================================
// 职责: 定义行记录、平台实体、组织结构树、领域类型
// 红线: 不含数据访问逻辑,不含导入编排逻辑
// ==========================================

pub mod b2b;
pub mod content;
pub mod product;
pub mod row;
pub mod structure;
pub mod types;

// 重导出核心类型
pub use b2b::{Company, Customer, CustomerGroup, SharedCatalog, Team};
pub use content::{CustomerSegment, DynamicBlock, ADMIN_STORE_ID};
pub use product::{Product, RestrictionRecord, SkuSet, StoreView};
pub use row::Row;
pub use structure::{StructureError, StructureNode, StructureTree};
pub use types::{
    AppArea, CatalogType, EntityCode, StructureEntityType, ValidationStrategy, Visibility,
};
