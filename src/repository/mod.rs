// ==========================================
// 数据包导入工具 - 数据仓储层
// ==========================================
// 职责: 提供平台实体的数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,查询字段经白名单映射
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod b2b_repo;
pub mod catalog_repo;
pub mod content_repo;
pub mod error;
pub mod search_criteria;
pub mod structure_repo;

// 重导出核心仓储
pub use b2b_repo::{
    CompanyRepository, CustomerGroupRepository, CustomerRepository, SharedCatalogRepository,
    SqliteB2bRepository, TeamRepository,
};
pub use catalog_repo::{
    ProductRepository, ProductWrite, SqliteCatalogRepository, StoreRepository, TierPriceWrite,
};
pub use content_repo::{BannerRepository, SegmentRepository, SqliteContentRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use search_criteria::{ConditionType, FilterValue, SearchCriteria, Searchable};
pub use structure_repo::{SqliteStructureRepository, StructureRepository};
