// ==========================================
// 数据包导入工具 - 批量导入引擎层
// ==========================================
// 职责: 批量导入引擎接口 + SQLite 参考实现
// 红线: 引擎只负责校验与落库，不含数据包编排逻辑
// ==========================================

pub mod bulk_import;
pub mod error;
pub mod sqlite_importer;

// 重导出核心引擎
pub use bulk_import::{BulkImporter, BulkImporterFactory, ImportContext, ImportSummary};
pub use error::{EngineError, EngineResult};
pub use sqlite_importer::{SqliteBulkImporter, SqliteBulkImporterFactory};
