// ==========================================
// 数据包导入工具 - 导入层
// ==========================================
// 职责: 读取数据包文件，规范化行记录，对账并分发到批量导入引擎，
//       维护内容块 / 共享目录 / 团队的关联关系
// 支持: CSV, Excel, zip 数据包
// ==========================================

// 模块声明
pub mod data_installer;
pub mod data_pack;
pub mod data_types;
pub mod entity_resolver;
pub mod error;
pub mod file_parser;
pub mod import_dispatcher;
pub mod reconciler;
pub mod relationship_linker;
pub mod reporter;
pub mod row_normalizer;

// 重导出核心类型
pub use data_installer::{DataInstaller, EntityReport, InstallReport};
pub use data_pack::{DataPack, PackEntry};
pub use data_types::{EntityOutcome, InstallContext, Repositories};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, TabularFile, UniversalFileParser};
pub use import_dispatcher::{resolve_image_dir, DispatchRequest, ImportDispatcher};
pub use reconciler::RestrictionPlan;
pub use reporter::{MemoryReporter, MessageLevel, ReportedMessage, Reporter, TracingReporter};
