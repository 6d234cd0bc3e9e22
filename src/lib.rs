// ==========================================
// 电商平台数据包导入工具 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 将数据包（商品 / 阶梯价 / 动态内容块 / 共享目录 / 团队）
//           批量导入平台参考库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 批量导入引擎
pub mod engine;

// 导入层 - 数据包安装
pub mod importer;

// 配置层 - 数据包设置与运行环境
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 数据包上传
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AppArea, EntityCode, ValidationStrategy, Visibility};

// 导入
pub use importer::{DataInstaller, InstallReport};

// 配置
pub use config::{InstallerConfig, Settings};

// API
pub use api::{UploadApi, UploadResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "data-install";
