// ==========================================
// 数据包导入工具 - 各数据类型安装
// ==========================================
// 职责: 每种数据文件一个安装函数，共享安装上下文
// 约束: 行级问题报告后跳过，不中断同一文件的后续行
// ==========================================

pub mod advanced_pricing;
pub mod dynamic_blocks;
pub mod products;
pub mod shared_catalogs;
pub mod teams;

use crate::config::{InstallerConfig, Settings};
use crate::engine::bulk_import::BulkImporterFactory;
use crate::importer::reporter::Reporter;
use crate::repository::b2b_repo::{
    CompanyRepository, CustomerGroupRepository, CustomerRepository, SharedCatalogRepository,
    TeamRepository,
};
use crate::repository::catalog_repo::{ProductRepository, StoreRepository};
use crate::repository::content_repo::{BannerRepository, SegmentRepository};
use crate::repository::structure_repo::StructureRepository;
use serde::Serialize;
use std::path::Path;

/// 安装过程使用的仓储（按职责拆分为 trait object）
#[derive(Clone, Copy)]
pub struct Repositories<'a> {
    pub products: &'a dyn ProductRepository,
    pub stores: &'a dyn StoreRepository,
    pub banners: &'a dyn BannerRepository,
    pub segments: &'a dyn SegmentRepository,
    pub shared_catalogs: &'a dyn SharedCatalogRepository,
    pub customer_groups: &'a dyn CustomerGroupRepository,
    pub companies: &'a dyn CompanyRepository,
    pub customers: &'a dyn CustomerRepository,
    pub teams: &'a dyn TeamRepository,
    pub structure: &'a dyn StructureRepository,
}

/// 单个数据文件的安装上下文
pub struct InstallContext<'a> {
    pub settings: &'a Settings,
    pub config: &'a InstallerConfig,
    /// 数据包根目录
    pub module_path: &'a Path,
    pub reporter: &'a dyn Reporter,
    pub factory: &'a dyn BulkImporterFactory,
    pub repos: Repositories<'a>,
}

/// 单个数据文件的安装结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityOutcome {
    /// 文件中的行数
    pub rows_read: usize,
    /// 已写入（或交给引擎导入成功）的行数
    pub rows_imported: usize,
    /// 报告后跳过的行数
    pub rows_skipped: usize,
}

impl EntityOutcome {
    pub fn new(rows_read: usize) -> Self {
        Self {
            rows_read,
            ..Default::default()
        }
    }
}
