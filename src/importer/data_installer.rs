// ==========================================
// 数据包导入工具 - 数据包安装编排
// ==========================================
// 流程:
// 1. 打开数据包（目录或 zip）
// 2. 读取 settings 文件并合并命令行覆写
// 3. 按固定顺序安装各实体文件（商品 → 阶梯价 → 内容块 → 共享目录 → 团队）
// 4. 汇总为 InstallReport（批次 ID / 起止时间 / 各实体结果 / 消息）
// 约束: 任一实体文件失败只影响该文件，不中断整个安装
// ==========================================

use crate::config::installer_config::InstallerConfig;
use crate::config::Settings;
use crate::db::{init_schema, open_shared_connection};
use crate::domain::row::Row;
use crate::engine::sqlite_importer::SqliteBulkImporterFactory;
use crate::importer::data_pack::{DataPack, PackEntry};
use crate::importer::data_types::{self, EntityOutcome, InstallContext, Repositories};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::reporter::{MessageLevel, ReportedMessage, Reporter, TeeReporter};
use crate::repository::b2b_repo::SqliteB2bRepository;
use crate::repository::catalog_repo::SqliteCatalogRepository;
use crate::repository::content_repo::SqliteContentRepository;
use crate::repository::structure_repo::SqliteStructureRepository;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// zip 数据包解压目录（相对应用根目录）
pub const EXTRACT_SUBDIR: &str = "var/datapacks";

// ==========================================
// InstallReport - 安装结果
// ==========================================

/// 单个实体文件的安装结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub entity: &'static str,
    /// 数据包内找到的文件（未找到为 None）
    pub file: Option<String>,
    pub outcome: EntityOutcome,
    /// 文件级失败信息
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub batch_id: String,
    pub pack_path: String,
    pub settings: Settings,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entities: Vec<EntityReport>,
    pub messages: Vec<ReportedMessage>,
}

impl InstallReport {
    pub fn entity(&self, entity: PackEntry) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.entity == entity.file_stem())
    }

    pub fn count_at(&self, level: MessageLevel) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

// ==========================================
// DataInstaller
// ==========================================
pub struct DataInstaller {
    config: InstallerConfig,
    catalog: SqliteCatalogRepository,
    content: SqliteContentRepository,
    b2b: SqliteB2bRepository,
    structure: SqliteStructureRepository,
    factory: SqliteBulkImporterFactory,
    parser: UniversalFileParser,
}

impl DataInstaller {
    /// 打开配置中的数据库（不存在则建表）
    pub fn new(config: InstallerConfig) -> ImportResult<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = open_shared_connection(&config.db_path_str())?;
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            init_schema(&guard)?;
        }
        Ok(Self::from_connection(config, conn))
    }

    /// 使用已有连接（调用方负责建表）
    pub fn from_connection(config: InstallerConfig, conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            config,
            catalog: SqliteCatalogRepository::from_connection(conn.clone()),
            content: SqliteContentRepository::from_connection(conn.clone()),
            b2b: SqliteB2bRepository::from_connection(conn.clone()),
            structure: SqliteStructureRepository::from_connection(conn.clone()),
            factory: SqliteBulkImporterFactory::new(conn),
            parser: UniversalFileParser,
        }
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    fn repositories(&self) -> Repositories<'_> {
        Repositories {
            products: &self.catalog,
            stores: &self.catalog,
            banners: &self.content,
            segments: &self.content,
            shared_catalogs: &self.b2b,
            customer_groups: &self.b2b,
            companies: &self.b2b,
            customers: &self.b2b,
            teams: &self.b2b,
            structure: &self.structure,
        }
    }

    /// 安装数据包
    ///
    /// # 参数
    /// - pack_path: 数据包目录或 zip 文件
    /// - overrides: 覆写 settings 文件的设置
    ///
    /// # 返回
    /// - Err: 数据包无法打开
    /// - Ok(InstallReport): 其余失败均记录在报告中
    #[instrument(skip(self, overrides), fields(batch_id))]
    pub fn install(&self, pack_path: &Path, overrides: &Settings) -> ImportResult<InstallReport> {
        let started_at = Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, pack = %pack_path.display(), "开始安装数据包");

        let work_dir = self.extract_dir(pack_path);
        let pack = DataPack::open(pack_path, work_dir.as_deref())?;
        let reporter = TeeReporter::default();

        let mut settings = self.load_settings(&pack, &reporter);
        settings.merge(overrides);
        info!(
            store_view_code = settings.store_view_code(),
            site_code = settings.site_code(),
            store_code = settings.store_code(),
            restrict_products_from_views = settings.restrict_products_from_views(),
            "数据包设置已加载"
        );

        let module_path = pack.module_dir();
        debug!(module_path = %module_path.display(), "模块目录");

        let ctx = InstallContext {
            settings: &settings,
            config: &self.config,
            module_path: &module_path,
            reporter: &reporter,
            factory: &self.factory,
            repos: self.repositories(),
        };

        let mut entities = Vec::new();
        for entry in PackEntry::ALL {
            if entry == PackEntry::Settings {
                continue;
            }
            entities.push(self.install_entry(&pack, entry, &ctx));
        }

        let finished_at = Utc::now();
        let report = InstallReport {
            batch_id,
            pack_path: pack_path.display().to_string(),
            settings: settings.clone(),
            started_at,
            finished_at,
            entities,
            messages: reporter.memory.messages(),
        };
        info!(
            batch_id = %report.batch_id,
            elapsed_ms = report.elapsed_ms(),
            warnings = report.count_at(MessageLevel::Warning),
            errors = report.count_at(MessageLevel::Error),
            "数据包安装完成"
        );
        Ok(report)
    }

    /// zip 数据包解压到 app_root/var/datapacks/<文件名>
    fn extract_dir(&self, pack_path: &Path) -> Option<std::path::PathBuf> {
        if pack_path.is_dir() {
            return None;
        }
        let stem = pack_path.file_stem()?;
        Some(self.config.resolve(Path::new(EXTRACT_SUBDIR)).join(stem))
    }

    fn load_settings(&self, pack: &DataPack, reporter: &dyn Reporter) -> Settings {
        let path = match pack.find(PackEntry::Settings) {
            Some(path) => path,
            None => {
                reporter.warning("数据包中没有 settings 文件，使用默认设置");
                return Settings::new();
            }
        };

        match self.read_rows(&path) {
            Ok(rows) => Settings::from_rows(&rows),
            Err(e) => {
                reporter.error(&format!("settings 文件读取失败，使用默认设置: {}", e));
                Settings::new()
            }
        }
    }

    fn read_rows(&self, path: &Path) -> ImportResult<Vec<Row>> {
        self.parser.parse(path)?.into_rows()
    }

    fn install_entry(&self, pack: &DataPack, entry: PackEntry, ctx: &InstallContext) -> EntityReport {
        let mut report = EntityReport {
            entity: entry.file_stem(),
            file: None,
            outcome: EntityOutcome::default(),
            error: None,
        };

        let path = match pack.find(entry) {
            Some(path) => path,
            None => return report,
        };
        report.file = Some(path.display().to_string());
        ctx.reporter.info(&format!("Loading {}", entry.file_stem()));

        let result = self.read_rows(&path).and_then(|rows| match entry {
            PackEntry::Products => data_types::products::install(rows, ctx),
            PackEntry::AdvancedPricing => data_types::advanced_pricing::install(rows, ctx),
            PackEntry::DynamicBlocks => data_types::dynamic_blocks::install(rows, ctx),
            PackEntry::SharedCatalogs => data_types::shared_catalogs::install(rows, ctx),
            PackEntry::Teams => data_types::teams::install(rows, ctx),
            PackEntry::Settings => Ok(EntityOutcome::default()),
        });

        match result {
            Ok(outcome) => {
                if outcome.rows_skipped > 0 {
                    warn!(entity = entry.file_stem(), skipped = outcome.rows_skipped, "部分行已跳过");
                }
                report.outcome = outcome;
            }
            Err(e) => {
                error!(entity = entry.file_stem(), error = %e, "实体文件安装失败");
                ctx.reporter
                    .error(&format!("{} 安装失败: {}", entry.file_stem(), e));
                report.error = Some(e.to_string());
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_files_are_not_errors() {
        let root = tempfile::tempdir().unwrap();
        let pack = root.path().join("pack");
        fs::create_dir_all(&pack).unwrap();

        let config = InstallerConfig::new(root.path().join("db/install.db"), root.path());
        let installer = DataInstaller::new(config).unwrap();
        let report = installer.install(&pack, &Settings::new()).unwrap();

        assert_eq!(report.entities.len(), 5);
        assert!(report.entities.iter().all(|e| e.file.is_none() && e.error.is_none()));
        assert_eq!(report.count_at(MessageLevel::Warning), 1);
        assert!(Uuid::parse_str(&report.batch_id).is_ok());
    }

    #[test]
    fn test_bad_file_does_not_halt_run() {
        let root = tempfile::tempdir().unwrap();
        let pack = root.path().join("pack");
        fs::create_dir_all(&pack).unwrap();
        fs::write(pack.join("settings.csv"), "name,value\nsite_code,base\n").unwrap();
        // 行长度与表头不一致
        fs::write(pack.join("dynamic_blocks.csv"), "name,type\nHero\n").unwrap();
        fs::write(pack.join("b2b_shared_catalogs.csv"), "name,description\nWholesale,B2B\n").unwrap();

        let config = InstallerConfig::new(root.path().join("install.db"), root.path());
        let installer = DataInstaller::new(config).unwrap();
        let report = installer.install(&pack, &Settings::new()).unwrap();

        let blocks = report.entity(PackEntry::DynamicBlocks).unwrap();
        assert!(blocks.error.is_some());
        let catalogs = report.entity(PackEntry::SharedCatalogs).unwrap();
        assert_eq!(catalogs.outcome.rows_imported, 1);
    }

    #[test]
    fn test_missing_pack_is_error() {
        let root = tempfile::tempdir().unwrap();
        let config = InstallerConfig::new(root.path().join("install.db"), root.path());
        let installer = DataInstaller::new(config).unwrap();
        assert!(matches!(
            installer.install(&root.path().join("nope"), &Settings::new()),
            Err(ImportError::FileNotFound(_))
        ));
    }
}
