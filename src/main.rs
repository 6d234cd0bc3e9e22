// ==========================================
// 电商平台数据包导入工具 - 命令行入口
// ==========================================
// 子命令:
// - init-db: 初始化参考库
// - add-store-view: 登记网站与店铺视图
// - install: 安装数据包（目录或 zip）
// - upload: 将本地 zip 保存到上传目录
// ==========================================

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use data_install::config::installer_config::InstallerConfig;
use data_install::config::Settings;
use data_install::db::{init_schema, open_sqlite_connection, read_schema_version};
use data_install::importer::{DataInstaller, MessageLevel};
use data_install::repository::SqliteCatalogRepository;
use data_install::{logging, UploadApi, UploadResponse};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "data-install")]
#[command(author, version, about = "电商平台数据包导入工具", long_about = None)]
struct Cli {
    /// 参考库路径（默认: DATA_INSTALL_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 应用根目录（图片目录 / 上传目录 / 解压目录的基准）
    #[arg(long, global = true)]
    app_root: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 初始化参考库
    InitDb,

    /// 登记网站与店铺视图
    AddStoreView {
        /// 店铺视图代码
        code: String,
        /// 所属网站代码
        #[arg(long, default_value = "base")]
        website: String,
        /// 店铺视图名称
        #[arg(long)]
        name: Option<String>,
        /// 设为默认网站
        #[arg(long)]
        default_website: bool,
    },

    /// 安装数据包
    Install {
        /// 数据包目录或 zip 文件
        pack: PathBuf,
        /// 覆写设置（key=value，可重复）
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
        /// 以 JSON 输出安装报告
        #[arg(long)]
        json: bool,
    },

    /// 上传数据包 zip
    Upload {
        /// 本地 zip 文件
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    if let Err(e) = run(cli) {
        tracing::error!(error = ?e, "执行失败");
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = InstallerConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(root) = cli.app_root {
        config.app_root = root;
    }

    match cli.command {
        Commands::InitDb => init_db(&config),
        Commands::AddStoreView {
            code,
            website,
            name,
            default_website,
        } => add_store_view(&config, &code, &website, name.as_deref(), default_website),
        Commands::Install {
            pack,
            overrides,
            json,
        } => install(config, &pack, &overrides, json),
        Commands::Upload { file } => upload(&config, &file),
    }
}

fn init_db(config: &InstallerConfig) -> anyhow::Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建目录 {}", parent.display()))?;
    }
    let conn = open_sqlite_connection(&config.db_path_str())?;
    init_schema(&conn)?;
    let version = read_schema_version(&conn)?.unwrap_or_default();
    tracing::info!(db = %config.db_path.display(), version, "参考库已初始化");
    println!("参考库已初始化: {} (schema v{})", config.db_path.display(), version);
    Ok(())
}

fn add_store_view(
    config: &InstallerConfig,
    code: &str,
    website: &str,
    name: Option<&str>,
    default_website: bool,
) -> anyhow::Result<()> {
    let conn = open_sqlite_connection(&config.db_path_str())?;
    init_schema(&conn)?;
    let repo = SqliteCatalogRepository::from_connection(std::sync::Arc::new(std::sync::Mutex::new(conn)));

    if !repo.website_exists(website)? || default_website {
        repo.save_website(website, website, default_website)?;
    }
    let store_id = repo.save_store_view(code, website, name.unwrap_or(code))?;
    println!("店铺视图 {} (store_id={}) 已登记到网站 {}", code, store_id, website);
    Ok(())
}

fn install(
    config: InstallerConfig,
    pack: &std::path::Path,
    raw_overrides: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let mut overrides = Settings::new();
    for raw in raw_overrides {
        let (key, value) = Settings::parse_override(raw)?;
        overrides.set(&key, &value);
    }

    let installer = DataInstaller::new(config)?;
    let report = installer.install(pack, &overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("批次: {}", report.batch_id);
        for entity in &report.entities {
            match (&entity.file, &entity.error) {
                (None, _) => println!("  {:<22} 未提供", entity.entity),
                (Some(_), Some(err)) => println!("  {:<22} 失败: {}", entity.entity, err),
                (Some(_), None) => println!(
                    "  {:<22} 读取 {} 行, 导入 {} 行, 跳过 {} 行",
                    entity.entity,
                    entity.outcome.rows_read,
                    entity.outcome.rows_imported,
                    entity.outcome.rows_skipped
                ),
            }
        }
        println!(
            "警告 {} 条, 错误 {} 条, 耗时 {} ms",
            report.count_at(MessageLevel::Warning),
            report.count_at(MessageLevel::Error),
            report.elapsed_ms()
        );
    }
    Ok(())
}

fn upload(config: &InstallerConfig, file: &std::path::Path) -> anyhow::Result<()> {
    let file_name = match file.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => bail!("无效的文件路径: {}", file.display()),
    };
    let bytes = std::fs::read(file).with_context(|| format!("无法读取 {}", file.display()))?;

    let api = UploadApi::new(config);
    let response = api.handle(data_install::api::upload_api::UPLOAD_FIELD, &file_name, &bytes);
    println!("{}", serde_json::to_string(&response)?);

    if let UploadResponse::Failed { error, .. } = response {
        bail!(error);
    }
    Ok(())
}
