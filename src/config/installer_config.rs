// ==========================================
// 数据包导入工具 - 运行环境配置
// ==========================================
// 职责: 数据库路径 / 应用根目录 / 上传目录
// 优先级: 环境变量 > 用户数据目录 > 当前目录
// ==========================================

use std::path::{Path, PathBuf};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "DATA_INSTALL_DB_PATH";
/// 应用根目录环境变量
pub const APP_ROOT_ENV: &str = "DATA_INSTALL_APP_ROOT";

/// 上传目录（相对应用根目录）
pub const UPLOAD_SUBDIR: &str = "datapacks/upload";
/// 默认商品图片目录（相对数据包根目录）
pub const DEFAULT_IMAGE_SUBDIR: &str = "media/catalog/product";
/// 图片目录不可用时的回退目录（相对应用根目录）
pub const FALLBACK_IMAGE_DIR: &str = "var";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerConfig {
    pub db_path: PathBuf,
    pub app_root: PathBuf,
}

impl InstallerConfig {
    pub fn new(db_path: impl Into<PathBuf>, app_root: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            app_root: app_root.into(),
        }
    }

    /// 按环境解析默认配置
    pub fn from_env() -> Self {
        let app_root = std::env::var(APP_ROOT_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_app_root);
        Self {
            db_path: default_db_path(),
            app_root,
        }
    }

    /// 上传目录
    pub fn upload_dir(&self) -> PathBuf {
        self.app_root.join(UPLOAD_SUBDIR)
    }

    /// 以应用根目录解析相对路径
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.app_root.join(path)
        }
    }

    pub fn db_path_str(&self) -> String {
        self.db_path.to_string_lossy().to_string()
    }
}

fn default_app_root() -> PathBuf {
    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("data-install"),
        None => PathBuf::from("."),
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 DATA_INSTALL_DB_PATH（非空时）
/// - 用户数据目录/data-install/data_install.db
/// - 回退: ./data_install.db
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("data-install").join("data_install.db"),
        None => PathBuf::from("./data_install.db"),
    }
}
