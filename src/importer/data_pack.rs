// ==========================================
// 数据包导入工具 - 数据包定位与解压
// ==========================================
// 职责: 打开数据包（目录或 .zip），按文件名定位各实体文件
// 约束: zip 解压到工作目录后与目录数据包同等处理
// 约束: 实体文件可位于数据包任意层级，取最浅的一个
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// 受支持的表格扩展名（按优先级）
const TABLE_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

// ==========================================
// PackEntry - 数据包内的实体文件
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackEntry {
    Settings,
    Products,
    AdvancedPricing,
    DynamicBlocks,
    SharedCatalogs,
    Teams,
}

impl PackEntry {
    /// 按导入顺序排列的全部实体文件
    pub const ALL: [PackEntry; 6] = [
        PackEntry::Settings,
        PackEntry::Products,
        PackEntry::AdvancedPricing,
        PackEntry::DynamicBlocks,
        PackEntry::SharedCatalogs,
        PackEntry::Teams,
    ];

    /// 文件名（不含扩展名）
    pub fn file_stem(&self) -> &'static str {
        match self {
            PackEntry::Settings => "settings",
            PackEntry::Products => "products",
            PackEntry::AdvancedPricing => "advanced_pricing",
            PackEntry::DynamicBlocks => "dynamic_blocks",
            PackEntry::SharedCatalogs => "b2b_shared_catalogs",
            PackEntry::Teams => "b2b_teams",
        }
    }

    /// 由文件名识别实体文件
    pub fn from_filename(name: &str) -> Option<Self> {
        let path = Path::new(name);
        let ext = path.extension()?.to_str()?.to_lowercase();
        if !TABLE_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?.to_lowercase();
        Self::ALL.into_iter().find(|e| e.file_stem() == stem)
    }
}

// ==========================================
// DataPack - 已打开的数据包
// ==========================================
#[derive(Debug, Clone)]
pub struct DataPack {
    root: PathBuf,
}

impl DataPack {
    /// 打开数据包
    ///
    /// # 参数
    /// - path: 数据包目录或 .zip 文件
    /// - work_dir: zip 解压目录（None 时解压到 zip 同名目录）
    pub fn open(path: &Path, work_dir: Option<&Path>) -> ImportResult<Self> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if path.is_dir() {
            return Ok(Self {
                root: path.to_path_buf(),
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "zip" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let dest = match work_dir {
            Some(dir) => dir.to_path_buf(),
            None => path.with_extension(""),
        };
        Self::extract(path, &dest)?;
        Ok(Self { root: dest })
    }

    fn extract(archive_path: &Path, dest: &Path) -> ImportResult<()> {
        fs::create_dir_all(dest)?;
        let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
        let entries = archive.len();
        archive.extract(dest)?;
        info!(
            archive = %archive_path.display(),
            dest = %dest.display(),
            entries,
            "数据包已解压"
        );
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 定位实体文件
    pub fn find(&self, entry: PackEntry) -> Option<PathBuf> {
        let found = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| !e.path().components().any(|c| c.as_os_str() == "__MACOSX"))
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .and_then(PackEntry::from_filename)
                    .is_some_and(|found| found == entry)
            })
            .min_by_key(|e| (e.depth(), Self::extension_rank(e.path())))
            .map(|e| e.into_path());

        debug!(entry = entry.file_stem(), found = ?found, "定位实体文件");
        found
    }

    /// 模块目录: settings 文件所在目录，其次 products 文件所在目录，都没有时为数据包根目录
    ///
    /// zip 内常带一层顶级文件夹，媒体目录与数据文件同级
    pub fn module_dir(&self) -> PathBuf {
        [PackEntry::Settings, PackEntry::Products]
            .into_iter()
            .find_map(|entry| self.find(entry))
            .and_then(|file| file.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.root.clone())
    }

    fn extension_rank(path: &Path) -> usize {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        TABLE_EXTENSIONS
            .iter()
            .position(|e| *e == ext)
            .unwrap_or(TABLE_EXTENSIONS.len())
    }
}
