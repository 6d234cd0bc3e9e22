// ==========================================
// 数据包导入工具 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::structure::StructureError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("数据包解压失败: {0}")]
    ArchiveError(String),

    // ===== 行数据错误 =====
    #[error("行长度与表头不一致 (行 {row}): 期望 {expected} 列，实际 {actual} 列")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("必填字段缺失 ({file}): {field}")]
    MissingRequiredField { file: String, field: String },

    // ===== 关联查找错误 =====
    #[error("公司不存在: {0}")]
    CompanyNotFound(String),

    #[error("公司管理员结构节点不存在: company={company}, admin_id={admin_id}")]
    CompanyRootMissing { company: String, admin_id: i64 },

    // ===== 配置错误 =====
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 下层错误 =====
    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("组织结构错误: {0}")]
    Structure(#[from] StructureError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ImportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportError::ArchiveError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>（经仓储错误归类）
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
