// ==========================================
// 数据包导入工具 - 批量导入引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 批量导入引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("不支持的实体代码: {0}")]
    UnsupportedEntity(String),

    #[error("导入已终止: 错误数 {errors} 达到容错上限 {allowed}（策略 {strategy}）")]
    ErrorLimitExceeded {
        errors: usize,
        allowed: usize,
        strategy: String,
    },

    #[error("图片目录不可用: {0}")]
    ImageDirUnavailable(String),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
