// ==========================================
// 数据包导入工具 - API层错误类型
// ==========================================
// 职责: 定义上传接口错误类型，区分可直接展示给操作者的错误与内部错误
// ==========================================

use crate::importer::error::ImportError;
use thiserror::Error;

/// 内部错误对外展示的统一信息
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred, please try again later.";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 上传校验错误（可展示）
    // ==========================================
    #[error("\"{0}\" is not in the uploaded files")]
    MissingField(String),

    #[error("Disallowed file type.")]
    DisallowedExtension(String),

    #[error("The file name is invalid.")]
    InvalidFileName(String),

    #[error("The uploaded file is empty.")]
    EmptyFile,

    // ==========================================
    // 内部错误（仅记录日志）
    // ==========================================
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否可以把错误信息直接返回给调用方
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ApiError::MissingField(_)
                | ApiError::DisallowedExtension(_)
                | ApiError::InvalidFileName(_)
                | ApiError::EmptyFile
        )
    }

    /// 对外展示的错误信息
    pub fn public_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
