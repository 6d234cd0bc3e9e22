// ==========================================
// 数据包导入工具 - 数据包上传API
// ==========================================
// 职责: 接收单个上传文件（字段 vertical），仅允许 zip，
//       保存到 datapacks/upload，重名时自动改名
// 响应: 成功 {name, file, path, size, type}；失败 {errorcode: 0, error}
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::installer_config::InstallerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// 上传字段名
pub const UPLOAD_FIELD: &str = "vertical";
/// 允许的扩展名
pub const ALLOWED_EXTENSIONS: &[&str] = &["zip"];
/// 保存后的内容类型
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// 上传成功响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// 原始文件名
    pub name: String,
    /// 实际保存的文件名（可能已改名）
    pub file: String,
    /// 保存目录
    pub path: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// 上传接口响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Saved(UploadResult),
    Failed { errorcode: i32, error: String },
}

impl UploadResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        UploadResponse::Failed {
            errorcode: 0,
            error: message.into(),
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, UploadResponse::Saved(_))
    }
}

// ==========================================
// UploadApi
// ==========================================
pub struct UploadApi {
    upload_dir: PathBuf,
}

impl UploadApi {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            upload_dir: config.upload_dir(),
        }
    }

    pub fn with_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// 处理上传请求，错误转换为响应体
    ///
    /// 非校验类错误记录完整信息到日志，仅返回通用提示
    pub fn handle(&self, field_name: &str, file_name: &str, bytes: &[u8]) -> UploadResponse {
        match self.save(field_name, file_name, bytes) {
            Ok(result) => UploadResponse::Saved(result),
            Err(e) if e.is_user_facing() => UploadResponse::failed(e.to_string()),
            Err(e) => {
                error!(error = ?e, file_name, "数据包上传失败");
                UploadResponse::failed(e.public_message())
            }
        }
    }

    /// 校验并保存上传文件
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn save(&self, field_name: &str, file_name: &str, bytes: &[u8]) -> ApiResult<UploadResult> {
        if field_name != UPLOAD_FIELD {
            return Err(ApiError::MissingField(UPLOAD_FIELD.to_string()));
        }

        let base_name = sanitize_file_name(file_name)?;
        let ext = Path::new(&base_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ApiError::DisallowedExtension(ext));
        }
        if bytes.is_empty() {
            return Err(ApiError::EmptyFile);
        }

        fs::create_dir_all(&self.upload_dir)?;
        let target_name = available_file_name(&self.upload_dir, &base_name);
        let target = self.upload_dir.join(&target_name);
        fs::write(&target, bytes)?;

        info!(file = %target.display(), size = bytes.len(), "数据包已上传");
        Ok(UploadResult {
            name: file_name.to_string(),
            file: target_name,
            path: self.upload_dir.display().to_string(),
            size: bytes.len() as u64,
            content_type: ZIP_CONTENT_TYPE.to_string(),
        })
    }
}

/// 只保留文件名部分，非 [A-Za-z0-9_.-] 字符替换为 '_'
fn sanitize_file_name(file_name: &str) -> ApiResult<String> {
    let base = Path::new(file_name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ApiError::InvalidFileName(file_name.to_string()))?;

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        return Err(ApiError::InvalidFileName(file_name.to_string()));
    }
    Ok(cleaned)
}

/// 重名时依次尝试 name_1.zip, name_2.zip, ...
fn available_file_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = path.extension().and_then(|e| e.to_str());
    let mut index = 1;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{}_{}.{}", stem, index, ext),
            None => format!("{}_{}", stem, index),
        };
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        index += 1;
    }
}
