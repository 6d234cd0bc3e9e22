// ==========================================
// 数据包导入工具 - API层
// ==========================================
// 职责: 对外接口（数据包上传），错误转换为调用方可展示的响应
// ==========================================

pub mod error;
pub mod upload_api;

// 重导出
pub use error::{ApiError, ApiResult, GENERIC_ERROR_MESSAGE};
pub use upload_api::{UploadApi, UploadResponse, UploadResult};
