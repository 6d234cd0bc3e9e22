// ==========================================
// 数据包导入工具 - 批量导入引擎接口
// ==========================================
// 职责: 定义批量导入引擎与其工厂（不包含实现）
// 约束: 引擎实例一次性使用，由工厂为每次分发创建
// 约束: 运行区域通过 ImportContext 显式传入，不依赖全局状态
// ==========================================

use crate::domain::row::Row;
use crate::domain::types::{AppArea, EntityCode, ValidationStrategy};
use crate::engine::error::EngineResult;
use serde::Serialize;
use std::path::PathBuf;

// ==========================================
// ImportContext - 单次导入参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportContext {
    pub entity_code: EntityCode,
    pub area: AppArea,
    pub images_file_dir: Option<PathBuf>,
    pub validation_strategy: ValidationStrategy,
    pub allowed_error_count: usize,
}

impl ImportContext {
    /// 以策略默认容错数构造（后台区域）
    pub fn new(entity_code: EntityCode, validation_strategy: ValidationStrategy) -> Self {
        Self {
            entity_code,
            area: AppArea::Adminhtml,
            images_file_dir: None,
            validation_strategy,
            allowed_error_count: validation_strategy.allowed_error_count(),
        }
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_file_dir = Some(dir.into());
        self
    }
}

// ==========================================
// ImportSummary - 单次导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub processed_rows: usize,
    pub imported_rows: usize,
    pub invalid_rows: usize,
    pub error_count: usize,
}

// ==========================================
// BulkImporter Trait
// ==========================================
// 实现者: SqliteBulkImporter
pub trait BulkImporter {
    /// 校验并导入一批行记录
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入完成（可能跳过了部分无效行）
    /// - Err(EngineError::ErrorLimitExceeded): 错误数触发终止，未写入任何行
    fn process_import(&mut self, rows: &[Row], ctx: &ImportContext) -> EngineResult<ImportSummary>;

    /// 本次导入的处理日志
    fn log_trace(&self) -> &[String];

    /// 本次导入的错误信息
    fn error_messages(&self) -> &[String];
}

/// 批量导入引擎工厂
pub trait BulkImporterFactory {
    fn create(&self) -> Box<dyn BulkImporter>;
}
