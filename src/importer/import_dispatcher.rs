// ==========================================
// 数据包导入工具 - 批量导入分发
// ==========================================
// 职责: 将一批行记录交给新建的批量导入引擎实例
// 约束: 引擎异常在此边界捕获并报告，从不向上传播
// 约束: 无论成功与否，都输出引擎的处理日志与错误信息
// ==========================================

use crate::config::installer_config::{InstallerConfig, DEFAULT_IMAGE_SUBDIR, FALLBACK_IMAGE_DIR};
use crate::config::Settings;
use crate::domain::row::Row;
use crate::domain::types::{EntityCode, ValidationStrategy};
use crate::engine::bulk_import::{BulkImporterFactory, ImportContext, ImportSummary};
use crate::importer::reporter::{MessageLevel, Reporter};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// 单次分发参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub entity_code: EntityCode,
    pub validation_strategy: ValidationStrategy,
    pub images_file_dir: Option<PathBuf>,
}

impl DispatchRequest {
    pub fn new(entity_code: EntityCode, validation_strategy: ValidationStrategy) -> Self {
        Self {
            entity_code,
            validation_strategy,
            images_file_dir: None,
        }
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_file_dir = Some(dir.into());
        self
    }

    /// 构造引擎上下文（后台区域，容错数由策略决定）
    pub fn to_context(&self) -> ImportContext {
        let ctx = ImportContext::new(self.entity_code, self.validation_strategy);
        match &self.images_file_dir {
            Some(dir) => ctx.with_images_dir(dir.clone()),
            None => ctx,
        }
    }
}

// ==========================================
// ImportDispatcher
// ==========================================
pub struct ImportDispatcher<'a> {
    factory: &'a dyn BulkImporterFactory,
    reporter: &'a dyn Reporter,
}

impl<'a> ImportDispatcher<'a> {
    pub fn new(factory: &'a dyn BulkImporterFactory, reporter: &'a dyn Reporter) -> Self {
        Self { factory, reporter }
    }

    /// 分发一批行记录
    ///
    /// # 返回
    /// - Some(ImportSummary): 引擎完成导入
    /// - None: 空批次未分发，或引擎失败（失败已报告）
    #[instrument(skip(self, rows, request), fields(entity = request.entity_code.as_str(), rows = rows.len()))]
    pub fn dispatch(&self, rows: &[Row], request: &DispatchRequest) -> Option<ImportSummary> {
        if rows.is_empty() {
            info!("空批次，跳过分发");
            return None;
        }

        let ctx = request.to_context();
        let mut importer = self.factory.create();

        let outcome = importer.process_import(rows, &ctx);
        let summary = match outcome {
            Ok(summary) => Some(summary),
            Err(e) => {
                self.reporter.error(&e.to_string());
                None
            }
        };

        self.reporter
            .print_lines(importer.log_trace(), MessageLevel::Info);
        self.reporter
            .print_lines(importer.error_messages(), MessageLevel::Error);

        drop(importer);
        summary
    }
}

/// 确定商品图片目录
///
/// # 规则
/// - 设置了 product_image_import_directory → 使用该目录（相对路径以应用根目录解析）
/// - 否则 → 数据包根目录/media/catalog/product
/// - 目录不存在 → 警告并回退到应用根目录/var
pub fn resolve_image_dir(
    settings: &Settings,
    module_path: &Path,
    config: &InstallerConfig,
    reporter: &dyn Reporter,
) -> PathBuf {
    let candidate = match settings.product_image_import_directory() {
        Some(dir) => config.resolve(Path::new(dir)),
        None => module_path.join(DEFAULT_IMAGE_SUBDIR),
    };

    if candidate.is_dir() {
        return candidate;
    }

    reporter.warning(&format!(
        "商品图片目录 {} 不存在。如本次导入需要包含商品图片，可能导致导入问题",
        candidate.display()
    ));
    config.resolve(Path::new(FALLBACK_IMAGE_DIR))
}
