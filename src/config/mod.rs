// ==========================================
// 数据包导入工具 - 配置层
// ==========================================
// 职责: 数据包设置（settings 文件 + 覆写）与运行环境配置
// ==========================================

pub mod installer_config;
pub mod settings;

// 重导出核心配置
pub use installer_config::InstallerConfig;
pub use settings::Settings;

/// 数据包设置键
pub mod config_keys {
    // 店铺定位
    pub const STORE_VIEW_CODE: &str = "store_view_code";
    pub const SITE_CODE: &str = "site_code";
    pub const STORE_CODE: &str = "store_code";

    // 商品导入
    pub const PRODUCT_VALIDATION_STRATEGY: &str = "product_validation_strategy";
    pub const RESTRICT_PRODUCTS_FROM_VIEWS: &str = "restrict_products_from_views";
    pub const PRODUCT_IMAGE_IMPORT_DIRECTORY: &str = "product_image_import_directory";
}
