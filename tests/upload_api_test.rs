// ==========================================
// 数据包上传API测试
// ==========================================

use data_install::api::upload_api::UPLOAD_FIELD;
use data_install::api::{UploadApi, UploadResponse, GENERIC_ERROR_MESSAGE};
use data_install::config::InstallerConfig;
use serde_json::json;
use tempfile::TempDir;

fn api() -> (TempDir, UploadApi) {
    let root = TempDir::new().unwrap();
    let config = InstallerConfig::new(root.path().join("ref.db"), root.path());
    let api = UploadApi::new(&config);
    (root, api)
}

#[test]
fn test_upload_saves_zip() {
    let (root, api) = api();

    let response = api.handle(UPLOAD_FIELD, "luma.zip", b"PK\x03\x04data");
    assert!(response.is_saved());

    let saved = root.path().join("datapacks/upload/luma.zip");
    assert_eq!(std::fs::read(&saved).unwrap(), b"PK\x03\x04data");

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["name"], "luma.zip");
    assert_eq!(value["file"], "luma.zip");
    assert_eq!(value["size"], 8);
    assert_eq!(value["type"], "application/zip");
    assert_eq!(value["path"], api.upload_dir().display().to_string());
}

#[test]
fn test_upload_renames_on_collision() {
    let (root, api) = api();

    api.handle(UPLOAD_FIELD, "luma.zip", b"first");
    let response = api.handle(UPLOAD_FIELD, "luma.zip", b"second");

    match response {
        UploadResponse::Saved(result) => {
            assert_eq!(result.name, "luma.zip");
            assert_eq!(result.file, "luma_1.zip");
        }
        other => panic!("unexpected response: {:?}", other),
    }
    let dir = root.path().join("datapacks/upload");
    assert_eq!(std::fs::read(dir.join("luma.zip")).unwrap(), b"first");
    assert_eq!(std::fs::read(dir.join("luma_1.zip")).unwrap(), b"second");
}

#[test]
fn test_disallowed_extension() {
    let (root, api) = api();

    let response = api.handle(UPLOAD_FIELD, "notes.txt", b"hello");
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"errorcode": 0, "error": "Disallowed file type."})
    );
    assert!(!root.path().join("datapacks/upload/notes.txt").exists());
}

#[test]
fn test_wrong_field_is_rejected() {
    let (_root, api) = api();

    match api.handle("file", "luma.zip", b"data") {
        UploadResponse::Failed { errorcode, error } => {
            assert_eq!(errorcode, 0);
            assert!(error.contains(UPLOAD_FIELD));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[test]
fn test_empty_file_is_rejected() {
    let (_root, api) = api();
    assert!(!api.handle(UPLOAD_FIELD, "luma.zip", b"").is_saved());
}

#[test]
fn test_write_failure_returns_generic_message() {
    let root = TempDir::new().unwrap();
    // 上传目录被同名文件占用，无法创建
    let blocked = root.path().join("blocked");
    std::fs::write(&blocked, b"file").unwrap();
    let api = UploadApi::with_dir(blocked.join("upload"));

    assert_eq!(
        api.handle(UPLOAD_FIELD, "luma.zip", b"data"),
        UploadResponse::failed(GENERIC_ERROR_MESSAGE)
    );
}
