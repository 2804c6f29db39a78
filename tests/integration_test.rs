//! Integration tests for onedrive-uploader
//!
//! GraphClient とチャンク転送エンジンを組み合わせた転送の検証

use mockito::{Matcher, Server};
use onedrive_uploader::adapter::graph::GraphClient;
use onedrive_uploader::application::dto::upload_config::UploadConfig;
use onedrive_uploader::application::use_cases::upload_file::UploadFileUseCase;
use onedrive_uploader::domain::entities::upload_session::{CHUNK_ALIGNMENT, SIMPLE_UPLOAD_LIMIT};
use onedrive_uploader::domain::errors::UploaderError;
use onedrive_uploader::domain::services::activity_log::ActivityLog;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;

const FILE_SIZE: u64 = 5 * 1024 * 1024;
const CHUNK_SIZE: u64 = CHUNK_ALIGNMENT * 8;

fn client(server: &Server) -> Arc<GraphClient> {
    let base = Url::parse(&format!("{}/v1.0/me", server.url())).unwrap();
    Arc::new(GraphClient::new(base, "test-token", ActivityLog::default()).unwrap())
}

fn large_file(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("archive.zip");
    let content: Vec<u8> = (0..FILE_SIZE).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_chunked_upload_through_graph_client() {
    let temp_dir = TempDir::new().unwrap();
    let local = large_file(&temp_dir);

    let mut server = Server::new_async().await;
    let session = server
        .mock(
            "POST",
            "/v1.0/me/drive/root:/Backups/archive.zip:/createUploadSession",
        )
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "item": { "@microsoft.graph.conflictBehavior": "replace" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "uploadUrl": format!("{}/upload/session-1", server.url()),
                "expirationDateTime": "2030-01-01T00:00:00Z"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let first = server
        .mock("PUT", "/upload/session-1")
        .match_header("content-range", "bytes 0-2621439/5242880")
        .match_header("content-length", "2621440")
        .match_header("authorization", Matcher::Missing)
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(json!({ "nextExpectedRanges": ["2621440-"] }).to_string())
        .create_async()
        .await;
    let last = server
        .mock("PUT", "/upload/session-1")
        .match_header("content-range", "bytes 2621440-5242879/5242880")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "id": "01ARCHIVE", "name": "archive.zip", "size": FILE_SIZE }).to_string(),
        )
        .create_async()
        .await;

    let uploader = UploadFileUseCase::new(
        client(&server),
        UploadConfig::new(CHUNK_SIZE, SIMPLE_UPLOAD_LIMIT),
        ActivityLog::default(),
    );

    let progress = Mutex::new(Vec::new());
    let observer = |sent: u64, total: u64| progress.lock().unwrap().push((sent, total));

    let item = uploader
        .execute(&local, "/Backups/", Some(&observer))
        .await
        .unwrap();

    assert_eq!(item.name, "archive.zip");
    assert_eq!(item.size, Some(FILE_SIZE));
    assert_eq!(
        *progress.lock().unwrap(),
        vec![(2621440, FILE_SIZE), (FILE_SIZE, FILE_SIZE)]
    );

    session.assert_async().await;
    first.assert_async().await;
    last.assert_async().await;
}

#[tokio::test]
async fn test_chunk_rejection_aborts_upload() {
    let temp_dir = TempDir::new().unwrap();
    let local = large_file(&temp_dir);

    let mut server = Server::new_async().await;
    server
        .mock(
            "POST",
            "/v1.0/me/drive/root:/Backups/archive.zip:/createUploadSession",
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "uploadUrl": format!("{}/upload/s2", server.url()) }).to_string())
        .create_async()
        .await;
    let rejected = server
        .mock("PUT", "/upload/s2")
        .with_status(416)
        .with_body(
            json!({ "error": { "code": "invalidRange", "message": "Requested range not satisfiable" } })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let uploader = UploadFileUseCase::new(
        client(&server),
        UploadConfig::new(CHUNK_SIZE, SIMPLE_UPLOAD_LIMIT),
        ActivityLog::default(),
    );

    match uploader.execute(&local, "Backups/archive.zip", None).await {
        Err(UploaderError::Transfer { status, message }) => {
            assert_eq!(status, 416);
            assert!(message.contains("invalidRange"));
        }
        other => panic!("expected Transfer error, got {:?}", other),
    }

    // 最初のチャンクで打ち切られ、2つ目は送られない
    rejected.assert_async().await;
}
