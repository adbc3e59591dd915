//! Web API File/Folder Tests
//!
//! Integration tests for file, folder and storage endpoints.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use common::{bearer, create_test_server, day, seed_file, GB};

/// Register a file and return its ID.
async fn register_file(server: &TestServer, user_id: i64, body: Value) -> i64 {
    let response = server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(user_id))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

/// Create a folder and return its ID.
async fn create_folder(server: &TestServer, user_id: i64, name: &str, parent: Option<i64>) -> i64 {
    let response = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(user_id))
        .json(&json!({ "name": name, "parent_id": parent }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

// ============================================================================
// File Registration
// ============================================================================

#[tokio::test]
async fn test_register_file() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "holiday.jpg", "file_size": 2048 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["filename"], "holiday.jpg");
    assert_eq!(body["data"]["file_size"], 2048);
    assert_eq!(body["data"]["category"], "images");
    assert!(body["data"]["folder_id"].is_null());
    assert!(body["data"]["file_key"]
        .as_str()
        .unwrap()
        .starts_with("users/1/"));
}

#[tokio::test]
async fn test_register_empty_file_rejected() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "empty.txt", "file_size": 0 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["file_size"].is_array());
}

#[tokio::test]
async fn test_register_oversized_file_rejected() {
    let (server, _db) = create_test_server().await;

    for name in ["a.bin", "b.bin"] {
        let response = server
            .post("/api/files")
            .add_header(AUTHORIZATION, bearer(1))
            .json(&json!({ "filename": name, "file_size": i64::MAX }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["details"]["file_size"].is_array());
    }

    let response = server
        .get("/api/storage")
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_bytes"], 0);
}

#[tokio::test]
async fn test_register_file_into_foreign_folder() {
    let (server, _db) = create_test_server().await;
    let folder_id = create_folder(&server, 2, "Private", None).await;

    let response = server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "a.txt", "file_size": 1, "folder_id": folder_id }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_file_invalid_json() {
    let (server, _db) = create_test_server().await;

    let response = server
        .post("/api/files")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "a.txt" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// File Listing
// ============================================================================

#[tokio::test]
async fn test_list_files_newest_first() {
    let (server, db) = create_test_server().await;
    seed_file(&db, 1, "old.pdf", 100, day(2025, 1, 1), None).await;
    seed_file(&db, 1, "new.pdf", 300, day(2025, 3, 1), None).await;
    seed_file(&db, 1, "gone.pdf", 200, day(2025, 2, 1), Some(day(2025, 2, 2))).await;
    seed_file(&db, 2, "other.pdf", 100, day(2025, 1, 1), None).await;

    let response = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer(1))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["filename"], "new.pdf");
    assert_eq!(files[1]["filename"], "old.pdf");
}

#[tokio::test]
async fn test_list_files_search_and_sort() {
    let (server, db) = create_test_server().await;
    seed_file(&db, 1, "Report-2024.xlsx", 500, day(2025, 1, 1), None).await;
    seed_file(&db, 1, "report-2025.xlsx", 100, day(2025, 1, 2), None).await;
    seed_file(&db, 1, "photo.png", 900, day(2025, 1, 3), None).await;

    let response = server
        .get("/api/files?search=report&sort=size&order=asc")
        .add_header(AUTHORIZATION, bearer(1))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["filename"], "report-2025.xlsx");
    assert_eq!(files[1]["filename"], "Report-2024.xlsx");
}

#[tokio::test]
async fn test_list_files_by_folder() {
    let (server, _db) = create_test_server().await;
    let folder_id = create_folder(&server, 1, "Docs", None).await;
    register_file(
        &server,
        1,
        json!({ "filename": "in.txt", "file_size": 10, "folder_id": folder_id }),
    )
    .await;
    register_file(&server, 1, json!({ "filename": "out.txt", "file_size": 10 })).await;

    let response = server
        .get(&format!("/api/files?folder_id={folder_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "in.txt");

    let response = server
        .get("/api/files?root=true")
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    let files = body["data"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filename"], "out.txt");

    // Another account's folder
    server
        .get(&format!("/api/files?folder_id={folder_id}"))
        .add_header(AUTHORIZATION, bearer(2))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// File Detail, Update and Delete
// ============================================================================

#[tokio::test]
async fn test_get_file_access() {
    let (server, _db) = create_test_server().await;
    let file_id = register_file(&server, 1, json!({ "filename": "a.mp3", "file_size": 5 })).await;

    let response = server
        .get(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["category"], "audio");

    server
        .get(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(2))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_and_move_file() {
    let (server, _db) = create_test_server().await;
    let folder_id = create_folder(&server, 1, "Music", None).await;
    let file_id = register_file(&server, 1, json!({ "filename": "a.mp3", "file_size": 5 })).await;

    let response = server
        .patch(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "song.mp3", "folder_id": folder_id }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["filename"], "song.mp3");
    assert_eq!(body["data"]["folder_id"], folder_id);

    // Renaming alone keeps the folder
    let response = server
        .patch(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "filename": "track.mp3" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["folder_id"], folder_id);

    // Explicit null moves back to the root
    let response = server
        .patch(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "folder_id": null }))
        .await;
    let body: Value = response.json();
    assert!(body["data"]["folder_id"].is_null());
    assert_eq!(body["data"]["filename"], "track.mp3");
}

#[tokio::test]
async fn test_move_file_to_foreign_folder() {
    let (server, _db) = create_test_server().await;
    let foreign = create_folder(&server, 2, "Theirs", None).await;
    let file_id = register_file(&server, 1, json!({ "filename": "a.txt", "file_size": 5 })).await;

    server
        .patch(&format!("/api/files/{file_id}"))
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "folder_id": foreign }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_file_keeps_billing() {
    let (server, db) = create_test_server().await;
    let file = seed_file(&db, 1, "big.iso", 10 * GB, day(2025, 1, 1), None).await;

    let response = server
        .delete(&format!("/api/files/{}", file.id))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    response.assert_status_ok();

    server
        .get(&format!("/api/files/{}", file.id))
        .add_header(AUTHORIZATION, bearer(1))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Deleting twice
    server
        .delete(&format!("/api/files/{}", file.id))
        .add_header(AUTHORIZATION, bearer(1))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Still billed for the days it was stored this month
    let response = server
        .get("/api/billing/usage")
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    let deleted = body["data"]["deleted_files"].as_array().unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0]["filename"], "big.iso");
    assert!(body["data"]["active_files"].as_array().unwrap().is_empty());
}

// ============================================================================
// Folders
// ============================================================================

#[tokio::test]
async fn test_folder_tree() {
    let (server, _db) = create_test_server().await;
    let photos = create_folder(&server, 1, "Photos", None).await;
    let trips = create_folder(&server, 1, "Trips", Some(photos)).await;
    let alps = create_folder(&server, 1, "Alps", Some(trips)).await;
    register_file(
        &server,
        1,
        json!({ "filename": "peak.jpg", "file_size": 10, "folder_id": alps }),
    )
    .await;

    let response = server
        .get("/api/folders")
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "Photos");

    let response = server
        .get(&format!("/api/folders?parent_id={trips}"))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"][0]["name"], "Alps");
    assert_eq!(body["data"][0]["file_count"], 1);

    let response = server
        .get(&format!("/api/folders/{alps}"))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let path: Vec<&str> = body["data"]["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(path, vec!["Photos", "Trips", "Alps"]);
    assert_eq!(body["data"]["folder"]["file_count"], 1);

    let response = server
        .get(&format!("/api/folders/{photos}"))
        .add_header(AUTHORIZATION, bearer(1))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"]["subfolders"][0]["name"], "Trips");
}

#[tokio::test]
async fn test_folder_names_unique_per_parent() {
    let (server, _db) = create_test_server().await;
    let parent = create_folder(&server, 1, "Work", None).await;

    let response = server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "name": "Work" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Same name under a different parent is fine
    create_folder(&server, 1, "Work", Some(parent)).await;

    // Same name for another account is fine
    create_folder(&server, 2, "Work", None).await;
}

#[tokio::test]
async fn test_folder_access() {
    let (server, _db) = create_test_server().await;
    let folder = create_folder(&server, 1, "Mine", None).await;

    server
        .get(&format!("/api/folders/{folder}"))
        .add_header(AUTHORIZATION, bearer(2))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(2))
        .json(&json!({ "name": "Sub", "parent_id": folder }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/folders")
        .add_header(AUTHORIZATION, bearer(1))
        .json(&json!({ "name": "   " }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Storage Summary
// ============================================================================

#[tokio::test]
async fn test_storage_summary() {
    let (server, db) = create_test_server().await;
    seed_file(&db, 1, "a.jpg", 100, day(2025, 1, 1), None).await;
    seed_file(&db, 1, "b.png", 200, day(2025, 1, 1), None).await;
    seed_file(&db, 1, "c.mp4", 1000, day(2025, 1, 1), None).await;
    seed_file(&db, 1, "d.zip", 50, day(2025, 1, 1), Some(day(2025, 1, 2))).await;

    let response = server
        .get("/api/storage")
        .add_header(AUTHORIZATION, bearer(1))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["total_files"], 3);
    assert_eq!(body["data"]["total_bytes"], 1300);

    let categories = body["data"]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["category"], "videos");
    assert_eq!(categories[1]["category"], "images");
    assert_eq!(categories[1]["files"], 2);
}
