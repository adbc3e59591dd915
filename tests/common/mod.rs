//! Test helpers for Web API tests.
#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;

use baketsu::file::{FileRepository, NewFile, StoredFile};
use baketsu::web::handlers::AppState;
use baketsu::web::middleware::{JwtClaims, JwtState};
use baketsu::web::router::create_router;
use baketsu::Database;

/// Shared secret for test tokens.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// One gigabyte in bytes.
pub const GB: i64 = 1024 * 1024 * 1024;

/// Create a test server with an in-memory database.
///
/// The returned database shares its pool with the server.
pub async fn create_test_server() -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let app_state = Arc::new(AppState::new(db.clone()));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));
    let router = create_router(app_state, jwt_state, &[]);

    let server = TestServer::new(router).expect("Failed to create test server");
    (server, db)
}

/// Mint an access token for an account, as the auth service would.
pub fn token_for(user_id: i64) -> String {
    let now = Utc::now().timestamp() as u64;
    let claims = JwtClaims {
        sub: user_id,
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to encode token")
}

/// Authorization header value for an account.
pub fn bearer(user_id: i64) -> String {
    format!("Bearer {}", token_for(user_id))
}

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Insert a file with a past upload time, optionally deleted later.
pub async fn seed_file(
    db: &Database,
    user_id: i64,
    filename: &str,
    size: i64,
    uploaded_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
) -> StoredFile {
    let repo = FileRepository::new(db.pool());
    let file = repo
        .create(&NewFile::new(user_id, filename, size).with_uploaded_at(uploaded_at))
        .await
        .expect("Failed to seed file");

    if let Some(at) = deleted_at {
        repo.soft_delete(file.id, user_id, at)
            .await
            .expect("Failed to delete seeded file");
    }
    file
}
