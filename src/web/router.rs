//! Router configuration for Web API.

use axum::{middleware, routing::get, Json, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{
    create_folder, delete_file, delete_invoice, generate_invoice, get_file, get_folder,
    get_invoice, get_pricing, get_storage, get_usage, list_files, list_folders, list_invoices,
    reconcile_invoice, register_file, update_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};
use super::openapi::ApiDoc;

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let billing_routes = Router::new()
        .route("/usage", get(get_usage))
        .route("/pricing", get(get_pricing))
        .route("/invoices", get(list_invoices).post(generate_invoice))
        .route("/invoices/:id", get(get_invoice).delete(delete_invoice))
        .route("/invoices/:id/reconcile", get(reconcile_invoice));

    let file_routes = Router::new()
        .route("/", get(list_files).post(register_file))
        .route("/:id", get(get_file).patch(update_file).delete(delete_file));

    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/:id", get(get_folder));

    // API routes
    let api_routes = Router::new()
        .nest("/billing", billing_routes)
        .nest("/files", file_routes)
        .nest("/folders", folder_routes)
        .route("/storage", get(get_storage));

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    // Build the main router with middleware
    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_health_router() {
        let server = TestServer::new(create_health_router()).unwrap();
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[tokio::test]
    async fn test_openapi_router() {
        let server = TestServer::new(create_openapi_router()).unwrap();
        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let json: serde_json::Value = response.json();
        assert_eq!(json["info"]["title"], "Baketsu API");
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let db = Database::open_in_memory().await.unwrap();
        let router = create_router(
            Arc::new(AppState::new(db)),
            Arc::new(JwtState::new("secret")),
            &[],
        );
        let server = TestServer::new(router).unwrap();

        server
            .get("/api/billing/usage")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/files")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
