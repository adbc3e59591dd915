//! OpenAPI document for the REST API.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    BreadcrumbItem, CreateFolderRequest, DeletedResponse, FileCostResponse, FileResponse,
    FolderDetailResponse, FolderResponse, InvoiceResponse, PricingResponse, PricingTierResponse,
    ReconciliationResponse, RegisterFileRequest, SortOrder, UpdateFileRequest, UsageResponse,
};
use crate::file::{CategoryUsage, FileCategory, FileSort, StorageSummary};

/// Baketsu API OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Baketsu API",
        version = "0.1.0",
        description = "Storage usage billing, files and folders.

All endpoints require a bearer token in the `Authorization` header."
    ),
    servers(
        (url = "/api", description = "Local server")
    ),
    paths(
        // Billing
        crate::web::handlers::billing::get_usage,
        crate::web::handlers::billing::get_pricing,
        crate::web::handlers::billing::list_invoices,
        crate::web::handlers::billing::generate_invoice,
        crate::web::handlers::billing::get_invoice,
        crate::web::handlers::billing::reconcile_invoice,
        crate::web::handlers::billing::delete_invoice,
        // Files
        crate::web::handlers::file::list_files,
        crate::web::handlers::file::register_file,
        crate::web::handlers::file::get_file,
        crate::web::handlers::file::update_file,
        crate::web::handlers::file::delete_file,
        // Folders
        crate::web::handlers::folder::list_folders,
        crate::web::handlers::folder::create_folder,
        crate::web::handlers::folder::get_folder,
        // Storage
        crate::web::handlers::storage::get_storage,
    ),
    components(
        schemas(
            // Billing
            UsageResponse,
            FileCostResponse,
            PricingResponse,
            PricingTierResponse,
            InvoiceResponse,
            ReconciliationResponse,
            DeletedResponse,
            // Files and folders
            FileResponse,
            RegisterFileRequest,
            UpdateFileRequest,
            FileSort,
            SortOrder,
            FileCategory,
            FolderResponse,
            FolderDetailResponse,
            BreadcrumbItem,
            CreateFolderRequest,
            // Storage
            StorageSummary,
            CategoryUsage,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "billing", description = "Usage estimates and invoices"),
        (name = "files", description = "File metadata"),
        (name = "folders", description = "Folder hierarchy"),
        (name = "storage", description = "Storage breakdown"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` security scheme referenced by every path.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
