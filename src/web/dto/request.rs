//! Request DTOs for Web API.

use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};
use crate::file::{FileQuery, FileSort, FolderScope};

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Billing period selection for invoice generation.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoicePeriodQuery {
    /// Billing year (defaults to the previous month's year).
    pub year: Option<i32>,
    /// Billing month 1-12 (defaults to the previous month).
    pub month: Option<u32>,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters for listing files.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// Only files in this folder.
    pub folder_id: Option<i64>,
    /// Only files outside any folder (ignored when `folder_id` is set).
    #[serde(default)]
    pub root: bool,
    /// Case-insensitive filename search.
    pub search: Option<String>,
    /// Sort key (uploaded_at, name, size).
    pub sort: Option<FileSort>,
    /// Sort direction (asc, desc).
    pub order: Option<SortOrder>,
}

impl ListFilesQuery {
    /// Convert into repository view preferences.
    pub fn to_file_query(&self) -> FileQuery {
        let scope = match (self.folder_id, self.root) {
            (Some(id), _) => FolderScope::Folder(id),
            (None, true) => FolderScope::Root,
            (None, false) => FolderScope::All,
        };

        FileQuery {
            scope,
            search: self.search.clone(),
            sort: self.sort.unwrap_or_default(),
            descending: self.order.unwrap_or_default() == SortOrder::Desc,
        }
    }
}

/// Register an uploaded file.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterFileRequest {
    /// Display filename.
    #[validate(
        length(min = 1, max = 255),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub filename: String,
    /// Size in bytes.
    #[validate(range(
        min = 1,
        max = 5497558138880i64,
        message = "File size must be between 1 byte and 5 TiB"
    ))]
    pub file_size: i64,
    /// Destination folder.
    pub folder_id: Option<i64>,
    /// Object key assigned by the upload service.
    #[validate(length(min = 1, max = 1024))]
    pub file_key: Option<String>,
}

/// Rename and/or move a file.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFileRequest {
    /// New filename.
    #[validate(
        length(min = 1, max = 255),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub filename: Option<String>,
    /// Destination folder; `null` moves the file to the root.
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i64>)]
    pub folder_id: Option<Option<i64>>,
}

/// Create a folder.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(
        length(min = 1, max = 100),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    /// Parent folder (None for a root folder).
    pub parent_id: Option<i64>,
}

/// Query parameters for listing folders.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFoldersQuery {
    /// List children of this folder instead of root folders.
    pub parent_id: Option<i64>,
}
