//! File management module for Baketsu.
//!
//! This module keeps the metadata of stored objects:
//! - Hierarchical per-account folders
//! - File registration, rename, move and soft delete
//! - Storage totals by category

mod folder;
mod metadata;

pub use folder::{Folder, FolderRepository, NewFolder};
pub use metadata::{
    CategoryUsage, FileCategory, FileQuery, FileRepository, FileSort, FileUpdate, FolderScope,
    NewFile, StorageSummary, StoredFile,
};

/// Maximum length for filename (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Maximum length for folder names (in characters).
pub const MAX_FOLDER_NAME_LENGTH: usize = 100;

/// Maximum size of a single stored object (5 TiB).
pub const MAX_FILE_SIZE: i64 = 5 * 1024 * 1024 * 1024 * 1024;

/// Maximum folder depth (levels).
pub const MAX_FOLDER_DEPTH: usize = 10;
