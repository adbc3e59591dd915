//! Stored file metadata and repository.
//!
//! Object bytes live in external storage; this table keeps what billing and
//! the file browser need. Deleting a file only sets `deleted_at` so the
//! storage it used stays billable up to that point.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use utoipa::ToSchema;

use super::folder::FolderRepository;
use super::{MAX_FILENAME_LENGTH, MAX_FILE_SIZE};
use crate::billing::StorageRecord;
use crate::{BaketsuError, Result};

const FILE_COLUMNS: &str =
    "id, user_id, folder_id, filename, file_key, file_size, uploaded_at, deleted_at";

/// Metadata for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StoredFile {
    /// Unique file ID.
    pub id: i64,
    /// Owning account.
    pub user_id: i64,
    /// Folder ID (None for the root).
    pub folder_id: Option<i64>,
    /// Display filename.
    pub filename: String,
    /// Object key in external storage.
    pub file_key: String,
    /// Size in bytes.
    pub file_size: i64,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// When the file was deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredFile {
    /// Whether the file has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Category derived from the file extension.
    pub fn category(&self) -> FileCategory {
        FileCategory::from_filename(&self.filename)
    }

    /// The billing view of this file.
    pub fn to_storage_record(&self) -> StorageRecord {
        StorageRecord {
            id: self.id,
            filename: self.filename.clone(),
            size_bytes: self.file_size,
            created_at: self.uploaded_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// Data for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Owning account.
    pub user_id: i64,
    /// Folder ID (None for the root).
    pub folder_id: Option<i64>,
    /// Display filename.
    pub filename: String,
    /// Object key; generated when not set.
    pub file_key: Option<String>,
    /// Size in bytes.
    pub file_size: i64,
    /// Upload time; now when not set.
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl NewFile {
    /// Create a new NewFile in the root folder.
    pub fn new(user_id: i64, filename: impl Into<String>, file_size: i64) -> Self {
        Self {
            user_id,
            folder_id: None,
            filename: filename.into(),
            file_key: None,
            file_size,
            uploaded_at: None,
        }
    }

    /// Place the file in a folder.
    pub fn with_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Set the object key.
    pub fn with_file_key(mut self, file_key: impl Into<String>) -> Self {
        self.file_key = Some(file_key.into());
        self
    }

    /// Set the upload time.
    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(uploaded_at);
        self
    }
}

/// Data for renaming or moving a file.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    /// New filename.
    pub filename: Option<String>,
    /// New folder; `Some(None)` moves the file to the root.
    pub folder_id: Option<Option<i64>>,
}

impl FileUpdate {
    /// Create an empty FileUpdate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the new filename.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the destination folder.
    pub fn folder_id(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.folder_id.is_none()
    }
}

/// Which folder a listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FolderScope {
    /// Files in every folder.
    #[default]
    All,
    /// Files outside any folder.
    Root,
    /// Files in one folder.
    Folder(i64),
}

/// Sort key for file listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileSort {
    /// Upload time.
    #[default]
    UploadedAt,
    /// Filename, case-insensitive.
    Name,
    /// Size in bytes.
    Size,
}

impl FileSort {
    fn column(&self) -> &'static str {
        match self {
            FileSort::UploadedAt => "uploaded_at",
            FileSort::Name => "filename COLLATE NOCASE",
            FileSort::Size => "file_size",
        }
    }
}

/// View preferences for a file listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    /// Folder filter.
    pub scope: FolderScope,
    /// Case-insensitive substring of the filename.
    pub search: Option<String>,
    /// Sort key.
    pub sort: FileSort,
    /// Sort descending.
    pub descending: bool,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            scope: FolderScope::All,
            search: None,
            sort: FileSort::UploadedAt,
            descending: true,
        }
    }
}

/// Coarse file type used by the storage breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Images,
    Videos,
    Documents,
    Audio,
    Others,
}

impl FileCategory {
    /// All categories in display order.
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Images,
        FileCategory::Videos,
        FileCategory::Documents,
        FileCategory::Audio,
        FileCategory::Others,
    ];

    /// Classify a filename by its extension.
    pub fn from_filename(filename: &str) -> Self {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return FileCategory::Others,
        };

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg" => FileCategory::Images,
            "mp4" | "mov" | "webm" | "avi" | "mkv" => FileCategory::Videos,
            "pdf" | "doc" | "docx" | "txt" | "md" | "csv" | "xlsx" | "xls" | "ppt" | "pptx" => {
                FileCategory::Documents
            }
            "mp3" | "wav" | "ogg" | "m4a" | "flac" => FileCategory::Audio,
            _ => FileCategory::Others,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Images => "images",
            FileCategory::Videos => "videos",
            FileCategory::Documents => "documents",
            FileCategory::Audio => "audio",
            FileCategory::Others => "others",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown file category: {s}"))
    }
}

/// Usage of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryUsage {
    pub category: FileCategory,
    pub files: i64,
    pub bytes: i64,
}

/// Active storage totals for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StorageSummary {
    pub total_files: i64,
    pub total_bytes: i64,
    /// Non-empty categories, largest first.
    pub categories: Vec<CategoryUsage>,
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an uploaded file.
    pub async fn create(&self, file: &NewFile) -> Result<StoredFile> {
        let filename = validate_filename(&file.filename)?;
        if file.file_size <= 0 {
            return Err(BaketsuError::Validation(
                "empty files cannot be stored".to_string(),
            ));
        }
        if file.file_size > MAX_FILE_SIZE {
            return Err(BaketsuError::Validation(format!(
                "file size exceeds {MAX_FILE_SIZE} bytes"
            )));
        }
        if let Some(folder_id) = file.folder_id {
            self.ensure_folder(folder_id, file.user_id).await?;
        }

        let file_key = file.file_key.clone().unwrap_or_else(|| {
            format!("users/{}/{}-{}", file.user_id, uuid::Uuid::new_v4(), filename)
        });

        let result = sqlx::query(
            "INSERT INTO files (user_id, folder_id, filename, file_key, file_size, uploaded_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file.user_id)
        .bind(file.folder_id)
        .bind(filename)
        .bind(&file_key)
        .bind(file.file_size)
        .bind(file.uploaded_at.unwrap_or_else(Utc::now))
        .execute(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BaketsuError::NotFound("file".to_string()))
    }

    /// Get a file by ID, including deleted files.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(file)
    }

    /// Get an active file owned by the account.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(file)
    }

    /// List the account's active files.
    pub async fn list(&self, user_id: i64, query: &FileQuery) -> Result<Vec<StoredFile>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE deleted_at IS NULL AND user_id = "
        ));
        builder.push_bind(user_id);

        match query.scope {
            FolderScope::All => {}
            FolderScope::Root => {
                builder.push(" AND folder_id IS NULL");
            }
            FolderScope::Folder(folder_id) => {
                builder.push(" AND folder_id = ");
                builder.push_bind(folder_id);
            }
        }

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                builder.push(" AND filename LIKE ");
                builder.push_bind(format!("%{}%", escape_like(search)));
                builder.push(" ESCAPE '\\'");
            }
        }

        let direction = if query.descending { "DESC" } else { "ASC" };
        builder.push(format!(
            " ORDER BY {} {direction}, id {direction}",
            query.sort.column()
        ));

        let files = builder
            .build_query_as::<StoredFile>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Rename and/or move an active file.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        update: &FileUpdate,
    ) -> Result<Option<StoredFile>> {
        if self.get_for_user(id, user_id).await?.is_none() {
            return Ok(None);
        }
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE files SET ");
        let mut separated = query.separated(", ");

        if let Some(ref filename) = update.filename {
            let filename = validate_filename(filename)?;
            separated.push("filename = ");
            separated.push_bind_unseparated(filename.to_string());
        }

        if let Some(folder_id) = update.folder_id {
            if let Some(folder_id) = folder_id {
                self.ensure_folder(folder_id, user_id).await?;
            }
            separated.push("folder_id = ");
            separated.push_bind_unseparated(folder_id);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| BaketsuError::Database(e.to_string()))?;

        self.get_by_id(id).await
    }

    /// Mark an active file as deleted at `at`.
    pub async fn soft_delete(&self, id: i64, user_id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE files SET deleted_at = ?
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// All of the account's files, deleted ones included, as billing records.
    pub async fn list_storage_records(&self, user_id: i64) -> Result<Vec<StorageRecord>> {
        let files = sqlx::query_as::<_, StoredFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(files.iter().map(StoredFile::to_storage_record).collect())
    }

    /// Active file count, bytes and per-category usage.
    pub async fn storage_summary(&self, user_id: i64) -> Result<StorageSummary> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT filename, file_size FROM files WHERE user_id = ? AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        let mut categories: Vec<CategoryUsage> = FileCategory::ALL
            .into_iter()
            .map(|category| CategoryUsage {
                category,
                files: 0,
                bytes: 0,
            })
            .collect();

        let overflow =
            || BaketsuError::Validation("stored bytes exceed the countable total".to_string());
        let mut total_bytes: i64 = 0;
        for (filename, size) in &rows {
            total_bytes = total_bytes.checked_add(*size).ok_or_else(overflow)?;
            let category = FileCategory::from_filename(filename);
            if let Some(usage) = categories.iter_mut().find(|u| u.category == category) {
                usage.files += 1;
                usage.bytes = usage.bytes.checked_add(*size).ok_or_else(overflow)?;
            }
        }

        categories.retain(|u| u.files > 0);
        // Stable sort keeps display order for equal sizes
        categories.sort_by(|a, b| b.bytes.cmp(&a.bytes));

        Ok(StorageSummary {
            total_files: rows.len() as i64,
            total_bytes,
            categories,
        })
    }

    async fn ensure_folder(&self, folder_id: i64, user_id: i64) -> Result<()> {
        FolderRepository::new(self.pool)
            .get_for_user(folder_id, user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| BaketsuError::NotFound("folder".to_string()))
    }
}

fn validate_filename(filename: &str) -> Result<&str> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(BaketsuError::Validation(
            "filename must not be empty".to_string(),
        ));
    }
    if filename.chars().count() > MAX_FILENAME_LENGTH {
        return Err(BaketsuError::Validation(format!(
            "filename must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(BaketsuError::Validation(
            "filename must not contain path separators".to_string(),
        ));
    }
    Ok(filename)
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::NewFolder;
    use crate::Database;
    use chrono::TimeZone;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_category_from_filename() {
        assert_eq!(FileCategory::from_filename("cat.JPG"), FileCategory::Images);
        assert_eq!(FileCategory::from_filename("clip.mkv"), FileCategory::Videos);
        assert_eq!(FileCategory::from_filename("report.pdf"), FileCategory::Documents);
        assert_eq!(FileCategory::from_filename("song.flac"), FileCategory::Audio);
        assert_eq!(FileCategory::from_filename("data.bin"), FileCategory::Others);
        assert_eq!(FileCategory::from_filename("Makefile"), FileCategory::Others);
        assert_eq!("audio".parse::<FileCategory>().unwrap(), FileCategory::Audio);
    }

    #[tokio::test]
    async fn test_create_file() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let file = repo
            .create(&NewFile::new(1, "photo.png", 2048).with_uploaded_at(at(1)))
            .await
            .unwrap();

        assert_eq!(file.filename, "photo.png");
        assert_eq!(file.file_size, 2048);
        assert_eq!(file.uploaded_at, at(1));
        assert!(file.file_key.starts_with("users/1/"));
        assert!(file.file_key.ends_with("-photo.png"));
        assert!(!file.is_deleted());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let result = repo.create(&NewFile::new(1, "empty.txt", 0)).await;
        assert!(matches!(result, Err(BaketsuError::Validation(_))));

        let result = repo.create(&NewFile::new(1, "  ", 10)).await;
        assert!(matches!(result, Err(BaketsuError::Validation(_))));

        let result = repo.create(&NewFile::new(1, "a/b.txt", 10)).await;
        assert!(matches!(result, Err(BaketsuError::Validation(_))));

        let result = repo.create(&NewFile::new(1, "x.txt", 10).with_folder(42)).await;
        assert!(matches!(result, Err(BaketsuError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());
        let folder = FolderRepository::new(db.pool())
            .create(&NewFolder::new(1, "Pictures"))
            .await
            .unwrap();

        repo.create(
            &NewFile::new(1, "beach.jpg", 300)
                .with_folder(folder.id)
                .with_uploaded_at(at(1)),
        )
        .await
        .unwrap();
        repo.create(
            &NewFile::new(1, "Alps.jpg", 100)
                .with_folder(folder.id)
                .with_uploaded_at(at(2)),
        )
        .await
        .unwrap();
        repo.create(&NewFile::new(1, "notes.txt", 200).with_uploaded_at(at(3)))
            .await
            .unwrap();
        repo.create(&NewFile::new(2, "foreign.jpg", 1).with_uploaded_at(at(4)))
            .await
            .unwrap();

        // Newest first by default
        let all = repo.list(1, &FileQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["notes.txt", "Alps.jpg", "beach.jpg"]);

        let in_folder = repo
            .list(
                1,
                &FileQuery {
                    scope: FolderScope::Folder(folder.id),
                    sort: FileSort::Name,
                    descending: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<_> = in_folder.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["Alps.jpg", "beach.jpg"]);

        let root = repo
            .list(
                1,
                &FileQuery {
                    scope: FolderScope::Root,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(root.len(), 1);

        let by_size = repo
            .list(
                1,
                &FileQuery {
                    sort: FileSort::Size,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_size[0].filename, "beach.jpg");

        let searched = repo
            .list(
                1,
                &FileQuery {
                    search: Some("ALP".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].filename, "Alps.jpg");
    }

    #[tokio::test]
    async fn test_search_escapes_wildcards() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        repo.create(&NewFile::new(1, "100%_done.txt", 1)).await.unwrap();
        repo.create(&NewFile::new(1, "100x done.txt", 1)).await.unwrap();

        let query = FileQuery {
            search: Some("0%_".to_string()),
            ..Default::default()
        };
        let files = repo.list(1, &query).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "100%_done.txt");
    }

    #[tokio::test]
    async fn test_rename_and_move() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());
        let folders = FolderRepository::new(db.pool());
        let mine = folders.create(&NewFolder::new(1, "Mine")).await.unwrap();
        let theirs = folders.create(&NewFolder::new(2, "Theirs")).await.unwrap();

        let file = repo.create(&NewFile::new(1, "draft.txt", 10)).await.unwrap();

        let updated = repo
            .update(
                file.id,
                1,
                &FileUpdate::new().filename("final.txt").folder_id(Some(mine.id)),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.filename, "final.txt");
        assert_eq!(updated.folder_id, Some(mine.id));

        let result = repo
            .update(file.id, 1, &FileUpdate::new().folder_id(Some(theirs.id)))
            .await;
        assert!(matches!(result, Err(BaketsuError::NotFound(_))));

        let moved = repo
            .update(file.id, 1, &FileUpdate::new().folder_id(None))
            .await
            .unwrap()
            .unwrap();
        assert!(moved.folder_id.is_none());

        // Other accounts cannot touch the file
        let other = repo
            .update(file.id, 2, &FileUpdate::new().filename("x.txt"))
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_billing_record() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let file = repo
            .create(&NewFile::new(1, "video.mp4", 500).with_uploaded_at(at(1)))
            .await
            .unwrap();

        assert!(!repo.soft_delete(file.id, 2, at(5)).await.unwrap());
        assert!(repo.soft_delete(file.id, 1, at(5)).await.unwrap());
        assert!(!repo.soft_delete(file.id, 1, at(6)).await.unwrap());

        assert!(repo.get_for_user(file.id, 1).await.unwrap().is_none());
        assert!(repo.list(1, &FileQuery::default()).await.unwrap().is_empty());

        let records = repo.list_storage_records(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].created_at, at(1));
        assert_eq!(records[0].deleted_at, Some(at(5)));
    }

    #[tokio::test]
    async fn test_storage_summary() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        repo.create(&NewFile::new(1, "a.png", 100)).await.unwrap();
        repo.create(&NewFile::new(1, "b.jpg", 50)).await.unwrap();
        repo.create(&NewFile::new(1, "c.mp4", 1000)).await.unwrap();
        let gone = repo.create(&NewFile::new(1, "d.pdf", 70)).await.unwrap();
        repo.soft_delete(gone.id, 1, Utc::now()).await.unwrap();

        let summary = repo.storage_summary(1).await.unwrap();
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.total_bytes, 1150);
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories[0].category, FileCategory::Videos);
        assert_eq!(summary.categories[1].category, FileCategory::Images);
        assert_eq!(summary.categories[1].files, 2);

        let empty = repo.storage_summary(9).await.unwrap();
        assert_eq!(empty.total_files, 0);
        assert!(empty.categories.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_file() {
        let db = setup_db().await;
        let repo = FileRepository::new(db.pool());

        let result = repo.create(&NewFile::new(1, "huge.bin", i64::MAX)).await;
        assert!(matches!(result, Err(BaketsuError::Validation(_))));

        let result = repo.create(&NewFile::new(1, "limit.bin", MAX_FILE_SIZE)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_storage_summary_rejects_overflowing_total() {
        let db = setup_db().await;
        for name in ["a.bin", "b.bin"] {
            sqlx::query(
                "INSERT INTO files (user_id, filename, file_key, file_size, uploaded_at)
                 VALUES (1, ?, ?, ?, ?)",
            )
            .bind(name)
            .bind(name)
            .bind(i64::MAX)
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();
        }

        let result = FileRepository::new(db.pool()).storage_summary(1).await;
        assert!(matches!(result, Err(BaketsuError::Validation(_))));
    }
}
