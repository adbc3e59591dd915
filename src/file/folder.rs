//! Folder types and repository for Baketsu file management.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::{MAX_FOLDER_DEPTH, MAX_FOLDER_NAME_LENGTH};
use crate::{BaketsuError, Result};

/// A folder owned by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Owning account.
    pub user_id: i64,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Owning account.
    pub user_id: i64,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<i64>,
}

impl NewFolder {
    /// Create a new root folder.
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    ///
    /// The name must be unique under the parent, and the parent must belong
    /// to the same account.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        let name = folder.name.trim();
        if name.is_empty() {
            return Err(BaketsuError::Validation(
                "folder name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_FOLDER_NAME_LENGTH {
            return Err(BaketsuError::Validation(format!(
                "folder name must be at most {MAX_FOLDER_NAME_LENGTH} characters"
            )));
        }

        if let Some(parent_id) = folder.parent_id {
            self.get_for_user(parent_id, folder.user_id)
                .await?
                .ok_or_else(|| BaketsuError::NotFound("parent folder".to_string()))?;

            if self.get_depth(parent_id).await? + 1 >= MAX_FOLDER_DEPTH {
                return Err(BaketsuError::Validation(format!(
                    "folders can be nested at most {MAX_FOLDER_DEPTH} levels deep"
                )));
            }
        }

        let result = sqlx::query(
            "INSERT INTO folders (user_id, name, parent_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(folder.user_id)
        .bind(name)
        .bind(folder.parent_id)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BaketsuError::Conflict(format!("folder '{name}' already exists here"))
            }
            e => BaketsuError::Database(e.to_string()),
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| BaketsuError::NotFound("folder".to_string()))
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, user_id, name, parent_id, created_at FROM folders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// Get a folder by ID if it belongs to the account.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(
            "SELECT id, user_id, name, parent_id, created_at
             FROM folders WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(folder)
    }

    /// List the account's root folders (parent_id is NULL).
    pub async fn list_root(&self, user_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, user_id, name, parent_id, created_at
             FROM folders WHERE user_id = ? AND parent_id IS NULL ORDER BY name, id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List child folders of a parent folder.
    pub async fn list_by_parent(&self, user_id: i64, parent_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            "SELECT id, user_id, name, parent_id, created_at
             FROM folders WHERE user_id = ? AND parent_id = ? ORDER BY name, id",
        )
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// Get the depth of a folder (0 for root).
    pub async fn get_depth(&self, id: i64) -> Result<usize> {
        let mut depth = 0;
        let mut current_id = Some(id);

        while let Some(folder_id) = current_id {
            match self.get_by_id(folder_id).await? {
                Some(f) => {
                    current_id = f.parent_id;
                    if current_id.is_some() {
                        depth += 1;
                    }
                }
                None => break,
            }
        }

        Ok(depth)
    }

    /// Get the path from root to a folder.
    pub async fn get_path(&self, id: i64) -> Result<Vec<Folder>> {
        let mut path = Vec::new();
        let mut current_id = Some(id);

        while let Some(folder_id) = current_id {
            if let Some(folder) = self.get_by_id(folder_id).await? {
                current_id = folder.parent_id;
                path.push(folder);
            } else {
                break;
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Count active files in a folder.
    pub async fn count_files(&self, folder_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM files WHERE folder_id = ? AND deleted_at IS NULL",
        )
        .bind(folder_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| BaketsuError::Database(e.to_string()))?;

        Ok(count.0)
    }
}
