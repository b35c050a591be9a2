//! Object storage for generated app archives.
//!
//! Objects live in the `objects` table under the same namespace the hosted
//! bucket used: `users/{userId}/projects/{projectId}/generated-apps/`.

pub mod archive;

use serde::Serialize;
use thiserror::Error;

pub use archive::{
    create_directory_structure_from_files, create_generated_app_zips, create_zip_from_directory_structure,
    create_zip_from_files, flatten_directory_structure, AppZips, ArchiveError, GeneratedAppCode, ZipEntry,
};

use crate::db::{Database, DbError, ObjectMeta, PutObject};

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to upload zip file {file_name}: {source}")]
    Upload {
        file_name: String,
        #[source]
        source: DbError,
    },

    #[error("Failed to create zip files: {0}")]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(rename = "url")]
    pub download_url: String,
    pub file_path: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAppUploads {
    pub frontend: Option<UploadResult>,
    pub backend: Option<UploadResult>,
    pub uploaded_at: String,
}

/// Existing object paths to overwrite in [`ObjectStore::update_app_zips`].
#[derive(Debug, Clone, Default)]
pub struct ExistingPaths {
    pub frontend_file_path: Option<String>,
    pub backend_file_path: Option<String>,
}

pub fn user_prefix(user_id: &str) -> String {
    format!("users/{}/", user_id)
}

pub fn project_folder(user_id: &str, project_id: &str) -> String {
    format!("users/{}/projects/{}/generated-apps", user_id, project_id)
}

pub fn file_name_of(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("unknown.zip")
        .to_string()
}

#[derive(Clone)]
pub struct ObjectStore {
    db: Database,
    public_url: String,
}

impl ObjectStore {
    /// `public_url` is the externally reachable base of this server; download
    /// URLs point at its `/api/storage/download/` route.
    pub fn new(db: Database, public_url: impl Into<String>) -> Self {
        Self {
            db,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn download_url_for(&self, file_path: &str) -> String {
        format!("{}/api/storage/download/{}", self.public_url, file_path)
    }

    pub fn upload_zip(&self, content: &[u8], file_name: &str, folder_path: &str) -> Result<UploadResult, StorageError> {
        let file_path = format!("{}/{}", folder_path, file_name);
        tracing::info!(file_name, folder_path, file_path = %file_path, "Uploading zip file");

        self.db
            .put_object(&PutObject {
                path: &file_path,
                data: content,
                content_type: ZIP_CONTENT_TYPE,
                metadata: serde_json::json!({ "uploadedAt": chrono::Utc::now().to_rfc3339() }),
            })
            .map_err(|source| {
                tracing::error!(file_name, folder_path, "Error uploading zip file: {}", source);
                StorageError::Upload {
                    file_name: file_name.to_string(),
                    source,
                }
            })?;

        let download_url = self.download_url_for(&file_path);
        tracing::info!(file_name, download_url = %download_url, "Zip file uploaded");
        Ok(UploadResult {
            download_url,
            file_path,
            file_name: file_name.to_string(),
        })
    }

    /// Upload whichever of the two bundles is present as
    /// `frontend-<millis>.zip` / `backend-<millis>.zip`.
    pub fn upload_generated_app_zips(
        &self,
        zips: &AppZips,
        user_id: &str,
        project_id: &str,
    ) -> Result<GeneratedAppUploads, StorageError> {
        let folder = project_folder(user_id, project_id);
        tracing::info!(
            user_id,
            project_id,
            has_frontend = zips.frontend.is_some(),
            has_backend = zips.backend.is_some(),
            "Uploading generated app zips"
        );

        let mut uploads = GeneratedAppUploads {
            uploaded_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        if let Some(frontend) = &zips.frontend {
            let name = format!("frontend-{}.zip", chrono::Utc::now().timestamp_millis());
            uploads.frontend = Some(self.upload_zip(frontend, &name, &folder)?);
        }
        if let Some(backend) = &zips.backend {
            let name = format!("backend-{}.zip", chrono::Utc::now().timestamp_millis());
            uploads.backend = Some(self.upload_zip(backend, &name, &folder)?);
        }
        Ok(uploads)
    }

    /// Overwrite an existing object. Fails with `NotFound` when nothing is
    /// stored at `file_path`.
    pub fn update_zip(&self, content: &[u8], file_path: &str) -> Result<UploadResult, StorageError> {
        tracing::info!(file_path, "Updating zip file");
        if !self.db.object_exists(file_path)? {
            return Err(StorageError::NotFound(file_path.to_string()));
        }

        self.db.put_object(&PutObject {
            path: file_path,
            data: content,
            content_type: ZIP_CONTENT_TYPE,
            metadata: serde_json::json!({
                "uploadedAt": chrono::Utc::now().to_rfc3339(),
                "updated": "true",
            }),
        })?;

        Ok(UploadResult {
            download_url: self.download_url_for(file_path),
            file_path: file_path.to_string(),
            file_name: file_name_of(file_path),
        })
    }

    /// Delete one object. A missing object is skipped with a warning.
    pub fn delete_zip(&self, file_path: &str) -> Result<(), StorageError> {
        if self.db.delete_object(file_path)? {
            tracing::info!(file_path, "Zip file deleted");
        } else {
            tracing::warn!("File not found, skipping deletion: {}", file_path);
        }
        Ok(())
    }

    pub fn delete_multiple(&self, file_paths: &[String]) -> Result<usize, StorageError> {
        tracing::info!(count = file_paths.len(), "Deleting zip files");
        for path in file_paths {
            self.delete_zip(path)?;
        }
        Ok(file_paths.len())
    }

    pub fn get_download_url(&self, file_path: &str) -> Result<String, StorageError> {
        if !self.db.object_exists(file_path)? {
            return Err(StorageError::NotFound(file_path.to_string()));
        }
        Ok(self.download_url_for(file_path))
    }

    pub fn read(&self, file_path: &str) -> Result<(ObjectMeta, Vec<u8>), StorageError> {
        self.db
            .get_object(file_path)?
            .ok_or_else(|| StorageError::NotFound(file_path.to_string()))
    }

    /// Paths of every `.zip` stored for a project.
    pub fn list_project_zips(&self, user_id: &str, project_id: &str) -> Result<Vec<String>, StorageError> {
        let prefix = format!("{}/", project_folder(user_id, project_id));
        let paths: Vec<String> = self
            .db
            .list_objects(&prefix)?
            .into_iter()
            .map(|o| o.path)
            .filter(|p| p.ends_with(".zip"))
            .collect();
        tracing::debug!(user_id, project_id, count = paths.len(), "Listed project zip files");
        Ok(paths)
    }

    /// Zip generated code and upload it.
    pub fn generate_and_upload_app_zips(
        &self,
        code: &GeneratedAppCode,
        user_id: &str,
        project_id: &str,
    ) -> Result<GeneratedAppUploads, StorageError> {
        let zips = create_generated_app_zips(code)?;
        if zips.is_empty() {
            return Err(ArchiveError::Empty.into());
        }
        self.upload_generated_app_zips(&zips, user_id, project_id)
    }

    /// Zip generated code and overwrite previously uploaded bundles. Sides
    /// without an existing path are skipped.
    pub fn update_app_zips(
        &self,
        code: &GeneratedAppCode,
        existing: &ExistingPaths,
    ) -> Result<GeneratedAppUploads, StorageError> {
        let zips = create_generated_app_zips(code)?;
        let mut uploads = GeneratedAppUploads {
            uploaded_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        if let (Some(zip), Some(path)) = (&zips.frontend, &existing.frontend_file_path) {
            uploads.frontend = Some(self.update_zip(zip, path)?);
        }
        if let (Some(zip), Some(path)) = (&zips.backend, &existing.backend_file_path) {
            uploads.backend = Some(self.update_zip(zip, path)?);
        }
        Ok(uploads)
    }
}
