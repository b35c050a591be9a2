//! Generated-app archive routes under `/api/storage`.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    Extension, Json,
};

use super::auth::AuthUser;
use super::error::{ApiResult, AppError};
use super::state::AppState;
use super::types::*;
use crate::storage::{
    file_name_of, project_folder, AppZips, ExistingPaths, GeneratedAppCode, GeneratedAppUploads, ZIP_CONTENT_TYPE,
};

/// Text fields and zip parts of a storage form.
#[derive(Debug, Default)]
struct ZipForm {
    project_id: Option<String>,
    frontend_file_path: Option<String>,
    backend_file_path: Option<String>,
    frontend: Option<Vec<u8>>,
    backend: Option<Vec<u8>>,
}

impl ZipForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = ZipForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "projectId" | "frontendFilePath" | "backendFilePath" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(format!("Invalid form field {}: {}", name, e)))?;
                    let value = Some(value).filter(|v| !v.trim().is_empty());
                    match name.as_str() {
                        "projectId" => form.project_id = value,
                        "frontendFilePath" => form.frontend_file_path = value,
                        _ => form.backend_file_path = value,
                    }
                }
                "frontend" | "backend" => {
                    let label = if name == "frontend" { "Frontend" } else { "Backend" };
                    if field.content_type() != Some(ZIP_CONTENT_TYPE) {
                        return Err(AppError::bad_request(format!("{} file must be a zip file", label)));
                    }
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(format!("Invalid {} upload: {}", name, e)))?
                        .to_vec();
                    if name == "frontend" {
                        form.frontend = Some(bytes);
                    } else {
                        form.backend = Some(bytes);
                    }
                }
                other => tracing::debug!("Ignoring form field {}", other),
            }
        }
        Ok(form)
    }

    fn require_zip(&self) -> ApiResult<()> {
        if self.frontend.is_none() && self.backend.is_none() {
            return Err(AppError::bad_request(
                "At least one zip file (frontend or backend) is required",
            ));
        }
        Ok(())
    }
}

fn require_owned(user: &AuthUser, path: &str) -> ApiResult<()> {
    if user.owns_path(path) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.user_id, path, "Storage path outside caller namespace");
        Err(AppError::forbidden("Access to this file is not allowed"))
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Json<Success<GeneratedAppUploads>>> {
    let form = ZipForm::read(multipart).await?;
    let project_id = form
        .project_id
        .clone()
        .ok_or_else(|| AppError::bad_request("Missing projectId"))?;
    form.require_zip()?;

    let zips = AppZips {
        frontend: form.frontend,
        backend: form.backend,
    };
    let uploads = state.store.upload_generated_app_zips(&zips, &user.user_id, &project_id)?;
    Ok(Json(Success::new(uploads)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Success<ListResponse>>> {
    let project_id = query
        .project_id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing projectId parameter"))?;

    let files: Vec<StoredFile> = state
        .store
        .list_project_zips(&user.user_id, &project_id)?
        .into_iter()
        .map(|file_path| StoredFile {
            file_name: file_name_of(&file_path),
            download_url: state.store.download_url_for(&file_path),
            file_path,
        })
        .collect();

    Ok(Json(Success::new(ListResponse {
        project_id,
        count: files.len(),
        files,
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Json<Success<UpdateZipsResponse>>> {
    let form = ZipForm::read(multipart).await?;
    form.require_zip()?;

    let mut response = UpdateZipsResponse {
        updated_at: chrono::Utc::now().to_rfc3339(),
        ..Default::default()
    };
    if let (Some(zip), Some(path)) = (&form.frontend, &form.frontend_file_path) {
        require_owned(&user, path)?;
        response.frontend = Some(state.store.update_zip(zip, path)?);
    }
    if let (Some(zip), Some(path)) = (&form.backend, &form.backend_file_path) {
        require_owned(&user, path)?;
        response.backend = Some(state.store.update_zip(zip, path)?);
    }
    Ok(Json(Success::new(response)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<DeleteRequest>,
) -> ApiResult<Json<DeleteResponse>> {
    if req.file_paths.is_empty() {
        return Err(AppError::bad_request("filePaths array is required and must not be empty"));
    }
    for path in req.file_paths.iter() {
        require_owned(&user, path)?;
    }

    let deleted_count = state.store.delete_multiple(&req.file_paths)?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Successfully deleted {} file(s)", deleted_count),
        deleted_count,
    }))
}

pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    require_owned(&user, &path)?;
    let (meta, data) = state.store.read(&path)?;

    Response::builder()
        .header(header::CONTENT_TYPE, meta.content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name_of(&path)),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::internal(e.to_string()))
}

/// Zip flat path maps server-side and upload them, or overwrite the
/// archives at `frontendFilePath` / `backendFilePath` when given.
pub async fn generate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<GenerateZipsRequest>,
) -> ApiResult<Json<Success<GeneratedAppUploads>>> {
    let project_id = req
        .project_id
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing projectId"))?;

    let code = GeneratedAppCode::from_file_maps(req.frontend.as_ref(), req.backend.as_ref());
    let existing = ExistingPaths {
        frontend_file_path: req.frontend_file_path,
        backend_file_path: req.backend_file_path,
    };
    let uploads = if existing.frontend_file_path.is_some() || existing.backend_file_path.is_some() {
        for path in [&existing.frontend_file_path, &existing.backend_file_path].into_iter().flatten() {
            require_owned(&user, path)?;
        }
        state.store.update_app_zips(&code, &existing)?
    } else {
        state.store.generate_and_upload_app_zips(&code, &user.user_id, &project_id)?
    };
    tracing::info!(
        user_id = %user.user_id,
        project_id = %project_id,
        folder = %project_folder(&user.user_id, &project_id),
        "Generated app archives uploaded"
    );
    Ok(Json(Success::new(uploads)))
}
