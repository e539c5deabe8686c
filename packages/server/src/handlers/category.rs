use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::StoragePath;
use sea_orm::{EntityTrait, QueryOrder};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::entity::category;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::validated::AppJson;
use crate::models::category::*;
use crate::models::shared::normalize_optional;
use crate::services::category::{CategoryDraft, CategoryService};
use crate::state::AppState;
use crate::utils::icon_path::category_icon_path;

/// Body limit for icon uploads: the file plus multipart framing.
pub fn icon_upload_body_limit(max_file_size: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max(usize::try_from(max_file_size).unwrap_or(usize::MAX).saturating_add(4096))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    responses(
        (status = 200, description = "Categories in id order", body = Vec<CategoryResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. Upload an icon afterwards with `PUT /categories/{id}/icon`.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_category(&payload)?;

    let model = CategoryService::new(&state.db, state.file_store.as_ref())
        .save(CategoryDraft {
            id: None,
            name: payload.name.trim().to_string(),
            description: normalize_optional(payload.description),
            icon: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Admin only. Omitted fields are left unchanged; `description: null` clears it.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_admin()?;
    validate_update_category(&payload)?;

    let svc = CategoryService::new(&state.db, state.file_store.as_ref());
    let mut draft = CategoryDraft::from(svc.find(id).await?);
    if let Some(name) = payload.name {
        draft.name = name.trim().to_string();
    }
    if let Some(description) = payload.description {
        draft.description = normalize_optional(description);
    }

    Ok(Json(CategoryResponse::from(svc.save(draft).await?)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Deletes every server in the category, with their channels and \
        memberships, and removes the stored icon.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    CategoryService::new(&state.db, state.file_store.as_ref())
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/icon",
    tag = "Categories",
    operation_id = "uploadCategoryIcon",
    summary = "Upload or replace a category icon",
    description = "Admin only. The `file` multipart field is stored at \
        `category/<id>/category_icon/<filename>`. A previous icon under a different name is deleted.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body(content_type = "multipart/form-data", description = "Icon file in the `file` field"),
    responses(
        (status = 200, description = "Icon stored", body = CategoryResponse),
        (status = 400, description = "Missing field, bad filename or file too large (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn upload_category_icon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_admin()?;

    let svc = CategoryService::new(&state.db, state.file_store.as_ref());
    let existing = svc.find(id).await?;
    let max_size = state.config.storage.max_file_size;

    let mut stored: Option<StoragePath> = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let path = category_icon_path(id, filename)?;

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        state.file_store.put(&path, &data).await?;
        stored = Some(path);
        break;
    }

    let path = stored.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let mut draft = CategoryDraft::from(existing);
    draft.icon = Some(path.to_string());
    Ok(Json(CategoryResponse::from(svc.save(draft).await?)))
}

#[utoipa::path(
    delete,
    path = "/{id}/icon",
    tag = "Categories",
    operation_id = "clearCategoryIcon",
    summary = "Remove a category icon",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Icon removed", body = CategoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn clear_category_icon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, AppError> {
    auth_user.require_admin()?;

    let svc = CategoryService::new(&state.db, state.file_store.as_ref());
    let mut draft = CategoryDraft::from(svc.find(id).await?);
    draft.icon = None;
    Ok(Json(CategoryResponse::from(svc.save(draft).await?)))
}

#[utoipa::path(
    get,
    path = "/{id}/icon",
    tag = "Categories",
    operation_id = "getCategoryIcon",
    summary = "Download a category icon",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Icon bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Category or icon not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_category_icon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let category = CategoryService::new(&state.db, state.file_store.as_ref())
        .find(id)
        .await?;
    let icon = category
        .icon
        .ok_or_else(|| AppError::NotFound("Category has no icon".into()))?;
    let path = StoragePath::parse(&icon)?;

    let size = state.file_store.size(&path).await?;
    let reader = state.file_store.get_stream(&path).await?;
    let content_type = mime_guess::from_path(path.file_name()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
