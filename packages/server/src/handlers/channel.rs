use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::{ConnectionTrait, ModelTrait};
use tracing::instrument;

use crate::entity::channel;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::validated::AppJson;
use crate::models::channel::*;
use crate::services::channel::{ChannelDraft, ChannelService};
use crate::services::server::ServerService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/channels",
    tag = "Channels",
    operation_id = "listChannels",
    summary = "List the channels of a server",
    params(("id" = i32, Path, description = "Server ID")),
    responses(
        (status = 200, description = "Channels in id order", body = Vec<ChannelResponse>),
        (status = 404, description = "Server not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_channels(
    State(state): State<AppState>,
    Path(server_id): Path<i32>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let channels = ServerService::new(&state.db).channels(server_id).await?;
    Ok(Json(channels.into_iter().map(ChannelResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/channels",
    tag = "Channels",
    operation_id = "createChannel",
    summary = "Create a channel in a server",
    description = "The server owner and its members may create channels. The name is stored lowercase.",
    params(("id" = i32, Path, description = "Server ID")),
    request_body = CreateChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = ChannelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Server not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, name = %payload.name))]
pub async fn create_channel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(server_id): Path<i32>,
    AppJson(payload): AppJson<CreateChannelRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_channel(&payload)?;

    let servers = ServerService::new(&state.db);
    let server = servers.find(server_id).await?;
    if server.owner_id != auth_user.user_id
        && !servers.is_member(server_id, auth_user.user_id).await?
    {
        return Err(AppError::PermissionDenied);
    }

    let model = ChannelService::new(&state.db)
        .save(ChannelDraft {
            id: None,
            name: payload.name,
            topic: payload.topic,
            owner_id: auth_user.user_id,
            server_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ChannelResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Channels",
    operation_id = "updateChannel",
    summary = "Rename a channel or change its topic",
    description = "Allowed for the channel owner, the server owner and admins.",
    params(("id" = i32, Path, description = "Channel ID")),
    request_body = UpdateChannelRequest,
    responses(
        (status = 200, description = "Channel updated", body = ChannelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_channel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateChannelRequest>,
) -> Result<Json<ChannelResponse>, AppError> {
    validate_update_channel(&payload)?;

    let channels = ChannelService::new(&state.db);
    let existing = channels.find(id).await?;
    require_channel_authority(&state.db, &auth_user, &existing).await?;

    let mut draft = ChannelDraft::from(existing);
    if let Some(name) = payload.name {
        draft.name = name;
    }
    if let Some(topic) = payload.topic {
        draft.topic = topic;
    }

    let model = channels.save(draft).await?;
    Ok(Json(ChannelResponse::from(model)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Channels",
    operation_id = "deleteChannel",
    summary = "Delete a channel",
    params(("id" = i32, Path, description = "Channel ID")),
    responses(
        (status = 204, description = "Channel deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_channel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let existing = ChannelService::new(&state.db).find(id).await?;
    require_channel_authority(&state.db, &auth_user, &existing).await?;
    existing.delete(&state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Channel owner, owner of the enclosing server, or admin.
async fn require_channel_authority<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    channel: &channel::Model,
) -> Result<(), AppError> {
    if auth_user.is_admin || channel.owner_id == auth_user.user_id {
        return Ok(());
    }
    let server = ServerService::new(db).find(channel.server_id).await?;
    auth_user.require_owner_or_admin(server.owner_id)
}
