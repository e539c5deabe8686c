use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::validated::{AppJson, AppQuery};
use crate::models::server::*;
use crate::services::server::ServerService;
use crate::services::server_list;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Servers",
    operation_id = "listServers",
    summary = "List servers",
    description = "Returns servers in ascending id order. Filters apply in a fixed order: \
        `category`, `by_user`, `with_num_members`, `qty`, then `by_serverid`. \
        `by_user` and `by_serverid` require authentication. A `by_serverid` outside the \
        `qty` window is reported as not found.",
    params(ServerListQuery),
    responses(
        (status = 200, description = "Matching servers", body = Vec<ServerListEntry>),
        (status = 400, description = "Invalid or unknown `by_serverid` (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Authentication required (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Non-numeric `qty` (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security((), ("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(authenticated = auth_user.is_some()))]
pub async fn list_servers(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ServerListQuery>,
) -> Result<Json<Vec<ServerListEntry>>, AppError> {
    let servers = server_list::list_servers(&state.db, &query, auth_user.as_ref()).await?;
    Ok(Json(servers))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Servers",
    operation_id = "createServer",
    summary = "Create a server",
    description = "Creates a server owned by the caller in an existing category.",
    request_body = CreateServerRequest,
    responses(
        (status = 201, description = "Server created", body = ServerResponse),
        (status = 400, description = "Validation error or unknown category (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_server(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateServerRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_server(&payload)?;

    let model = ServerService::new(&state.db)
        .create(auth_user.user_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(ServerResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Servers",
    operation_id = "deleteServer",
    summary = "Delete a server",
    description = "Deletes the server with its channels and memberships. Owner or admin only.",
    params(("id" = i32, Path, description = "Server ID")),
    responses(
        (status = 204, description = "Server deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Server not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_server(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ServerService::new(&state.db)
        .delete(id, |server| auth_user.require_owner_or_admin(server.owner_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Servers",
    operation_id = "joinServer",
    summary = "Join a server",
    description = "Adds the caller to the server's members. Joining again has no effect.",
    params(("id" = i32, Path, description = "Server ID")),
    responses(
        (status = 204, description = "Caller is a member"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Server not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn join_server(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ServerService::new(&state.db)
        .join(id, auth_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/members",
    tag = "Servers",
    operation_id = "leaveServer",
    summary = "Leave a server",
    params(("id" = i32, Path, description = "Server ID")),
    responses(
        (status = 204, description = "Caller is not a member"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Server not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn leave_server(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    ServerService::new(&state.db)
        .leave(id, auth_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
