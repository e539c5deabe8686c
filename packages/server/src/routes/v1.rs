use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{auth, category, channel, server};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/categories", category_routes(config))
        .nest("/servers", server_routes())
        .nest("/channels", channel_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn category_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let icon = OpenApiRouter::new()
        .routes(routes!(
            category::upload_category_icon,
            category::clear_category_icon,
            category::get_category_icon
        ))
        .layer(category::icon_upload_body_limit(
            config.storage.max_file_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(category::list_categories, category::create_category))
        .routes(routes!(category::update_category, category::delete_category))
        .merge(icon)
}

fn server_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(server::list_servers, server::create_server))
        .routes(routes!(server::delete_server))
        .routes(routes!(server::join_server, server::leave_server))
        .routes(routes!(channel::list_channels, channel::create_channel))
}

fn channel_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(channel::update_channel, channel::delete_channel))
}
