pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    // An empty origin list means a permissive dev setup.
    let allow_origin = if state.settings.app.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            state
                .settings
                .app
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse().ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let team_routes = Router::new()
        .route("/", get(routes::team::list))
        .route("/", post(routes::team::create))
        .route("/join", post(routes::team::join))
        .route("/{team_id}", get(routes::team::get))
        .route("/{team_id}/leave", post(routes::team::leave))
        .route(
            "/{team_id}/invite/regenerate",
            post(routes::team::regenerate_invite),
        )
        .route("/{team_id}/channel", get(routes::team::list_channels))
        .route("/{team_id}/channel", post(routes::team::create_channel));

    let channel_routes = Router::new()
        .route("/{channel_id}/join", post(routes::channel::join))
        .route("/{channel_id}/leave", post(routes::channel::leave))
        .route("/{channel_id}/message", get(routes::channel::history))
        .route("/{channel_id}/message", post(routes::channel::post_message));

    let message_routes = Router::new()
        .route("/{message_id}", put(routes::message::update))
        .route("/{message_id}", delete(routes::message::delete))
        .route("/{message_id}/reaction", post(routes::message::toggle_reaction));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/team", team_routes)
        .nest("/channel", channel_routes)
        .nest("/message", message_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
