use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use persona_hub::config::AppRegistry;
use persona_hub::provider::CompletionService;
use persona_hub::routes::app_routes::{get_app_handler, list_apps_handler};
use persona_hub::routes::chat_routes::chat_handler;
use persona_hub::routes::conversation_routes::{
    clear_conversations_handler, create_conversation_handler, delete_conversation_handler,
    get_active_handler, list_conversations_handler, load_conversation_handler,
    save_conversation_handler, set_active_handler,
};
use persona_hub::routes::AppState;
use persona_hub::service::chat_service::ChatService;
use persona_hub::store::conversation_store::ConversationStore;
use persona_hub::store::kv::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "persona_hub=debug,tower_http=debug".into()),
        )
        .init();

    // ── App registry (one scan, fail loud on malformed configs) ───────────────
    let apps_dir =
        PathBuf::from(std::env::var("APPS_DIR").unwrap_or_else(|_| "apps".to_string()));
    let registry = Arc::new(AppRegistry::scan(&apps_dir)?);

    // ── Storage ───────────────────────────────────────────────────────────────
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://conversations.db?mode=rwc".to_string());
    let kv = SqliteStore::connect(&database_url).await?;
    let conversations = ConversationStore::new(Arc::new(kv));

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let completion = CompletionService::from_env(&apps_dir);
    let chat = ChatService::new(registry.clone(), completion);
    let state = AppState { registry, chat, conversations };

    // ── CORS for the bundled frontend ─────────────────────────────────────────
    let frontend_url = std::env::var("FRONTEND_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let cors = CorsLayer::new()
        .allow_origin(frontend_url.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    // ── Router ────────────────────────────────────────────────────────────────
    let app = Router::new()
        .route("/api/apps", get(list_apps_handler))
        .route("/api/apps/{app_type}", get(get_app_handler))
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/apps/{app_type}/conversations",
            get(list_conversations_handler)
                .post(create_conversation_handler)
                .delete(clear_conversations_handler),
        )
        .route(
            "/api/apps/{app_type}/conversations/{id}",
            get(load_conversation_handler)
                .put(save_conversation_handler)
                .delete(delete_conversation_handler),
        )
        .route(
            "/api/apps/{app_type}/active",
            get(get_active_handler).put(set_active_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // ── Listen ────────────────────────────────────────────────────────────────
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
