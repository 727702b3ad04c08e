pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{MemorySheetStore, PgSheetStore, SheetStore, Sheets};
use crate::services::auth::{default_users, TokenRegistry};
use crate::services::storage::{MemoryObjectStore, ObjectStore, S3Storage};
use crate::services::study::SessionRegistry;

/// Exam paper scans can be large
const UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sheets: Sheets,
    pub storage: Arc<dyn ObjectStore>,
    pub tokens: Arc<TokenRegistry>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn SheetStore>, storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            sheets: Sheets::new(store),
            storage,
            tokens: Arc::new(TokenRegistry::new()),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// State backed entirely by in-process stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemorySheetStore::new()),
            Arc::new(MemoryObjectStore::new()),
        )
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Auth routes
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // Account routes
        .route(
            "/api/users",
            get(routes::users::list).post(routes::users::create),
        )
        .route(
            "/api/users/:id",
            put(routes::users::update).delete(routes::users::delete),
        )
        // Vocabulary catalog routes
        .route("/api/vocab/import", post(routes::vocab::import))
        .route(
            "/api/vocab/import/file",
            post(routes::vocab::import_file).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/vocab/books", get(routes::vocab::books))
        .route(
            "/api/vocab/books/:book",
            put(routes::vocab::rename_book).delete(routes::vocab::delete_book),
        )
        .route("/api/vocab/books/:book/days", get(routes::vocab::days))
        .route("/api/vocab/books/:book/words", get(routes::vocab::words))
        // Study session routes
        .route("/api/study/sessions", post(routes::study::start))
        .route(
            "/api/study/session",
            get(routes::study::current).delete(routes::study::abandon),
        )
        .route("/api/study/session/reveal", post(routes::study::reveal))
        .route("/api/study/session/options", post(routes::study::options))
        .route("/api/study/session/answer", post(routes::study::answer))
        .route("/api/study/session/give-up", post(routes::study::give_up))
        .route("/api/study/session/copy", post(routes::study::copy))
        .route("/api/study/session/finish", post(routes::study::finish))
        // Remediation routes
        .route("/api/study/wrongs", get(routes::study::practice_wrongs))
        .route("/api/study/wrongs/sheet", get(routes::study::wrong_sheet))
        .route("/api/study/mastered", get(routes::study::mastered))
        .route("/api/study/test-wrongs", get(routes::study::test_wrongs))
        .route(
            "/api/study/test-wrongs/:word",
            delete(routes::study::delete_test_wrong),
        )
        .route("/api/study/test-log", get(routes::study::test_log))
        // Learning log routes
        .route(
            "/api/logs",
            get(routes::logs::list)
                .post(routes::logs::add)
                .put(routes::logs::replace),
        )
        .route("/api/logs/calendar", get(routes::logs::calendar))
        // Score routes
        .route(
            "/api/scores",
            get(routes::scores::list)
                .post(routes::scores::add)
                .put(routes::scores::replace),
        )
        .route("/api/scores/classes", get(routes::scores::classes))
        .route("/api/scores/averages", get(routes::scores::averages))
        // Exam routes
        .route("/api/exams", get(routes::exams::list))
        .route("/api/exams/:exam", delete(routes::exams::delete))
        .route(
            "/api/exams/:exam/images",
            post(routes::exams::upload_images).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/exams/:exam/questions", get(routes::exams::questions))
        .route("/api/exams/:exam/videos", put(routes::exams::update_videos))
        .route(
            "/api/exams/:exam/questions/:no/image",
            get(routes::exams::image)
                .put(routes::exams::replace_image)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        // Mistake note routes
        .route(
            "/api/notes",
            get(routes::notes::list).post(routes::notes::add),
        )
        .route("/api/notes/:exam/:no", delete(routes::notes::delete))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(routes::auth::login))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn SheetStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = PgSheetStore::connect(url).await?;

            tracing::info!("Running migrations...");
            db.run_migrations().await?;
            Arc::new(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, tables are kept in memory");
            Arc::new(MemorySheetStore::new())
        }
    };

    let storage: Arc<dyn ObjectStore> = match &config.s3 {
        Some(s3) => {
            tracing::info!(bucket = %s3.bucket, "Initializing S3 storage...");
            Arc::new(S3Storage::new(s3))
        }
        None => {
            tracing::warn!("S3_BUCKET not set, exam images are kept in memory");
            Arc::new(MemoryObjectStore::new())
        }
    };

    let state = AppState::new(store, storage);

    if config.seed_default_users && state.sheets.seed_users(default_users()).await? {
        tracing::info!("Seeded default accounts");
    }

    let app = build_router(state);
    let addr = config.addr();

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
