//! Lott Fix & Parts work-order intake service
//!
//! Runs the front-desk API (order form, PDF receipt, local history) and the
//! remote intake endpoint that records orders in a spreadsheet and mails the
//! client, backed by SQLite.

mod api;
mod assets;
mod config;
mod data_url;
mod db;
mod errors;
mod form;
mod history;
mod intake;
mod models;
mod render;
mod sequence;
mod submission;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{LocalStore, Repository};
use form::{FormSettings, FormState};
use intake::{GoogleSheetsLedger, IntakeService, Mailer, SheetLedger, SmtpMailer};
use render::PdfRenderer;
use submission::{HttpIntakeTransport, IntakeTransport, Orchestrator};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LocalStore>,
    /// The order currently open at the desk
    pub form: Arc<Mutex<Option<FormState>>>,
    pub orchestrator: Arc<Orchestrator>,
    pub intake: Arc<IntakeService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the desk and intake services around `store` and the outbound adapters.
    pub fn new(
        config: Config,
        store: Arc<dyn LocalStore>,
        transport: Option<Arc<dyn IntakeTransport>>,
        ledger: Option<Arc<dyn SheetLedger>>,
        mailer: Option<Arc<dyn Mailer>>,
        default_logo: Option<String>,
    ) -> Self {
        let settings = FormSettings {
            required: config.required_fields.clone(),
            locations: config.business.locations.clone(),
            utc_offset_minutes: config.utc_offset_minutes,
        };

        let orchestrator = Orchestrator::new(
            store.clone(),
            Arc::new(PdfRenderer::new(config.business.clone())),
            transport,
            settings,
            config.intake_timeout,
        )
        .with_default_logo(default_logo);

        let intake = IntakeService::new(
            ledger,
            mailer,
            config.business.clone(),
            config.copy_to.clone(),
        );

        Self {
            store,
            form: Arc::new(Mutex::new(None)),
            orchestrator: Arc::new(orchestrator),
            intake: Arc::new(intake),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting {} intake service", config.business.name);
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store: Arc<dyn LocalStore> = Arc::new(Repository::new(pool));

    // Outbound adapters
    let transport: Option<Arc<dyn IntakeTransport>> = match &config.intake_url {
        Some(url) => {
            tracing::info!("Transmitting orders to {}", url);
            Some(Arc::new(HttpIntakeTransport::new(
                url.clone(),
                config.intake_timeout,
            )?))
        }
        None => {
            tracing::warn!("INTAKE_URL is empty. Orders are kept locally only");
            None
        }
    };

    let ledger: Option<Arc<dyn SheetLedger>> = match &config.sheets {
        Some(sheets) => Some(Arc::new(GoogleSheetsLedger::new(sheets.clone())?)),
        None => {
            tracing::warn!("Spreadsheet settings missing. /api/orden will reject orders");
            None
        }
    };

    let mailer: Option<Arc<dyn Mailer>> = match &config.smtp {
        Some(smtp) => Some(Arc::new(SmtpMailer::new(smtp)?)),
        None => {
            tracing::warn!("SMTP not configured. Client receipts will not be mailed");
            None
        }
    };

    let default_logo = match &config.logo_path {
        Some(path) => match assets::load_logo_file(path).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        },
        None => None,
    };

    // Create application state
    let bind_addr = config.bind_addr;
    let state = AppState::new(config, store, transport, ledger, mailer, default_logo);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Form
        .route("/form", get(api::get_form).put(api::update_form))
        .route("/form/new", post(api::new_form))
        .route("/form/submit", post(api::submit_form))
        // History
        .route("/history", get(api::list_history))
        .route("/orders/{order_number}/pdf", get(api::download_document))
        // Logo
        .route("/logo", put(api::put_logo))
        // Remote intake
        .route(
            "/orden",
            post(api::receive_order).fallback(api::method_not_allowed),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
