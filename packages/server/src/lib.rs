#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime oracle dashboard.
//!
//! Loads the incident and station tables once, partitions the incidents
//! into hotspots at startup, and serves hotspots, on-demand risk
//! projections, GeoJSON map overlays, and the chat assistant over a JSON
//! API. All state is read-only after startup; per-user context (the date
//! being discussed, chat history) travels in each request.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use chrono::NaiveDate;
use crime_oracle_assistant::Assistant;
use crime_oracle_config::OracleConfig;
use crime_oracle_dataset::Dataset;
use crime_oracle_hotspot::{HotspotError, Partition};
use crime_oracle_projection::ProjectionError;
use crime_oracle_projection_models::ProjectionReport;

/// Shared application state.
pub struct AppState {
    /// Loaded configuration.
    pub config: OracleConfig,
    /// Incident and station tables.
    pub dataset: Dataset,
    /// Hotspots computed from `dataset` at startup.
    pub partition: Partition,
    /// Remote assistant, when one is configured.
    pub assistant: Option<Arc<dyn Assistant>>,
}

impl AppState {
    /// Partitions the dataset and assembles the state.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError`] if the incidents cannot be partitioned with
    /// the configured settings.
    pub fn build(
        config: OracleConfig,
        dataset: Dataset,
        assistant: Option<Arc<dyn Assistant>>,
    ) -> Result<Self, HotspotError> {
        let partition = crime_oracle_hotspot::partition(&dataset.incidents, &config.partition)?;
        Ok(Self {
            config,
            dataset,
            partition,
            assistant,
        })
    }

    /// Projects the hotspots onto `target_date`, using today as the
    /// reference date for the look-back guard.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the date or configuration is rejected.
    pub fn project(&self, target_date: NaiveDate) -> Result<ProjectionReport, ProjectionError> {
        crime_oracle_projection::project_from_today(
            &self.partition.hotspots,
            target_date,
            &self.config.projection,
        )
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/summary", web::get().to(handlers::summary))
            .route("/hotspots", web::get().to(handlers::hotspots))
            .route("/stations", web::get().to(handlers::stations))
            .route("/predict", web::get().to(handlers::predict))
            .route("/overlay", web::get().to(handlers::overlay))
            .route("/assistant/ask", web::post().to(handlers::assistant_ask)),
    );
}

/// Starts the crime oracle API server.
///
/// Loads the dataset named by `config`, partitions it, picks up a remote
/// assistant from the environment if one is configured, and serves until
/// shut down. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded or
/// partitioned, or the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: OracleConfig) -> std::io::Result<()> {
    log::info!("Loading dataset...");
    let dataset = Dataset::load(&config.data.incidents, config.data.stations.as_deref())
        .map_err(std::io::Error::other)?;

    let assistant: Option<Arc<dyn Assistant>> =
        match crime_oracle_assistant::providers::create_assistant_from_env() {
            Ok(assistant) => assistant.map(Arc::from),
            Err(e) => {
                log::warn!("Assistant provider unavailable: {e}; using canned replies");
                None
            }
        };

    log::info!("Computing hotspots...");
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;
    let state = web::Data::new(
        AppState::build(config, dataset, assistant).map_err(std::io::Error::other)?,
    );

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
