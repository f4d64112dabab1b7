//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use color_eyre::eyre::{Result, WrapErr};
#[cfg(feature = "metrics")]
use color_eyre::eyre::eyre;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use headshot_backend::Trace;
#[cfg(debug_assertions)]
use headshot_backend::doc::ApiDoc;
use headshot_backend::config::GatewaySettings;
use headshot_backend::domain::ports::GenerationMetrics;
#[cfg(not(feature = "metrics"))]
use headshot_backend::domain::ports::NoOpGenerationMetrics;
use headshot_backend::inbound::http::generate::create_generation;
use headshot_backend::inbound::http::health::{HealthState, live, ready};
use headshot_backend::inbound::http::state::HttpState;
use headshot_backend::inbound::http::users::{current_user, current_user_history};
#[cfg(feature = "metrics")]
use headshot_backend::outbound::metrics::PrometheusGenerationMetrics;

use state_builders::{build_http_state, build_identity, build_stores, seed_demo_account};

/// Resolve adapters from settings and assemble the server configuration.
///
/// # Errors
///
/// Fails when settings are invalid, migrations fail, or the token secret
/// cannot be loaded.
pub async fn build_server_config(settings: &GatewaySettings) -> Result<ServerConfig> {
    let stores = build_stores(settings).await?;
    let identity = build_identity(settings)?;
    if cfg!(debug_assertions) {
        if let Some(accounts) = &stores.in_memory_accounts {
            seed_demo_account(accounts, &identity)?;
        }
    }

    #[cfg(feature = "metrics")]
    let (metrics, prometheus) = {
        let registry = prometheus::Registry::new();
        let generation_metrics = PrometheusGenerationMetrics::new(&registry)
            .wrap_err("generation metrics registration failed")?;
        let prometheus = PrometheusMetricsBuilder::new("headshot")
            .endpoint("/metrics")
            .registry(registry)
            .build()
            .map_err(|err| eyre!("failed to configure Prometheus metrics: {err}"))?;
        let metrics: Arc<dyn GenerationMetrics> = Arc::new(generation_metrics);
        (metrics, prometheus)
    };
    #[cfg(not(feature = "metrics"))]
    let metrics: Arc<dyn GenerationMetrics> = Arc::new(NoOpGenerationMetrics);

    let http_state = build_http_state(settings, stores, identity, metrics)?;
    #[cfg(feature = "metrics")]
    let config = ServerConfig::new(settings.bind_addr()?, http_state, prometheus);
    #[cfg(not(feature = "metrics"))]
    let config = ServerConfig::new(settings.bind_addr()?, http_state);
    Ok(config)
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(create_generation)
        .service(current_user)
        .service(current_user_history);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> Result<Server> {
    let ServerConfig {
        bind_addr,
        http_state,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = build_app(server_health_state.clone(), http_state.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)
    .wrap_err_with(|| format!("failed to bind {bind_addr}"))?
    .run();

    health_state.mark_ready();
    Ok(server)
}
