//! PayMaster gateway service.
//!
//! Serves the callback endpoints PayMaster posts notifications to and the
//! redirect form for each payment.

use std::sync::Arc;

use axum::http::HeaderName;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use paymaster_gateway::adapters::http::{callback_router, CallbackAppState};
use paymaster_gateway::adapters::{
    InMemoryPaymentRepository, PaymasterApiClient, PaymasterApiConfig, PaymasterProvider,
    PaymasterProviderConfig, PostgresPaymentRepository,
};
use paymaster_gateway::config::{AppConfig, DatabaseConfig};
use paymaster_gateway::ports::PaymentRepository;

const REQUEST_ID_HEADER: &str = "x-request-id";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let repository = repository(config.database.as_ref()).await?;

    let mut provider = PaymasterProvider::new(
        PaymasterProviderConfig::from_settings(&config.paymaster),
        repository.clone(),
    );
    if let Some(api_config) = PaymasterApiConfig::from_settings(&config.paymaster) {
        tracing::info!(login = api_config.login(), "PayMaster API client configured");
        provider = provider.with_remote_lookup(Arc::new(PaymasterApiClient::new(api_config)?));
    }

    let state = CallbackAppState::new(Arc::new(provider), repository);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let app = callback_router().with_state(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.server.request_timeout()))
            .layer(PropagateRequestIdLayer::new(request_id)),
    );

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, merchant_id = %config.paymaster.merchant_id, "Starting PayMaster gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn repository(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn PaymentRepository>, BoxError> {
    let Some(database) = database else {
        tracing::warn!("No database configured, payments are kept in memory");
        return Ok(Arc::new(InMemoryPaymentRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .connect(&database.url)
        .await?;

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(PostgresPaymentRepository::new(pool)))
}
