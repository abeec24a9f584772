//! Housekey service binary.
//!
//! Loads configuration, connects to Postgres, wires the adapters into
//! the HTTP routers and serves until shutdown.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use housekey::adapters::http::{account_router, billing_router, AccountAppState, BillingAppState};
use housekey::adapters::postgres::{
    PostgresAccountRepository, PostgresAuditLog, PostgresCouponRepository,
};
use housekey::config::AppConfig;
use housekey::domain::billing::RelayWebhookVerifier;
use housekey::domain::foundation::AdminCredential;
use housekey::ports::{AccountRepository, AuditLog, CouponRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let accounts: Arc<dyn AccountRepository> = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let coupons: Arc<dyn CouponRepository> = Arc::new(PostgresCouponRepository::new(pool.clone()));
    let audit_log: Arc<dyn AuditLog> = Arc::new(PostgresAuditLog::new(pool));

    let admin_credential = Arc::new(AdminCredential::new(config.auth.admin_secret.clone()));
    let webhook_verifier = Arc::new(RelayWebhookVerifier::new(
        config.billing.relay_webhook_secret.clone(),
    ));

    let account_state = AccountAppState {
        accounts: accounts.clone(),
        coupons: coupons.clone(),
        audit_log: audit_log.clone(),
        admin_credential: admin_credential.clone(),
    };
    let billing_state = BillingAppState {
        accounts,
        coupons,
        audit_log,
        webhook_verifier,
        admin_credential,
    };

    let app = Router::new()
        .route("/health", get(health))
        .merge(Router::new().nest("/api", account_router()).with_state(account_state))
        .merge(Router::new().nest("/api", billing_router()).with_state(billing_state))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(config.server.request_timeout()))
                .layer(cors_layer(&config)),
        );

    let addr = config.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "housekey listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.server.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(origins)
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installs");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("sigterm handler installs")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received sigterm"),
    }
}
