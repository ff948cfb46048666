use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itn_server::config::ServerConfig;
use itn_server::routes;
use itn_server::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    dotenvy::from_filename("app.env").ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    if config.metrics_token.is_none() && !config.public_metrics {
        tracing::warn!("METRICS_TOKEN not set — /metrics is disabled");
    }

    let state = web::Data::new(AppState::from_config(&config));
    let port = config.port;

    let limit = match routes::rate_limit(config.rate_limit_rpm) {
        Some(limit) => limit,
        None => {
            tracing::error!("RATE_LIMIT_RPM must be greater than zero");
            std::process::exit(1);
        }
    };

    tracing::info!("PayFast ITN server listening on port {port}");
    tracing::info!("Gateway host: {}", config.verifier.gateway_host);
    tracing::info!(
        "Passphrase: {}",
        if config.verifier.passphrase().is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    tracing::info!("Alert webhooks: {}", config.alert_webhook_urls.len());
    tracing::info!(
        "Rate limit: {} req/min per IP on /health and /metrics",
        config.rate_limit_rpm
    );
    tracing::info!("  GET|POST http://localhost:{port}/payment_notify");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::default().limit(65_536))
            .configure(|cfg| routes::configure(cfg, &limit))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
