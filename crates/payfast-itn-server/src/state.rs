use std::sync::Arc;

use itn::{ConfirmationClient, NotificationOrchestrator, SourceNetworkValidator};

use crate::alert::AlertWebhookHook;
use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<NotificationOrchestrator>,
    /// Host server confirmations are sent to (reported on /health)
    pub gateway_host: String,
    /// Bearer token for /metrics
    pub metrics_token: Option<Vec<u8>>,
    pub public_metrics: bool,
}

impl AppState {
    /// Wire the production orchestrator: system DNS, the configured gateway,
    /// and the alert hook for failed notifications. Confirmations and alerts
    /// share one connection pool.
    pub fn from_config(config: &ServerConfig) -> Self {
        let http = reqwest::Client::new();
        let hook = AlertWebhookHook::new(
            http.clone(),
            config.alert_webhook_urls.clone(),
            config.alert_webhook_secret.clone(),
        );
        let network = SourceNetworkValidator::new(&config.verifier);
        let confirmation = ConfirmationClient::new(&config.verifier).with_client(http);
        let orchestrator =
            NotificationOrchestrator::with_parts(&config.verifier, network, confirmation)
                .with_hook(Arc::new(hook));

        Self {
            orchestrator: Arc::new(orchestrator),
            gateway_host: config.verifier.gateway_host.clone(),
            metrics_token: config.metrics_token.clone(),
            public_metrics: config.public_metrics,
        }
    }
}
