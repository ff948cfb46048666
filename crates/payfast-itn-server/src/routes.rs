use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};

use crate::metrics;
use crate::state::AppState;

/// Body PayFast expects in the acknowledgement.
pub const ACK_BODY: &str = "Success";

/// Per-IP limiter for the operational endpoints.
pub type RateLimit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter allowing `requests_per_minute` per client IP. `None` when zero.
pub fn rate_limit(requests_per_minute: u64) -> Option<RateLimit> {
    if requests_per_minute == 0 {
        return None;
    }
    GovernorConfigBuilder::default()
        .requests_per_minute(requests_per_minute)
        .finish()
}

/// Register every endpoint.
///
/// `/payment_notify` is never throttled: the gateway delivers from a handful
/// of fixed addresses and every notification must get its `200 Success`.
/// Only `/health` and `/metrics` sit behind the limiter.
pub fn configure(cfg: &mut web::ServiceConfig, limit: &RateLimit) {
    cfg.service(notify_query).service(notify_form).service(
        web::scope("")
            .wrap(Governor::new(limit))
            .service(health)
            .service(metrics_endpoint),
    );
}

/// Acknowledge immediately, then verify on a detached task.
///
/// The gateway gets `200 Success` for every notification; verification
/// results only reach logs, metrics and the failure hook.
fn acknowledge(req: &HttpRequest, state: &AppState, params: Vec<(String, String)>) -> HttpResponse {
    let origin_host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let orchestrator = state.orchestrator.clone();

    tokio::spawn(async move {
        match orchestrator.handle(&params, &origin_host).await {
            Ok(outcome) => metrics::record_outcome(&outcome),
            Err(_) => metrics::NOTIFICATIONS
                .with_label_values(&["missing_fields"])
                .inc(),
        }
    });

    HttpResponse::Ok().content_type("text/plain").body(ACK_BODY)
}

#[get("/payment_notify")]
pub async fn notify_query(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let params = itn::fields::parse_params(req.query_string());
    acknowledge(&req, &state, params)
}

/// PayFast posts the notification as a form body. Falls back to the query
/// string when the body is empty.
#[post("/payment_notify")]
pub async fn notify_form(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let params = if body.is_empty() {
        itn::fields::parse_params(req.query_string())
    } else {
        itn::fields::parse_params(&body)
    };
    acknowledge(&req, &state, params)
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "itn-server",
        "gatewayHost": &state.gateway_host,
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| itn::security::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            if !state.public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or ITN_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
