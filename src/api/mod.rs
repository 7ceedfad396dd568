use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;

use crate::{
    api::{
        handlers::{currencies, health, healthz, metrics, openapi_json},
        middleware::{set_request_id, trace_log},
        transaction_api::create_transaction,
        wallet_api::{create_wallet, list_wallets},
    },
    app_state::AppState,
    config::ServerConfig,
};

pub mod handlers;
pub mod middleware;
pub mod pagination;
pub mod transaction_api;
pub mod validation;
pub mod wallet_api;

#[derive(OpenApi)]
#[openapi(
    paths(
        wallet_api::list_wallets,
        wallet_api::create_wallet,
        transaction_api::create_transaction,
        handlers::currencies,
        handlers::health,
        handlers::healthz,
    ),
    components(schemas(
        crate::service::wallets::WalletView,
        wallet_api::CreateWalletRequest,
        transaction_api::CreateTransactionRequest,
        transaction_api::TransactionResponse,
        handlers::HealthResponse,
        handlers::Healthz,
        handlers::CurrenciesResponse,
    )),
    tags((name = "wallet-manager", description = "Crypto wallet backend"))
)]
pub struct ApiDoc;

/// 业务路由：根路径与 /api/v1 下各挂一份，带不带结尾斜杠均可
fn business_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wallets", get(list_wallets).post(create_wallet))
        .route("/wallets/", get(list_wallets).post(create_wallet))
        .route("/transaction", post(create_transaction))
        .route("/transaction/", post(create_transaction))
        .route("/currencies", get(currencies))
        .route("/currencies/", get(currencies))
}

pub fn routes(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server);

    Router::new()
        .merge(business_routes())
        .nest("/api/v1", business_routes())
        .route("/health", get(health)) // 简短别名
        .route("/api/health", get(health))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(set_request_id))
                .layer(from_fn(trace_log))
                .layer(cors),
        )
        .with_state(state)
}

/// `cors_allow_origins`：未配置时不放行跨域，`*` 放行全部，否则为逗号分隔的来源列表
pub fn cors_layer(cfg: &ServerConfig) -> CorsLayer {
    let Some(raw) = cfg.cors_allow_origins.as_deref() else {
        return CorsLayer::new();
    };
    if raw.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
