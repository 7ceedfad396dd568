use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::app_state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    crate::metrics::count_ok("GET /health");
    Json(HealthResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Healthz {
    pub status: String,
    pub db_ok: bool,
    /// 币种 → 节点是否可达
    #[schema(value_type = Object)]
    pub nodes: BTreeMap<String, bool>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Dependency status", body = Healthz))
)]
pub async fn healthz(State(st): State<Arc<AppState>>) -> Json<Healthz> {
    let db_ok = st.wallets.ping().await.is_ok();

    let mut nodes = BTreeMap::new();
    for code in st.currencies.supported() {
        let ok = match st.currencies.resolve(st.api_key(), &code) {
            Ok(manager) => manager.connected().await,
            Err(e) => {
                tracing::warn!(currency = %code, error = %e, "Chain client unavailable");
                false
            }
        };
        nodes.insert(code, ok);
    }

    let status = if db_ok && nodes.values().all(|ok| *ok) {
        "ok".into()
    } else {
        "degraded".into()
    };
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );
    crate::metrics::count_ok("GET /healthz");
    Json(Healthz {
        status,
        db_ok,
        nodes,
        version,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrenciesResponse {
    pub currencies: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/currencies/",
    responses((status = 200, description = "Supported currency codes", body = CurrenciesResponse))
)]
pub async fn currencies(State(st): State<Arc<AppState>>) -> Json<CurrenciesResponse> {
    crate::metrics::count_ok("GET /currencies");
    Json(CurrenciesResponse {
        currencies: st.currencies.supported(),
    })
}

pub async fn metrics() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render_prometheus(),
    )
        .into_response()
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::api::ApiDoc::openapi())
}
