//! 钱包 API：列表（附实时余额）与创建

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    api::{
        pagination::{LimitOffsetQuery, PaginatedResponse},
        validation::{expect_object, json_body, Validator},
    },
    app_state::AppState,
    error::AppError,
    service::wallets::{self, WalletView},
};

/// 币种代码固定 3 个字符
pub const CURRENCY_CODE_LEN: usize = 3;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    #[schema(example = "ETH")]
    pub currency: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/wallets/",
    params(LimitOffsetQuery),
    responses(
        (status = 200, description = "Wallets with live balances; paginated as {count, next, previous, results} when limit is given", body = [WalletView]),
        (status = 502, description = "Chain node error"),
        (status = 500, description = "Internal error")
    )
)]
pub async fn list_wallets(
    State(st): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    Query(q): Query<LimitOffsetQuery>,
) -> Result<Response, AppError> {
    let result = list_wallets_inner(&st, uri.path(), &q).await;
    crate::metrics::count("GET /wallets", result.is_ok());
    result
}

async fn list_wallets_inner(
    st: &AppState,
    path: &str,
    q: &LimitOffsetQuery,
) -> Result<Response, AppError> {
    match q.resolve() {
        None => {
            let rows = st.wallets.list(None, 0).await?;
            let mut views: Vec<WalletView> = rows.iter().map(WalletView::from).collect();
            wallets::attach_balances(&mut views, &st.currencies, st.api_key()).await?;
            Ok(Json(views).into_response())
        }
        Some(page) => {
            let count = st.wallets.count().await?;
            let rows = st.wallets.list(Some(page.limit), page.offset).await?;
            let mut views: Vec<WalletView> = rows.iter().map(WalletView::from).collect();
            wallets::attach_balances(&mut views, &st.currencies, st.api_key()).await?;
            Ok(Json(PaginatedResponse::new(views, count, path, page)).into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/wallets/",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = WalletView),
        (status = 400, description = "Invalid or unsupported currency"),
        (status = 409, description = "Key collision")
    )
)]
pub async fn create_wallet(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletView>), AppError> {
    let result = create_wallet_inner(&st, payload).await;
    crate::metrics::count("POST /wallets", result.is_ok());
    result
}

async fn create_wallet_inner(
    st: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletView>), AppError> {
    let body = json_body(payload)?;
    let data = expect_object(&body)?;

    let mut v = Validator::new(data);
    let currency = v.char_field("currency", Some(CURRENCY_CODE_LEN), CURRENCY_CODE_LEN);
    v.finish()?;
    let Some(currency) = currency else {
        return Err(AppError::field("currency", crate::api::validation::MSG_REQUIRED));
    };

    let wallet =
        wallets::create_wallet(st.wallets.as_ref(), &st.currencies, st.api_key(), &currency)
            .await?;
    Ok((StatusCode::CREATED, Json(WalletView::from(&wallet))))
}
