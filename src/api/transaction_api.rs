//! 交易 API：系统内钱包之间转账

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    api::validation::{expect_object, json_body, Validator},
    app_state::AppState,
    error::AppError,
    service::transactions::{self, TransferRequest},
};

pub const ADDRESS_MAX_LEN: usize = 44;
pub const CURRENCY_MAX_LEN: usize = 3;
pub const AMOUNT_MAX_DIGITS: u32 = 20;
pub const AMOUNT_DECIMAL_PLACES: u32 = 8;

pub const MSG_AMOUNT_NOT_POSITIVE: &str = "Ensure this value is greater than 0.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    #[serde(rename = "from")]
    pub from_address: String,
    #[serde(rename = "to")]
    pub to_address: String,
    /// 整币单位，最多 8 位小数
    #[schema(value_type = String, example = "0.5")]
    pub amount: Decimal,
    #[schema(example = "ETH")]
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub hash: String,
}

/// 字段级校验：全部必填、长度、金额精度、金额为正
pub fn parse_transfer(data: &Map<String, Value>) -> Result<TransferRequest, AppError> {
    let mut v = Validator::new(data);
    let from = v.char_field("from", None, ADDRESS_MAX_LEN);
    let to = v.char_field("to", None, ADDRESS_MAX_LEN);
    let amount = v.decimal_field("amount", AMOUNT_MAX_DIGITS, AMOUNT_DECIMAL_PLACES);
    let currency = v.char_field("currency", None, CURRENCY_MAX_LEN);

    if matches!(amount, Some(a) if a <= Decimal::ZERO) {
        v.add_error("amount", MSG_AMOUNT_NOT_POSITIVE);
    }
    v.finish()?;

    let (Some(from), Some(to), Some(amount), Some(currency)) = (from, to, amount, currency) else {
        return Err(AppError::bad_request("Invalid transaction payload"));
    };
    Ok(TransferRequest {
        from,
        to,
        amount,
        currency,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/transaction/",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction submitted", body = TransactionResponse),
        (status = 400, description = "Validation failed or rejected by the chain client")
    )
)]
pub async fn create_transaction(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let result = create_transaction_inner(&st, payload).await;
    crate::metrics::count("POST /transaction", result.is_ok());
    result
}

async fn create_transaction_inner(
    st: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let body = json_body(payload)?;
    let req = parse_transfer(expect_object(&body)?)?;

    let hash =
        transactions::submit_transaction(st.wallets.as_ref(), &st.currencies, st.api_key(), req)
            .await?;
    tracing::info!(tx_hash = %hash, "Transaction submitted");
    Ok((StatusCode::CREATED, Json(TransactionResponse { hash })))
}
