use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::currency::ManagerError;

/// 字段级校验错误：字段名 → 错误列表（与 DRF 序列化器输出格式一致）
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,
    Internal,

    // 业务错误码
    ValidationFailed,
    WalletAlreadyExists,
    InsufficientBalance,
    InvalidAddress,
    InvalidAmount,
    TransactionFailed,
    RpcError,
    ChainNotSupported,
    DatabaseError,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::WalletAlreadyExists => "wallet_already_exists",
            AppErrorCode::InsufficientBalance => "insufficient_balance",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::TransactionFailed => "transaction_failed",
            AppErrorCode::RpcError => "rpc_error",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::DatabaseError => "database_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    /// 字段级错误存在时，响应体直接输出字段映射
    pub fields: Option<FieldErrors>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(fields) = self.fields {
            return (self.status, Json(fields)).into_response();
        }
        let body = ErrorBody {
            error: &self.message,
            code: self.code.as_str(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            fields: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// 字段级校验失败（400）
    pub fn validation(fields: FieldErrors) -> Self {
        let message = fields
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(" ")))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            code: AppErrorCode::ValidationFailed,
            message,
            status: StatusCode::BAD_REQUEST,
            fields: Some(fields),
        }
    }

    /// 单字段校验失败的便捷构造
    pub fn field(field: &str, msg: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![msg.into()]);
        Self::validation(fields)
    }

    pub fn wallet_already_exists(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::WalletAlreadyExists, StatusCode::CONFLICT, msg)
    }

    pub fn insufficient_balance(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InsufficientBalance, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAmount, StatusCode::BAD_REQUEST, msg)
    }

    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::TransactionFailed, StatusCode::BAD_REQUEST, msg)
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::RpcError, StatusCode::BAD_GATEWAY, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, StatusCode::BAD_REQUEST, msg)
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::new(
            AppErrorCode::DatabaseError,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    /// 查询余额阶段的链上错误：属于服务端故障，不是请求参数问题
    pub fn upstream(err: ManagerError) -> Self {
        match err {
            ManagerError::Rpc(msg) => Self::rpc_error(msg),
            other => Self::internal(other.to_string()),
        }
    }

    /// 字段错误时返回对应字段的第一条信息
    pub fn field_message(&self, field: &str) -> Option<&str> {
        self.fields
            .as_ref()
            .and_then(|f| f.get(field))
            .and_then(|errors| errors.first())
            .map(String::as_str)
    }
}

// 交易阶段的链上错误：统一 400，code 区分具体原因
impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let msg = err.to_string();
        match err {
            ManagerError::UnsupportedCurrency(_) => Self::chain_not_supported(msg),
            ManagerError::InsufficientBalance => Self::insufficient_balance(msg),
            ManagerError::InvalidAddress(_) | ManagerError::KeyMismatch => {
                Self::invalid_address(msg)
            }
            ManagerError::InvalidAmount(_) => Self::invalid_amount(msg),
            ManagerError::Rpc(_) => Self {
                status: StatusCode::BAD_REQUEST,
                ..Self::rpc_error(msg)
            },
            ManagerError::InvalidKey(_) | ManagerError::Signing(_) | ManagerError::Config(_) => {
                Self::transaction_failed(msg)
            }
        }
    }
}

// 从 SQLx 错误转换
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),
            sqlx::Error::Database(ref db_err) => {
                // PostgreSQL unique_violation
                if db_err.code().as_deref() == Some("23505") {
                    return Self::wallet_already_exists("Wallet with this key already exists");
                }
                tracing::error!(error = %db_err, "database error");
                Self::database_error("Database error")
            }
            _ => {
                tracing::error!(error = %err, "database operation failed");
                Self::database_error("Database operation failed")
            }
        }
    }
}

// 从 anyhow 错误转换（仓储层）
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => Self::from(sqlx_err),
            Err(other) => Self::internal(format!("{}", other)),
        }
    }
}
