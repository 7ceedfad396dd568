//! 交易服务：校验收发双方均为系统内钱包后委托链客户端发送

use std::time::Instant;

use rust_decimal::Decimal;

use crate::{
    error::AppError,
    repository::wallets::WalletRepository,
    service::currency::{AccountKeys, CurrencyRegistry},
};

pub const MSG_SELF_TRANSFER: &str = "Cannot send a transaction to yourself";
pub const MSG_OUTSIDE_SYSTEM: &str =
    "Transactions are only allowed between wallets inside the system";
pub const MSG_CURRENCY_MISMATCH: &str = "Both wallets must hold the requested currency";

/// 已通过字段校验的转账请求
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    /// 以整币为单位（ETH）
    pub amount: Decimal,
    pub currency: String,
}

/// 发送转账，返回交易哈希
///
/// 收发地址必须不同且都存在于钱包库中；这些检查都在访问链客户端之前完成。
pub async fn submit_transaction(
    repo: &dyn WalletRepository,
    registry: &CurrencyRegistry,
    api_key: &str,
    req: TransferRequest,
) -> Result<String, AppError> {
    if req.from == req.to {
        return Err(AppError::field("from", MSG_SELF_TRANSFER));
    }

    let sender = repo.find_by_public_key(&req.from).await?;
    let receiver = repo.find_by_public_key(&req.to).await?;
    let (Some(sender), Some(receiver)) = (sender, receiver) else {
        return Err(AppError::field("from", MSG_OUTSIDE_SYSTEM));
    };

    if sender.currency != req.currency || receiver.currency != req.currency {
        return Err(AppError::field("currency", MSG_CURRENCY_MISMATCH));
    }

    let manager = registry.resolve(api_key, &req.currency)?;
    let keys = AccountKeys {
        public_key: sender.public_key,
        private_key: sender.private_key,
    };

    let started = Instant::now();
    let result = manager.make_transaction(&keys, &req.to, req.amount).await;
    crate::metrics::record_upstream(result.is_ok(), started.elapsed().as_millis());

    result.map_err(|e| {
        tracing::warn!(
            from = %req.from,
            to = %req.to,
            currency = %req.currency,
            error = %e,
            "Transaction rejected by chain client"
        );
        AppError::from(e)
    })
}
