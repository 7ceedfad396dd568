//! 钱包服务：创建钱包、为钱包列表附加实时余额

use std::time::Instant;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    repository::wallets::{CreateWalletParams, Wallet, WalletRepository},
    service::currency::CurrencyRegistry,
};

/// 钱包对外视图（不含私钥）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WalletView {
    pub id: i64,
    pub currency: String,
    pub public_key: String,
    /// 实时余额（最小单位）；链上未返回时省略
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<u64>)]
    pub balance: Option<u128>,
}

impl From<&Wallet> for WalletView {
    fn from(w: &Wallet) -> Self {
        Self {
            id: w.id,
            currency: w.currency.clone(),
            public_key: w.public_key.clone(),
            balance: None,
        }
    }
}

/// 按币种分组公钥，保留币种首次出现的顺序
pub fn group_addresses_by_currency(wallets: &[WalletView]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for w in wallets {
        match groups.iter_mut().find(|(currency, _)| *currency == w.currency) {
            Some((_, addresses)) => addresses.push(w.public_key.clone()),
            None => groups.push((w.currency.clone(), vec![w.public_key.clone()])),
        }
    }
    groups
}

/// 每个币种调用一次批量余额查询，再按公钥合并回视图
///
/// 任意币种查询失败则整体失败，不返回部分结果。
pub async fn attach_balances(
    views: &mut [WalletView],
    registry: &CurrencyRegistry,
    api_key: &str,
) -> Result<(), AppError> {
    for (currency, addresses) in group_addresses_by_currency(views) {
        let manager = registry.resolve(api_key, &currency).map_err(AppError::upstream)?;

        let started = Instant::now();
        let result = manager.get_balances(&addresses).await;
        crate::metrics::record_upstream(result.is_ok(), started.elapsed().as_millis());

        let balances = result.map_err(|e| {
            tracing::error!(currency = %currency, error = %e, "Balance lookup failed");
            AppError::upstream(e)
        })?;

        for balance in balances {
            if let Some(view) = views
                .iter_mut()
                .find(|v| v.currency == currency && v.public_key == balance.address)
            {
                view.balance = Some(balance.balance);
            }
        }
    }
    Ok(())
}

/// 创建钱包：生成新账户并落库
pub async fn create_wallet(
    repo: &dyn WalletRepository,
    registry: &CurrencyRegistry,
    api_key: &str,
    currency: &str,
) -> Result<Wallet, AppError> {
    let manager = registry.resolve(api_key, currency)?;
    let keys = manager.get_new_account()?;

    let wallet = repo
        .create(CreateWalletParams {
            currency: currency.to_string(),
            public_key: keys.public_key,
            private_key: keys.private_key,
        })
        .await?;
    crate::metrics::inc_wallet_created();

    tracing::info!(
        wallet_id = wallet.id,
        currency = %wallet.currency,
        public_key = %wallet.public_key,
        "Wallet created"
    );
    Ok(wallet)
}
