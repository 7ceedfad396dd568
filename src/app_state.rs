use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::db::PgPool,
    repository::{PgWalletRepository, WalletRepository},
    service::currency::CurrencyRegistry,
};

/// 应用状态
/// 请求间共享的只读资源：钱包仓储、币种注册表、配置
#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<dyn WalletRepository>,
    pub currencies: Arc<CurrencyRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        currencies: CurrencyRegistry,
        config: Arc<Config>,
    ) -> Self {
        Self {
            wallets,
            currencies: Arc::new(currencies),
            config,
        }
    }

    /// 生产装配：Postgres 仓储 + 默认币种注册表
    pub fn from_pool(pool: PgPool, config: Arc<Config>) -> Self {
        let currencies = CurrencyRegistry::with_defaults(&config.blockchain);
        Self::new(Arc::new(PgWalletRepository::new(pool)), currencies, config)
    }

    /// 链节点的 API 凭证
    pub fn api_key(&self) -> &str {
        &self.config.blockchain.eth_api_key
    }
}
