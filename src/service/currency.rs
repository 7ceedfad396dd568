//! 币种管理器：按三位币种代码分发到具体链的客户端实现
//!
//! 每个币种一个 `CurrencyManager` 实现，由 `CurrencyRegistry` 按代码查找。
//! 业务层只依赖 trait，测试时可以注册替身实现。

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 链客户端错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum ManagerError {
    #[error("Currency {0} is not supported")]
    UnsupportedCurrency(String),

    #[error("Wallet balance does not cover the transfer amount plus network fee")]
    InsufficientBalance,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Private key does not match the sender address")]
    KeyMismatch,

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Node RPC error: {0}")]
    Rpc(String),

    #[error("Invalid node configuration: {0}")]
    Config(String),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// 新生成的账户密钥对
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKeys {
    pub public_key: String,
    pub private_key: String,
}

impl fmt::Debug for AccountKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKeys")
            .field("public_key", &self.public_key)
            .field("private_key", &"***")
            .finish()
    }
}

/// 单个地址的余额（最小单位，ETH 为 wei）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    pub address: String,
    pub balance: u128,
}

/// 单个币种的链上能力集合
#[async_trait]
pub trait CurrencyManager: Send + Sync {
    /// 三位币种代码
    fn currency(&self) -> &str;

    /// 查询单个地址余额
    async fn get_balance(&self, address: &str) -> ManagerResult<u128>;

    /// 并发查询多个地址余额，任意一个失败则整体失败；返回顺序不保证
    async fn get_balances(&self, addresses: &[String]) -> ManagerResult<Vec<AddressBalance>>;

    /// 节点托管的账户列表
    async fn get_accounts(&self) -> ManagerResult<Vec<String>>;

    /// 本地生成新账户（不访问网络）
    fn get_new_account(&self) -> ManagerResult<AccountKeys>;

    /// 发送转账，返回交易哈希
    async fn make_transaction(
        &self,
        from: &AccountKeys,
        to: &str,
        amount: Decimal,
    ) -> ManagerResult<String>;

    /// 节点连通性
    async fn connected(&self) -> bool;
}

/// 由 API 密钥构造币种管理器
pub type ManagerFactory =
    Arc<dyn Fn(&str) -> ManagerResult<Arc<dyn CurrencyManager>> + Send + Sync>;

/// 币种注册表
#[derive(Clone, Default)]
pub struct CurrencyRegistry {
    factories: HashMap<String, ManagerFactory>,
}

impl CurrencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册币种（代码统一转大写）
    pub fn register<F>(mut self, currency: &str, factory: F) -> Self
    where
        F: Fn(&str) -> ManagerResult<Arc<dyn CurrencyManager>> + Send + Sync + 'static,
    {
        self.factories
            .insert(currency.to_ascii_uppercase(), Arc::new(factory));
        self
    }

    /// 默认注册表：目前只有 ETH
    pub fn with_defaults(config: &crate::config::BlockchainConfig) -> Self {
        let node_url = config.eth_node_url.clone();
        let gas_limit = config.eth_gas_limit;
        Self::new().register(crate::service::ethereum::CURRENCY_CODE, move |api_key| {
            let manager =
                crate::service::ethereum::EthereumManager::new(&node_url, api_key, gas_limit)?;
            Ok(Arc::new(manager) as Arc<dyn CurrencyManager>)
        })
    }

    pub fn is_supported(&self, currency: &str) -> bool {
        self.factories.contains_key(currency)
    }

    /// 已支持的币种代码（排序后）
    pub fn supported(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.factories.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// 按币种代码获取管理器
    pub fn resolve(
        &self,
        api_key: &str,
        currency: &str,
    ) -> ManagerResult<Arc<dyn CurrencyManager>> {
        let factory = self
            .factories
            .get(currency)
            .ok_or_else(|| ManagerError::UnsupportedCurrency(currency.to_string()))?;
        factory(api_key)
    }
}

impl fmt::Debug for CurrencyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyRegistry")
            .field("currencies", &self.supported())
            .finish()
    }
}
