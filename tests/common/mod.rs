//! 测试辅助模块：内存钱包仓储、可记录调用的链客户端替身、路由驱动

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt as _; // for oneshot()
use wallet_manager::{
    api,
    app_state::AppState,
    config::Config,
    repository::{CreateWalletParams, Wallet, WalletRepository},
    service::currency::{
        AccountKeys, AddressBalance, CurrencyManager, CurrencyRegistry, ManagerError,
        ManagerResult,
    },
};

// ============ 内存仓储 ============

#[derive(Default)]
pub struct InMemoryWalletRepository {
    rows: Mutex<Vec<Wallet>>,
}

impl InMemoryWalletRepository {
    pub fn all(&self) -> Vec<Wallet> {
        self.rows.lock().unwrap().clone()
    }

    pub async fn seed(&self, currency: &str, public_key: &str) -> Wallet {
        self.create(CreateWalletParams {
            currency: currency.into(),
            public_key: public_key.into(),
            private_key: format!("{}-secret", public_key),
        })
        .await
        .unwrap()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn create(&self, params: CreateWalletParams) -> anyhow::Result<Wallet> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|w| w.public_key == params.public_key || w.private_key == params.private_key)
        {
            anyhow::bail!("duplicate key value violates unique constraint");
        }
        let wallet = Wallet {
            id: rows.len() as i64 + 1,
            currency: params.currency,
            public_key: params.public_key,
            private_key: params.private_key,
            created_at: chrono::Utc::now(),
        };
        rows.push(wallet.clone());
        Ok(wallet)
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Wallet>> {
        let rows = self.rows.lock().unwrap();
        let iter = rows.iter().skip(offset as usize).cloned();
        Ok(match limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn find_by_public_key(&self, public_key: &str) -> anyhow::Result<Option<Wallet>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.public_key == public_key)
            .cloned())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============ 链客户端替身 ============

/// 所有替身共享的调用记录与预设结果
pub struct MockChain {
    pub resolved: Vec<String>,
    pub balance_calls: Vec<(String, Vec<String>)>,
    pub transactions: Vec<(String, String, Decimal)>,
    pub generated: Vec<AccountKeys>,
    pub balances: HashMap<String, u128>,
    pub balance_error: Option<ManagerError>,
    pub tx_error: Option<ManagerError>,
    pub tx_hash: String,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            resolved: Vec::new(),
            balance_calls: Vec::new(),
            transactions: Vec::new(),
            generated: Vec::new(),
            balances: HashMap::new(),
            balance_error: None,
            tx_error: None,
            tx_hash: "0xdead".into(),
        }
    }
}

impl MockChain {
    pub fn chain_calls(&self) -> usize {
        self.resolved.len()
            + self.balance_calls.len()
            + self.transactions.len()
            + self.generated.len()
    }
}

pub struct MockManager {
    currency: String,
    chain: Arc<Mutex<MockChain>>,
}

#[async_trait]
impl CurrencyManager for MockManager {
    fn currency(&self) -> &str {
        &self.currency
    }

    async fn get_balance(&self, address: &str) -> ManagerResult<u128> {
        let chain = self.chain.lock().unwrap();
        Ok(chain.balances.get(address).copied().unwrap_or(0))
    }

    async fn get_balances(&self, addresses: &[String]) -> ManagerResult<Vec<AddressBalance>> {
        let mut chain = self.chain.lock().unwrap();
        chain
            .balance_calls
            .push((self.currency.clone(), addresses.to_vec()));
        if let Some(err) = chain.balance_error.clone() {
            return Err(err);
        }
        // 只返回有预设余额的地址
        Ok(addresses
            .iter()
            .filter_map(|a| {
                chain.balances.get(a).map(|b| AddressBalance {
                    address: a.clone(),
                    balance: *b,
                })
            })
            .collect())
    }

    async fn get_accounts(&self) -> ManagerResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn get_new_account(&self) -> ManagerResult<AccountKeys> {
        let mut chain = self.chain.lock().unwrap();
        let n = chain.generated.len() + 1;
        let keys = AccountKeys {
            public_key: format!("0x{}pub{:04}", self.currency, n),
            private_key: format!("0x{}priv{:04}", self.currency, n),
        };
        chain.generated.push(keys.clone());
        Ok(keys)
    }

    async fn make_transaction(
        &self,
        from: &AccountKeys,
        to: &str,
        amount: Decimal,
    ) -> ManagerResult<String> {
        let mut chain = self.chain.lock().unwrap();
        chain
            .transactions
            .push((from.public_key.clone(), to.to_string(), amount));
        match chain.tx_error.clone() {
            Some(err) => Err(err),
            None => Ok(chain.tx_hash.clone()),
        }
    }

    async fn connected(&self) -> bool {
        true
    }
}

// ============ 路由驱动 ============

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryWalletRepository>,
    pub chain: Arc<Mutex<MockChain>>,
}

/// 构造路由，为给定币种注册替身
pub fn spawn_app(currencies: &[&str]) -> TestApp {
    let repo = Arc::new(InMemoryWalletRepository::default());
    let chain = Arc::new(Mutex::new(MockChain::default()));

    let mut registry = CurrencyRegistry::new();
    for code in currencies {
        let chain = chain.clone();
        let currency = code.to_string();
        registry = registry.register(code, move |_api_key| {
            chain.lock().unwrap().resolved.push(currency.clone());
            Ok(Arc::new(MockManager {
                currency: currency.clone(),
                chain: chain.clone(),
            }) as Arc<dyn CurrencyManager>)
        });
    }

    let config = Arc::new(Config::from_env().unwrap());
    let state = Arc::new(AppState::new(repo.clone(), registry, config));
    TestApp {
        router: api::routes(state),
        repo,
        chain,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub fn chain(&self) -> std::sync::MutexGuard<'_, MockChain> {
        self.chain.lock().unwrap()
    }
}
