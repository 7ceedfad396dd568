//! Ethereum 链客户端（基于 ethers-rs）
//!
//! 节点地址由配置的节点 URL 与 API 密钥拼接而成。
//! 私钥只在本地签名时使用，不会出现在日志里。

use std::str::FromStr;

use async_trait::async_trait;
use ethers::{
    middleware::{signer::SignerMiddlewareError, SignerMiddleware},
    providers::{Http, Middleware, Provider, ProviderError},
    signers::{LocalWallet, Signer},
    types::{Address, TransactionRequest, U256},
    utils::{parse_ether, to_checksum},
};
use rust_decimal::Decimal;

use crate::service::currency::{
    AccountKeys, AddressBalance, CurrencyManager, ManagerError, ManagerResult,
};

pub const CURRENCY_CODE: &str = "ETH";

pub struct EthereumManager {
    provider: Provider<Http>,
    gas_limit: u64,
}

fn rpc_error(err: ProviderError) -> ManagerError {
    ManagerError::Rpc(err.to_string())
}

/// 签名阶段的失败归为 Signing，节点返回的错误归为 Rpc
fn send_error(err: SignerMiddlewareError<Provider<Http>, LocalWallet>) -> ManagerError {
    match err {
        SignerMiddlewareError::SignerError(_)
        | SignerMiddlewareError::WrongSigner
        | SignerMiddlewareError::DifferentChainID => ManagerError::Signing(err.to_string()),
        other => ManagerError::Rpc(other.to_string()),
    }
}

impl EthereumManager {
    pub fn new(node_url: &str, api_key: &str, gas_limit: u64) -> ManagerResult<Self> {
        let url = format!("{}{}", node_url, api_key);
        let provider = Provider::<Http>::try_from(url.as_str())
            .map_err(|e| ManagerError::Config(e.to_string()))?;
        Ok(Self {
            provider,
            gas_limit,
        })
    }

    fn parse_address(address: &str) -> ManagerResult<Address> {
        Address::from_str(address).map_err(|_| ManagerError::InvalidAddress(address.to_string()))
    }

    /// ETH → wei
    pub fn to_wei(amount: Decimal) -> ManagerResult<U256> {
        if amount <= Decimal::ZERO {
            return Err(ManagerError::InvalidAmount(
                "amount must be greater than zero".into(),
            ));
        }
        parse_ether(amount.normalize().to_string())
            .map_err(|e| ManagerError::InvalidAmount(e.to_string()))
    }

    fn wei_to_u128(value: U256) -> ManagerResult<u128> {
        if value > U256::from(u128::MAX) {
            return Err(ManagerError::Rpc(format!(
                "balance {} does not fit into u128",
                value
            )));
        }
        Ok(value.as_u128())
    }

    fn load_signer(keys: &AccountKeys) -> ManagerResult<LocalWallet> {
        let wallet: LocalWallet = keys
            .private_key
            .trim_start_matches("0x")
            .parse()
            .map_err(|e: ethers::signers::WalletError| ManagerError::InvalidKey(e.to_string()))?;
        let sender = Self::parse_address(&keys.public_key)?;
        if wallet.address() != sender {
            return Err(ManagerError::KeyMismatch);
        }
        Ok(wallet)
    }
}

#[async_trait]
impl CurrencyManager for EthereumManager {
    fn currency(&self) -> &str {
        CURRENCY_CODE
    }

    async fn get_balance(&self, address: &str) -> ManagerResult<u128> {
        let addr = Self::parse_address(address)?;
        let balance = self
            .provider
            .get_balance(addr, None)
            .await
            .map_err(rpc_error)?;
        Self::wei_to_u128(balance)
    }

    async fn get_balances(&self, addresses: &[String]) -> ManagerResult<Vec<AddressBalance>> {
        let lookups = addresses.iter().map(|address| async move {
            let balance = self.get_balance(address).await?;
            Ok::<_, ManagerError>(AddressBalance {
                address: address.clone(),
                balance,
            })
        });
        let balances = futures::future::try_join_all(lookups).await?;
        tracing::debug!(count = balances.len(), "Fetched ETH balances");
        Ok(balances)
    }

    async fn get_accounts(&self) -> ManagerResult<Vec<String>> {
        let accounts = self.provider.get_accounts().await.map_err(rpc_error)?;
        Ok(accounts.iter().map(|a| to_checksum(a, None)).collect())
    }

    fn get_new_account(&self) -> ManagerResult<AccountKeys> {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        Ok(AccountKeys {
            public_key: to_checksum(&wallet.address(), None),
            private_key: format!("0x{}", hex::encode(wallet.signer().to_bytes())),
        })
    }

    async fn make_transaction(
        &self,
        from: &AccountKeys,
        to: &str,
        amount: Decimal,
    ) -> ManagerResult<String> {
        let wallet = Self::load_signer(from)?;
        let sender = wallet.address();
        let recipient = Self::parse_address(to)?;
        let value = Self::to_wei(amount)?;

        // 余额必须覆盖 转账金额 + gas_limit * gas_price
        let gas_price = self.provider.get_gas_price().await.map_err(rpc_error)?;
        let fee = gas_price
            .checked_mul(U256::from(self.gas_limit))
            .ok_or_else(|| ManagerError::InvalidAmount("network fee overflow".into()))?;
        let required = value
            .checked_add(fee)
            .ok_or_else(|| ManagerError::InvalidAmount("amount overflow".into()))?;
        let balance = self
            .provider
            .get_balance(sender, None)
            .await
            .map_err(rpc_error)?;
        if balance < required {
            tracing::warn!(
                from = %to_checksum(&sender, None),
                balance = %balance,
                required = %required,
                "Insufficient balance for transfer"
            );
            return Err(ManagerError::InsufficientBalance);
        }

        let chain_id = self.provider.get_chainid().await.map_err(rpc_error)?.as_u64();
        let nonce = self
            .provider
            .get_transaction_count(sender, None)
            .await
            .map_err(rpc_error)?;

        let tx = TransactionRequest::new()
            .from(sender)
            .to(recipient)
            .value(value)
            .gas(self.gas_limit)
            .gas_price(gas_price)
            .nonce(nonce)
            .chain_id(chain_id);

        let client = SignerMiddleware::new(self.provider.clone(), wallet.with_chain_id(chain_id));
        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(send_error)?;
        let hash = format!("{:#x}", pending.tx_hash());

        tracing::info!(
            tx_hash = %hash,
            from = %to_checksum(&sender, None),
            to = %to_checksum(&recipient, None),
            value_wei = %value,
            "Submitted ETH transfer"
        );
        Ok(hash)
    }

    async fn connected(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
