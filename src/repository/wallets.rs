// 钱包数据访问 Repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::FromRow;

use crate::infrastructure::db::PgPool;

// ============ 领域模型 ============

/// 钱包记录：币种 + 公私钥对，创建后不可变
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct Wallet {
    pub id: i64,
    pub currency: String,
    pub public_key: String,
    pub private_key: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("currency", &self.currency)
            .field("public_key", &self.public_key)
            .field("private_key", &"***")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl std::fmt::Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.public_key)
    }
}

/// 创建钱包参数
#[derive(Clone)]
pub struct CreateWalletParams {
    pub currency: String,
    pub public_key: String,
    pub private_key: String,
}

// ============ Repository Trait ============

#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// 创建新钱包（公钥、私钥均唯一）
    async fn create(&self, params: CreateWalletParams) -> Result<Wallet>;

    /// 分页列出钱包（按 id 升序）；`limit` 为 None 时返回全部
    async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<Wallet>>;

    /// 钱包总数
    async fn count(&self) -> Result<i64>;

    /// 根据公钥查询钱包
    async fn find_by_public_key(&self, public_key: &str) -> Result<Option<Wallet>>;

    /// 存储连通性
    async fn ping(&self) -> Result<()>;
}

// ============ PostgreSQL 实现 ============

pub struct PgWalletRepository {
    pool: PgPool,
}

impl PgWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PgWalletRepository {
    async fn create(&self, params: CreateWalletParams) -> Result<Wallet> {
        let mut tx = self.pool.begin().await?;

        let rec = sqlx::query_as::<_, Wallet>(
            r#"
            INSERT INTO wallets (currency, public_key, private_key)
            VALUES ($1, $2, $3)
            RETURNING id, currency, public_key, private_key, created_at
            "#,
        )
        .bind(&params.currency)
        .bind(&params.public_key)
        .bind(&params.private_key)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rec)
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> Result<Vec<Wallet>> {
        // LIMIT NULL 在 Postgres 中等价于不限制
        let recs = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, currency, public_key, private_key, created_at
            FROM wallets
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(recs)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn find_by_public_key(&self, public_key: &str) -> Result<Option<Wallet>> {
        let rec = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, currency, public_key, private_key, created_at
            FROM wallets
            WHERE public_key = $1
            "#,
        )
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    async fn ping(&self) -> Result<()> {
        crate::infrastructure::db::health_check(&self.pool).await?;
        Ok(())
    }
}
