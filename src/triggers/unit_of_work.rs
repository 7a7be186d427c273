use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use crate::error::Result;

/// Transaction boundary around one trigger execution attempt
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Transaction: Send;

    async fn begin(&self) -> Result<Self::Transaction>;

    /// Push pending writes to the store so failures surface before commit.
    async fn flush(&self, tx: &mut Self::Transaction) -> Result<()>;

    async fn commit(&self, tx: Self::Transaction) -> Result<()>;

    async fn rollback(&self, tx: Self::Transaction) -> Result<()>;
}

/// sqlx transaction on a PostgreSQL pool.
///
/// Statements execute as soon as the handler issues them, so flushing only
/// forces deferred constraints to be checked now.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    type Transaction = sqlx::Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(self.pool.begin().await?)
    }

    async fn flush(&self, tx: &mut Self::Transaction) -> Result<()> {
        sqlx::query("SET CONSTRAINTS ALL IMMEDIATE")
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<()> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<()> {
        Ok(tx.rollback().await?)
    }
}
