//! Transaction guard for multi-statement writes

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use toucan_core::AppError;

/// Wraps a Postgres transaction; anything not committed is rolled back
///
/// ```ignore
/// let mut tx = TransactionGuard::begin(&pool).await?;
/// sqlx::query("INSERT INTO ...").execute(tx.conn()?).await?;
/// tx.commit().await?;
/// ```
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, AppError> {
        let transaction = pool.begin().await?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Connection to run statements on inside the transaction
    pub fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.transaction
            .as_deref_mut()
            .ok_or_else(|| AppError::Internal("Transaction already finished".to_string()))
    }

    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        // sqlx rolls the inner transaction back when it is dropped
        if self.transaction.is_some() {
            tracing::warn!("Transaction dropped without commit, rolling back");
        }
    }
}
