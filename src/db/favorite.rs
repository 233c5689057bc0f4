use sqlx::sqlite::SqlitePool;

/// A user's favorited products. Kept minimal; the auth subsystem only needs
/// it to exist so account deletion can be verified to sweep it clean.
#[derive(Clone)]
pub struct FavoriteStore {
    pool: SqlitePool,
}

impl FavoriteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mark a product as a favorite of a user. Idempotent.
    pub async fn add(&self, user_id: i64, product_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO favorites (user_id, product_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Count favorites belonging to a user.
    pub async fn count_by_user(&self, user_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Count favorites pointing at a product.
    pub async fn count_by_product(&self, product_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE product_id = ?")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}
