use sqlx::sqlite::SqlitePool;

/// Product listings. Only the slice the auth subsystem depends on lives
/// here: account deletion cascades through `delete_all_owned_by` before the
/// identity row is removed.
#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: String,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a product listing. Returns the product ID.
    pub async fn create(
        &self,
        owner_id: i64,
        title: &str,
        price: i64,
        currency: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO products (owner_id, title, price, currency) VALUES (?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(title)
        .bind(price)
        .bind(currency)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a product by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        let row: Option<Product> = sqlx::query_as(
            "SELECT id, owner_id, title, description, price, currency FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Count a user's listings.
    pub async fn count_by_owner(&self, owner_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Delete every product a user owns. Favorites rows pointing at those
    /// products go with them via the schema's ON DELETE CASCADE.
    pub async fn delete_all_owned_by(&self, owner_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
