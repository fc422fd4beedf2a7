//! Catalog and purchase-history store backed by SQLite.
//!
//! The store is an explicit object passed into the retrieval pipeline; the
//! retrieval core never reaches for ambient global state. Purchase histories
//! are append-only: recording a purchase a user already made is a no-op.

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::config::DbConfig;
use crate::migrate;
use crate::models::{Product, PurchaseRecord};

const POOL_SIZE: u32 = 5;

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the SQLite database at the configured path, creating the file
    /// and its parent directory on first use.
    pub async fn open(db: &DbConfig) -> Result<Self> {
        if let Some(parent) = db.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db.path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(POOL_SIZE)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        migrate::run_migrations(&self.pool).await
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    // ============ Catalog ============

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, category, description, price, tags_json FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, category, description, price, tags_json FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    pub async fn insert_product(&self, product: &Product) -> Result<()> {
        let tags_json = serde_json::to_string(&product.tags)?;
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO products (id, name, category, description, price, tags_json)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(&tags_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ============ Purchases ============

    /// All purchase histories: users ordered by id, each user's products in
    /// insert order. The deterministic ordering keeps co-purchase aggregation
    /// reproducible across rebuilds.
    pub async fn list_purchases(&self) -> Result<Vec<PurchaseRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id AS user_id, u.username, p.product_id
            FROM users u
            LEFT JOIN purchases p ON p.user_id = u.id
            ORDER BY u.id, p.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records: Vec<PurchaseRecord> = Vec::new();
        for row in &rows {
            let user_id: String = row.get("user_id");
            let username: String = row.get("username");
            let product_id: Option<String> = row.get("product_id");

            if records.last().map(|r| r.user_id.as_str()) != Some(user_id.as_str()) {
                records.push(PurchaseRecord {
                    user_id,
                    username,
                    product_ids: Vec::new(),
                });
            }
            if let Some(pid) = product_id {
                // unwrap is safe: a record was pushed for this row above
                records.last_mut().unwrap().product_ids.push(pid);
            }
        }

        Ok(records)
    }

    /// Find a user by name, case-insensitively. Returns (user_id, username).
    pub async fn get_user_by_name(&self, username: &str) -> Result<Option<(String, String)>> {
        let row = sqlx::query("SELECT id, username FROM users WHERE username = ? COLLATE NOCASE")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| (r.get("id"), r.get("username"))))
    }

    pub async fn purchases_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let rows =
            sqlx::query("SELECT product_id FROM purchases WHERE user_id = ? ORDER BY rowid")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(|r| r.get("product_id")).collect())
    }

    /// Record a purchase for a user, creating the user if absent.
    ///
    /// The append is idempotent: a product id already present in the user's
    /// history is not duplicated. Returns the updated purchase record.
    pub async fn record_purchase(&self, username: &str, product_id: &str) -> Result<PurchaseRecord> {
        let (user_id, username) = match self.get_user_by_name(username).await? {
            Some(existing) => existing,
            None => {
                let id = self.next_user_id().await?;
                sqlx::query("INSERT INTO users (id, username) VALUES (?, ?)")
                    .bind(&id)
                    .bind(username)
                    .execute(&self.pool)
                    .await?;
                (id, username.to_string())
            }
        };

        sqlx::query(
            "INSERT OR IGNORE INTO purchases (user_id, product_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&user_id)
        .bind(product_id)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        let product_ids = self.purchases_for_user(&user_id).await?;
        Ok(PurchaseRecord {
            user_id,
            username,
            product_ids,
        })
    }

    /// Next available user id (U001, U002, ...), following the seed data's
    /// naming scheme.
    async fn next_user_id(&self) -> Result<String> {
        let rows = sqlx::query("SELECT id FROM users")
            .fetch_all(&self.pool)
            .await?;

        let max_num = rows
            .iter()
            .filter_map(|r| {
                let id: String = r.get("id");
                id.strip_prefix('U').and_then(|n| n.parse::<u32>().ok())
            })
            .max()
            .unwrap_or(0);

        Ok(format!("U{:03}", max_num + 1))
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    let tags_json: String = row.get("tags_json");
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
    Ok(Product {
        id: row.get("id"),
        name: row.get("name"),
        category: row.get("category"),
        description: row.get("description"),
        price: row.get("price"),
        tags,
    })
}
