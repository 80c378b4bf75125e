use anyhow::Context;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, Row, Transaction,
};

use crate::model::{Advertisement, AdvertisementId, NewAdvertisement};
use crate::store::traits::{Store, StoreError, StoreResult, StoreSession};

const SELECT_COLUMNS: &str = "id, title, description, owner, created_at";

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    type Session = PostgresSession;

    async fn open_session(&self) -> StoreResult<PostgresSession> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        Ok(PostgresSession {
            pool: self.pool.clone(),
            tx: Some(tx),
        })
    }
}

/// One transaction at a time; a new one is begun lazily after each commit.
pub struct PostgresSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresSession {
    async fn transaction(&mut self) -> StoreResult<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self
                .pool
                .begin()
                .await
                .context("Failed to begin transaction")?,
        };
        Ok(self.tx.insert(tx))
    }
}

#[async_trait::async_trait]
impl StoreSession for PostgresSession {
    async fn get(&mut self, id: AdvertisementId) -> StoreResult<Option<Advertisement>> {
        let tx = self.transaction().await?;
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM advertisements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify(e, "Failed to fetch advertisement"))?;

        Ok(row.as_ref().map(row_to_advertisement))
    }

    async fn add(&mut self, advertisement: NewAdvertisement) -> StoreResult<Advertisement> {
        let tx = self.transaction().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO advertisements (title, description, owner) VALUES ($1, $2, $3) RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&advertisement.title)
        .bind(&advertisement.description)
        .bind(&advertisement.owner)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| classify(e, "Failed to insert advertisement"))?;

        Ok(row_to_advertisement(&row))
    }

    async fn save(&mut self, advertisement: &Advertisement) -> StoreResult<bool> {
        let tx = self.transaction().await?;
        let result = sqlx::query(
            "UPDATE advertisements SET title = $2, description = $3, owner = $4 WHERE id = $1",
        )
        .bind(advertisement.id)
        .bind(&advertisement.title)
        .bind(&advertisement.description)
        .bind(&advertisement.owner)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify(e, "Failed to update advertisement"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&mut self, advertisement: &Advertisement) -> StoreResult<()> {
        let tx = self.transaction().await?;
        sqlx::query("DELETE FROM advertisements WHERE id = $1")
            .bind(advertisement.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| classify(e, "Failed to delete advertisement"))?;

        Ok(())
    }

    async fn commit(&mut self) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit()
                .await
                .map_err(|e| classify(e, "Failed to commit transaction"))?;
        }
        Ok(())
    }

    async fn close(self) -> StoreResult<()> {
        if let Some(tx) = self.tx {
            tx.rollback()
                .await
                .context("Failed to roll back transaction")?;
        }
        Ok(())
    }
}

fn row_to_advertisement(row: &PgRow) -> Advertisement {
    Advertisement {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        owner: row.get("owner"),
        created_at: row.get("created_at"),
    }
}

fn classify(err: sqlx::Error, action: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(db_err.message().to_string());
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context(action))
}
