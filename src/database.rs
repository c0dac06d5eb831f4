use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::PersistenceError;
use crate::model::{CoinSnapshot, HistoryPoint};

pub const DEFAULT_HISTORY_LIMIT: u32 = 24;

/// History store backed by a single `history` table.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `database_url` and make sure the schema exists.
    pub async fn new(database_url: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                coin_id TEXT NOT NULL,
                name TEXT NOT NULL,
                symbol TEXT NOT NULL,
                price REAL NOT NULL,
                market_cap REAL NOT NULL,
                change_24h REAL NOT NULL,
                ts_ms INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER) * 1000)
            );
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_coin_ts ON history(coin_id ASC, ts_ms DESC);")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// Store one record per coin, all stamped with `timestamp`. The batch is
    /// written in order inside a single transaction, so either every record
    /// lands or none do.
    pub async fn append_snapshot(
        &self,
        timestamp: DateTime<Utc>,
        coins: &[CoinSnapshot],
    ) -> Result<usize, PersistenceError> {
        let ts_ms = timestamp.timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for coin in coins {
            if coin.name.trim().is_empty() {
                return Err(missing(coin, "name"));
            }
            if coin.symbol.trim().is_empty() {
                return Err(missing(coin, "symbol"));
            }
            let market_cap = coin.market_cap.ok_or_else(|| missing(coin, "market_cap"))?;
            let change_24h = coin
                .price_change_percentage_24h
                .ok_or_else(|| missing(coin, "price_change_percentage_24h"))?;

            sqlx::query(
                "INSERT INTO history (coin_id, name, symbol, price, market_cap, change_24h, ts_ms) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&coin.id)
            .bind(&coin.name)
            .bind(&coin.symbol)
            .bind(coin.current_price)
            .bind(market_cap)
            .bind(change_24h)
            .bind(ts_ms)
            .execute(&mut *tx)
            .await?;

            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }

    /// The `limit` most recent records for `coin_id`, returned oldest first.
    pub async fn query_history(
        &self,
        coin_id: &str,
        limit: u32,
    ) -> Result<Vec<HistoryPoint>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT price, change_24h, ts_ms
            FROM history
            WHERE coin_id = ?
            ORDER BY ts_ms DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(coin_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let ts_ms: i64 = row.get("ts_ms");
            history.push(HistoryPoint {
                price: row.get("price"),
                timestamp: DateTime::from_timestamp_millis(ts_ms)
                    .ok_or(PersistenceError::InvalidTimestamp(ts_ms))?,
                change_24h: row.get("change_24h"),
            });
        }

        history.reverse();
        Ok(history)
    }

    /// Current pool state; no round-trip to the database.
    pub fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn missing(coin: &CoinSnapshot, field: &'static str) -> PersistenceError {
    PersistenceError::MissingField {
        coin_id: coin.id.clone(),
        field,
    }
}
