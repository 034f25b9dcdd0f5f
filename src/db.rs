use crate::analysis::TradeSignal;
use crate::errors::{EngineError, EngineResult};
use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type DbPool = Arc<Mutex<Connection>>;

/// Days an alert record is retained for fingerprint dedup.
const RETENTION_DAYS: i64 = 3;

pub fn init_db(data_dir: &Path) -> EngineResult<DbPool> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| EngineError::Database(format!("create dir: {e}")))?;
    let db_path = data_dir.join("alpha_scout.db");
    let conn = Connection::open(&db_path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    conn.execute_batch(include_str!("../migrations/001_init.sql"))?;

    tracing::info!("database initialized at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// Alert deduplication store. All methods take the lock briefly; the scanner
/// is sequential so there is no contention to speak of.
pub struct AlertStore {
    db: DbPool,
}

impl AlertStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("../migrations/001_init.sql"))?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Short content hash of the exact contract being alerted.
    pub fn fingerprint(symbol: &str, option_kind: &str, strike: f64, expiry_date: &str) -> String {
        let digest = Sha256::digest(format!("{symbol}|{option_kind}|{strike:.2}|{expiry_date}"));
        digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
    }

    /// True when this symbol already alerted today, or this exact contract
    /// was already sent within the retention window.
    pub fn already_sent(
        &self,
        symbol: &str,
        date: NaiveDate,
        fingerprint: &str,
    ) -> EngineResult<bool> {
        let conn = self
            .db
            .lock()
            .map_err(|e| EngineError::Database(format!("lock poisoned: {e}")))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sent_alerts WHERE (symbol = ?1 AND sent_date = ?2) OR fingerprint = ?3",
            rusqlite::params![symbol, date.to_string(), fingerprint],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn record(&self, signal: &TradeSignal, fingerprint: &str) -> EngineResult<()> {
        let conn = self
            .db
            .lock()
            .map_err(|e| EngineError::Database(format!("lock poisoned: {e}")))?;

        conn.execute(
            "INSERT INTO sent_alerts (id, symbol, option_kind, strike, expiry_date, fingerprint, verdict, final_probability, sent_date, sent_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                uuid::Uuid::new_v4().to_string(),
                signal.symbol,
                signal.recommendation.strategy.option_kind().to_string(),
                signal.recommendation.strike,
                signal.recommendation.expiry_date.to_string(),
                fingerprint,
                signal.verdict.to_string(),
                signal.score.final_probability,
                signal.as_of.date_naive().to_string(),
                signal.as_of.format("%H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// Drop records older than the retention window. Returns rows removed.
    pub fn prune(&self, today: NaiveDate) -> EngineResult<usize> {
        let cutoff = today - chrono::Duration::days(RETENTION_DAYS);
        let conn = self
            .db
            .lock()
            .map_err(|e| EngineError::Database(format!("lock poisoned: {e}")))?;

        let removed = conn.execute(
            "DELETE FROM sent_alerts WHERE sent_date < ?1",
            rusqlite::params![cutoff.to_string()],
        )?;
        Ok(removed)
    }
}
