// qbtc-core/src/archive.rs
// Append-only SQLite store for Big Bang events

use qbtc_common::{ActivationTrigger, BigBangEvent};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::info;

pub struct EventArchive {
    pool: Pool<Sqlite>,
}

impl EventArchive {
    pub async fn connect(db_url: &str) -> Result<Self, sqlx::Error> {
        let in_memory = db_url.contains(":memory:");
        let mut opts = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        if !in_memory {
            opts = opts
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Every connection to :memory: is its own database, keep exactly one alive
        let mut pool_opts = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 4 });
        if in_memory {
            pool_opts = pool_opts.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bigbang_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                coherence REAL NOT NULL,
                quantum REAL NOT NULL,
                entropy REAL NOT NULL,
                duration_ms INTEGER NOT NULL,
                leverage_multiplier REAL NOT NULL,
                risk_multiplier REAL NOT NULL,
                trigger_kind TEXT NOT NULL,
                superseded INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await?;

        info!("Event archive ready at {}", db_url);
        Ok(Self { pool })
    }

    pub async fn append(&self, event: &BigBangEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bigbang_events (
                timestamp, coherence, quantum, entropy, duration_ms,
                leverage_multiplier, risk_multiplier, trigger_kind, superseded
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.timestamp)
        .bind(event.coherence)
        .bind(event.quantum)
        .bind(event.entropy)
        .bind(event.duration_ms as i64)
        .bind(event.leverage_multiplier)
        .bind(event.risk_multiplier)
        .bind(trigger_label(event.trigger))
        .bind(event.superseded)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest first
    pub async fn recent(&self, limit: u32) -> Result<Vec<BigBangEvent>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT timestamp, coherence, quantum, entropy, duration_ms,
                    leverage_multiplier, risk_multiplier, trigger_kind, superseded
             FROM bigbang_events
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .iter()
            .map(|r| BigBangEvent {
                timestamp: r.get(0),
                coherence: r.get(1),
                quantum: r.get(2),
                entropy: r.get(3),
                duration_ms: r.get::<i64, _>(4).max(0) as u64,
                leverage_multiplier: r.get(5),
                risk_multiplier: r.get(6),
                trigger: parse_trigger(r.get::<&str, _>(7)),
                superseded: r.get(8),
            })
            .collect();
        Ok(events)
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) FROM bigbang_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}

fn trigger_label(trigger: ActivationTrigger) -> &'static str {
    match trigger {
        ActivationTrigger::Threshold => "threshold",
        ActivationTrigger::Manual => "manual",
    }
}

fn parse_trigger(label: &str) -> ActivationTrigger {
    match label {
        "manual" => ActivationTrigger::Manual,
        _ => ActivationTrigger::Threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ts: i64, trigger: ActivationTrigger, superseded: bool) -> BigBangEvent {
        BigBangEvent {
            timestamp: ts,
            coherence: 0.95,
            quantum: 0.99,
            entropy: 0.6,
            duration_ms: 646_558,
            leverage_multiplier: 1.5,
            risk_multiplier: 2.0,
            trigger,
            superseded,
        }
    }

    #[tokio::test]
    async fn test_append_and_read_back_newest_first() {
        let archive = EventArchive::connect("sqlite::memory:").await.unwrap();
        archive.append(&event(1_000, ActivationTrigger::Threshold, false)).await.unwrap();
        archive.append(&event(2_000, ActivationTrigger::Manual, true)).await.unwrap();

        assert_eq!(archive.count().await.unwrap(), 2);

        let recent = archive.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0], event(2_000, ActivationTrigger::Manual, true));
        assert_eq!(recent[1], event(1_000, ActivationTrigger::Threshold, false));

        assert_eq!(archive.recent(1).await.unwrap().len(), 1);
    }
}
