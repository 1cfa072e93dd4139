use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (logs)");
        conn.execute_batch(
            "
            CREATE TABLE logs (
                id          TEXT PRIMARY KEY,
                timestamp   TEXT NOT NULL,
                status      TEXT NOT NULL,
                details     TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_logs_timestamp ON logs(timestamp);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
