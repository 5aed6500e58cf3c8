//! Versioned, transactional schema migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreResult;

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_session_messages",
        "CREATE TABLE IF NOT EXISTS session_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            tool_calls TEXT,
            tool_call_id TEXT,
            name TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_session_messages_session
            ON session_messages(session_id, created_at);",
    ),
    (
        "0002_vector_records",
        "CREATE TABLE IF NOT EXISTS vector_records (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );",
    ),
    (
        "0003_schema_meta",
        "CREATE TABLE IF NOT EXISTS schema_meta (
            version INTEGER NOT NULL
        );",
    ),
];

/// Run every migration not yet recorded in `schema_meta`, each inside its
/// own transaction.
pub fn run_all(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (version INTEGER NOT NULL);",
    )?;

    let applied: i64 = conn
        .query_row("SELECT count(*) FROM schema_meta", [], |row| row.get(0))
        .unwrap_or(0);

    if applied as usize >= MIGRATIONS.len() {
        return Ok(());
    }

    for (i, (name, sql)) in MIGRATIONS.iter().enumerate() {
        if (i as i64) < applied {
            continue;
        }
        info!(migration = name, "applying migration");
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO schema_meta (version) VALUES (?1)", [i as i64])?;
    }

    Ok(())
}
