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
        info!("Running migration v1 (document store)");
        conn.execute_batch(
            "
            CREATE TABLE documents (
                collection  TEXT NOT NULL,
                id          TEXT NOT NULL,
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX idx_documents_created
                ON documents(collection, created_at);

            -- Monotonic counters behind the human-facing numeric ids
            CREATE TABLE sequences (
                name    TEXT PRIMARY KEY,
                value   INTEGER NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (board_active backfill)");
        let updated = conn.execute(
            "UPDATE documents
             SET body = json_set(body, '$.board_active', json('true'))
             WHERE collection = 'projects' AND json_type(body, '$.board_active') IS NULL",
            [],
        )?;
        conn.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;
        if updated > 0 {
            info!("Put {} existing projects on the board", updated);
        }
    }

    info!("Database migrations complete");
    Ok(())
}
