use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, microposts, relationships)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                email               TEXT NOT NULL UNIQUE COLLATE NOCASE,
                encrypted_password  TEXT NOT NULL,
                salt                TEXT NOT NULL,
                admin               INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE microposts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_microposts_user_created
                ON microposts(user_id, created_at);

            CREATE TABLE relationships (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL,
                UNIQUE(follower_id, followed_id),
                CHECK(follower_id <> followed_id)
            );

            -- follower_id lookups use the UNIQUE index; this covers the reverse direction
            CREATE INDEX idx_relationships_followed
                ON relationships(followed_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
