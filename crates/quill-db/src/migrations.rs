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
        info!("Store: running migration v1 (messages, peers, chat state)");
        conn.execute_batch(
            "
            CREATE TABLE peers (
                peer_namespace  INTEGER NOT NULL,
                peer_id         INTEGER NOT NULL,
                title           TEXT NOT NULL,
                PRIMARY KEY (peer_namespace, peer_id)
            );

            CREATE TABLE messages (
                peer_namespace      INTEGER NOT NULL,
                peer_id             INTEGER NOT NULL,
                namespace           INTEGER NOT NULL,
                id                  INTEGER NOT NULL,
                globally_unique_id  INTEGER,
                timestamp           INTEGER NOT NULL,
                incoming            INTEGER NOT NULL,
                tags                TEXT NOT NULL DEFAULT '[]',
                forward_info        TEXT,
                author_id           TEXT,
                text                TEXT NOT NULL DEFAULT '',
                attributes          TEXT NOT NULL DEFAULT '[]',
                media               TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (peer_namespace, peer_id, namespace, id)
            );

            CREATE TABLE peer_chat_states (
                peer_namespace  INTEGER NOT NULL,
                peer_id         INTEGER NOT NULL,
                state           TEXT NOT NULL,
                PRIMARY KEY (peer_namespace, peer_id)
            );

            CREATE TABLE peer_cached_data (
                peer_namespace  INTEGER NOT NULL,
                peer_id         INTEGER NOT NULL,
                data            TEXT NOT NULL,
                PRIMARY KEY (peer_namespace, peer_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            "
        )?;
    }

    if version < 2 {
        info!("Store: running migration v2 (pending actions, outgoing queues)");
        conn.execute_batch(
            "
            CREATE TABLE pending_message_actions (
                kind            TEXT NOT NULL,
                peer_namespace  INTEGER NOT NULL,
                peer_id         INTEGER NOT NULL,
                namespace       INTEGER NOT NULL,
                id              INTEGER NOT NULL,
                action          TEXT NOT NULL,
                PRIMARY KEY (kind, peer_namespace, peer_id, namespace, id)
            );

            CREATE TABLE secret_outgoing_operations (
                seq             INTEGER PRIMARY KEY AUTOINCREMENT,
                peer_namespace  INTEGER NOT NULL,
                peer_id         INTEGER NOT NULL,
                operation       TEXT NOT NULL
            );

            CREATE INDEX idx_secret_outgoing_peer
                ON secret_outgoing_operations(peer_namespace, peer_id, seq);

            CREATE TABLE synchronize_consume_jobs (
                seq             INTEGER PRIMARY KEY AUTOINCREMENT,
                message_ids     TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (2);
            "
        )?;
    }

    Ok(())
}
