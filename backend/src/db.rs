//! SQLite schema bootstrap.

use crate::config;
use rusqlite::Connection;

pub fn open() -> Result<Connection, String> {
    Connection::open(config::database_path()).map_err(|e| e.to_string())
}

pub fn init() -> Result<(), String> {
    let conn = open()?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS excel_template_reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            template_file_path TEXT,
            template_filename TEXT,
            structure TEXT,
            mappings TEXT NOT NULL DEFAULT '{}',
            is_public INTEGER NOT NULL DEFAULT 0,
            share_token TEXT UNIQUE,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT
        );
        CREATE TABLE IF NOT EXISTS visualizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            metabase_question_id INTEGER,
            database_id INTEGER,
            query_type TEXT NOT NULL DEFAULT 'native',
            native_query TEXT,
            mbql_query TEXT,
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .map_err(|e| e.to_string())
}
