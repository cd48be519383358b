use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_emergency_contacts_table(conn)?;
    create_emergency_contacts_index(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the users table holding the singleton medical info record
fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            medical_info TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the emergency contacts sub-collection, addressable per contact
fn create_emergency_contacts_table(conn: &Connection) -> Result<(), String> {
    info!("Creating emergency_contacts table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS emergency_contacts (
            user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            relationship TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (user_id, id)
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Index contacts by insertion position so listing keeps the user's order
fn create_emergency_contacts_index(conn: &Connection) -> Result<(), String> {
    info!("Creating index on contact position");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_emergency_contacts_position
        ON emergency_contacts (user_id, position)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('users', 'emergency_contacts')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
