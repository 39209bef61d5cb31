use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Role, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role,
        created_at: row.get(4)?,
    })
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        from_row,
    )
    .optional()
}

/// Exact, case-sensitive username lookup.
pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
        params![username],
        from_row,
    )
    .optional()
}

/// Whether `username` belongs to a user other than `except_id`.
pub fn username_taken_by_other(
    conn: &Connection,
    username: &str,
    except_id: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 AND id != ?2",
        params![username, except_id],
        |row| row.get(0),
    )
}

/// Insert a user. A duplicate username fails with a UNIQUE constraint error.
pub fn insert(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<User> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users (id, username, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![id, username, password_hash, role.as_str()],
    )?;
    find_by_id(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn update_username(conn: &Connection, id: &str, username: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE users SET username = ?1 WHERE id = ?2",
        params![username, id],
    )?;
    Ok(rows > 0)
}
