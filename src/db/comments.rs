use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Comment, CommentView};

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        "SELECT id, post_id, text, created_by, created_at, updated_at
         FROM comments WHERE id = ?1",
        params![id],
        |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                text: row.get(2)?,
                created_by: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    )
    .optional()
}

/// Comments on a post, oldest first, with the author's current username.
pub fn list_for_post(conn: &Connection, post_id: &str) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.created_by, u.username, c.created_at
         FROM comments c
         JOIN users u ON u.id = c.created_by
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                text: row.get(1)?,
                created_by: row.get(2)?,
                author: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(comments)
}

pub fn insert(
    conn: &Connection,
    post_id: &str,
    text: &str,
    created_by: &str,
) -> rusqlite::Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO comments (id, post_id, text, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![id, post_id, text, created_by],
    )?;
    Ok(id)
}

/// Only the text and update time change; `created_by` is never rewritten.
pub fn update_text(conn: &Connection, id: &str, text: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE comments SET text = ?1, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
         WHERE id = ?2",
        params![text, id],
    )?;
    Ok(rows > 0)
}

pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}
