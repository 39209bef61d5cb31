use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::models::Post;
use crate::listing::{Listing, Page};

const POST_COLUMNS: &str = "id, title, body, category, image, created_by, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        category: row.get(3)?,
        image: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Fields supplied when creating or editing a post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    pub category: String,
    pub image: String,
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
        params![id],
        from_row,
    )
    .optional()
}

/// Paginated listing with optional category filter.
pub fn list(conn: &Connection, listing: &Listing) -> rusqlite::Result<Page<Post>> {
    let mut filter = String::new();
    let mut args: Vec<Value> = Vec::new();
    if let Some(category) = &listing.category {
        filter.push_str(" WHERE category = ?");
        args.push(Value::Text(category.clone()));
    }
    query_page(conn, &filter, args, listing)
}

/// Case-insensitive substring match on title or body. The term must already
/// be sanitized, so it carries no LIKE wildcards.
pub fn search(conn: &Connection, term: &str, listing: &Listing) -> rusqlite::Result<Page<Post>> {
    let pattern = format!("%{}%", term);
    let filter = " WHERE (title LIKE ? OR body LIKE ?)".to_string();
    let args = vec![Value::Text(pattern.clone()), Value::Text(pattern)];
    query_page(conn, &filter, args, listing)
}

fn query_page(
    conn: &Connection,
    filter: &str,
    args: Vec<Value>,
    listing: &Listing,
) -> rusqlite::Result<Page<Post>> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts{}", filter),
        params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {} FROM posts{} ORDER BY {} LIMIT {} OFFSET {}",
        POST_COLUMNS,
        filter,
        listing.sort.order_by(),
        listing.page_size,
        listing.offset()
    );
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(args.iter()), from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(items, listing, total as u64))
}

/// Distinct non-empty categories, for the filter menu.
pub fn categories(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM posts WHERE category != '' ORDER BY category ASC",
    )?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(rows)
}

pub fn insert(conn: &Connection, input: &PostInput, created_by: &str) -> rusqlite::Result<String> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, title, body, category, image, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            input.title,
            input.body,
            input.category,
            input.image,
            created_by
        ],
    )?;
    Ok(id)
}

pub fn update(conn: &Connection, id: &str, input: &PostInput) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE posts SET title = ?1, body = ?2, category = ?3, image = ?4,
                updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
         WHERE id = ?5",
        params![input.title, input.body, input.category, input.image, id],
    )?;
    Ok(rows > 0)
}

/// Delete a post, returning its image filename if it existed.
pub fn delete(conn: &Connection, id: &str) -> rusqlite::Result<Option<String>> {
    let image: Option<String> = conn
        .query_row(
            "SELECT image FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    if image.is_some() {
        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    }
    Ok(image)
}

#[cfg(test)]
pub(crate) fn insert_at(
    conn: &Connection,
    title: &str,
    body: &str,
    category: &str,
    created_at: &str,
) -> String {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, title, body, category, image, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'img.png', ?5, ?5)",
        params![id, title, body, category, created_at],
    )
    .unwrap();
    id
}
