//! `tinta import-admin <file>`: seed an admin account from JSON.

use serde::Deserialize;
use std::path::Path;

use crate::auth::session;
use crate::db::models::User;
use crate::state::DbPool;

#[derive(Debug, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

pub fn read_seed(path: &Path) -> anyhow::Result<AdminSeed> {
    let content = std::fs::read_to_string(path)?;
    let seed: AdminSeed = serde_json::from_str(&content)?;
    Ok(seed)
}

/// Create the account with the role forced to admin, whatever the file says.
pub async fn import_admin(pool: &DbPool, path: &Path) -> anyhow::Result<User> {
    let seed = read_seed(path)?;
    let user = session::import_admin(pool, &seed.username, &seed.password).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Admin imported");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Role;
    use crate::db::test_pool;

    #[tokio::test]
    async fn imports_admin_ignoring_role_field() {
        let (tmp, pool) = test_pool();
        let path = tmp.path().join("admin.json");
        std::fs::write(
            &path,
            r#"{"username": "root", "password": "s3cret", "role": "user"}"#,
        )
        .unwrap();

        let user = import_admin(&pool, &path).await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.username, "root");

        // Second import of the same name is refused.
        assert!(import_admin(&pool, &path).await.is_err());
    }

    #[test]
    fn malformed_seed_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("admin.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(read_seed(&path).is_err());
        assert!(read_seed(&tmp.path().join("missing.json")).is_err());
    }
}
