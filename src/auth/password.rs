use crate::error::AppResult;

const BCRYPT_COST: u32 = 10;

/// Hash off the async runtime; bcrypt is deliberately slow.
pub async fn hash(password: &str) -> AppResult<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("hash task failed: {}", e)))??;
    Ok(hashed)
}

pub async fn verify(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("verify task failed: {}", e)))??;
    Ok(ok)
}
