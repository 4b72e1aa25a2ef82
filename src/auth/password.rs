//! bcrypt hashing, moved off the async workers.

use crate::database::models::ModelResult;

pub async fn hash(plain: &str) -> ModelResult<String> {
    let plain = plain.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, bcrypt::DEFAULT_COST)).await??;
    Ok(hashed)
}

/// False on mismatch. Errors only when the stored hash is malformed.
pub async fn verify(plain: &str, hashed: &str) -> ModelResult<bool> {
    let plain = plain.to_owned();
    let hashed = hashed.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hashed)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash("hunter2").await.unwrap();
        assert_ne!(hashed, "hunter2");
        assert!(verify("hunter2", &hashed).await.unwrap());
        assert!(!verify("hunter3", &hashed).await.unwrap());
    }
}
