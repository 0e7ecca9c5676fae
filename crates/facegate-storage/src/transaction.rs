//! Transaction-aware credential writes.
//!
//! A credential is two rows in two tables: the face embedding and the code.
//! These functions take an open SQLite transaction so enrollment writes both
//! rows or neither.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use facegate_core::{Embedding, Identity, SecretCode};
//! use facegate_storage::{Database, DatabaseConfig, transaction};
//! use facegate_storage::models::Credential;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("facegate.db")).await?;
//! let credential = Credential::new(
//!     Identity::new("alice")?,
//!     Embedding::new(vec![0.1, 0.2, 0.3])?,
//!     SecretCode::new("123456", 6)?,
//! );
//!
//! let mut tx = db.pool().begin().await?;
//! transaction::insert_face(&mut tx, &credential).await?;
//! transaction::insert_pin(&mut tx, &credential).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Dropping the transaction without committing rolls both writes back.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use crate::error::{StorageError, StorageResult};
use crate::models::Credential;

fn map_unique(err: sqlx::Error, identity: &str) -> StorageError {
    let err = StorageError::from(err);
    if err.is_unique_violation() {
        StorageError::duplicate(identity)
    } else {
        err
    }
}

/// Whether the identity has an embedding row, seen from inside `tx`.
pub async fn face_exists(tx: &mut Transaction<'_, Sqlite>, identity: &str) -> StorageResult<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT seq FROM face_embeddings WHERE name = ?")
        .bind(identity)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

/// Append a new embedding row.
///
/// # Errors
///
/// Returns [`StorageError::Duplicate`] if the identity is already enrolled.
pub async fn insert_face(
    tx: &mut Transaction<'_, Sqlite>,
    credential: &Credential,
) -> StorageResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO face_embeddings (name, embedding, dimension, enrolled_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(credential.identity.as_str())
    .bind(credential.embedding.to_le_bytes())
    .bind(credential.embedding.dimension() as i64)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_unique(e, credential.identity.as_str()))?;

    Ok(result.last_insert_rowid())
}

/// Append a new code row.
///
/// # Errors
///
/// Returns [`StorageError::Duplicate`] if the identity already has a code.
pub async fn insert_pin(
    tx: &mut Transaction<'_, Sqlite>,
    credential: &Credential,
) -> StorageResult<()> {
    sqlx::query("INSERT INTO pins (name, pin) VALUES (?, ?)")
        .bind(credential.identity.as_str())
        .bind(credential.code.expose())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_unique(e, credential.identity.as_str()))?;

    Ok(())
}

/// Insert or replace the embedding row.
///
/// A replaced identity keeps its original enrollment position.
pub async fn upsert_face(
    tx: &mut Transaction<'_, Sqlite>,
    credential: &Credential,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO face_embeddings (name, embedding, dimension, enrolled_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (name) DO UPDATE SET
            embedding = excluded.embedding,
            dimension = excluded.dimension,
            enrolled_at = excluded.enrolled_at
        "#,
    )
    .bind(credential.identity.as_str())
    .bind(credential.embedding.to_le_bytes())
    .bind(credential.embedding.dimension() as i64)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Insert or replace the code row.
pub async fn upsert_pin(
    tx: &mut Transaction<'_, Sqlite>,
    credential: &Credential,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pins (name, pin) VALUES (?, ?)
        ON CONFLICT (name) DO UPDATE SET pin = excluded.pin
        "#,
    )
    .bind(credential.identity.as_str())
    .bind(credential.code.expose())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
