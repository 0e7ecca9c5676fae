#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{Credential, EnrolledFace, EnrollmentSummary, FaceRow};
use crate::transaction;
use facegate_core::{Identity, SecretCode};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Repository trait for the credential store.
///
/// Reads are never cached: every call goes back to the database, so a
/// verification always sees the enrollments committed before it started.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature).
pub trait CredentialRepository: Send + Sync {
    /// Load every enrolled face in enrollment order.
    async fn load_faces(&self) -> StorageResult<Vec<EnrolledFace>>;

    /// Find the secret code of an identity.
    async fn find_code(&self, identity: &Identity) -> StorageResult<Option<SecretCode>>;

    /// Check whether an identity is enrolled.
    async fn exists(&self, identity: &Identity) -> StorageResult<bool>;

    /// Append a new credential; embedding and code are written atomically.
    ///
    /// Fails with [`StorageError::Duplicate`] if the identity is enrolled.
    async fn insert(&self, credential: &Credential) -> StorageResult<()>;

    /// Write a credential, replacing any existing one for the identity.
    async fn replace(&self, credential: &Credential) -> StorageResult<()>;

    /// Enrolled identities in enrollment order, without codes.
    async fn list(&self) -> StorageResult<Vec<EnrollmentSummary>>;

    /// Number of enrolled identities.
    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of CredentialRepository
#[derive(Debug, Clone)]
pub struct SqliteCredentialRepository {
    pool: SqlitePool,
}

impl SqliteCredentialRepository {
    /// Create a new SQLite credential repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CredentialRepository for SqliteCredentialRepository {
    async fn load_faces(&self) -> StorageResult<Vec<EnrolledFace>> {
        let rows = sqlx::query_as::<_, FaceRow>(
            r#"
            SELECT seq, name, embedding, dimension, enrolled_at
            FROM face_embeddings
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let faces = rows
            .into_iter()
            .map(FaceRow::into_enrolled)
            .collect::<StorageResult<Vec<_>>>()?;
        debug!(count = faces.len(), "Enrolled faces loaded");

        Ok(faces)
    }

    async fn find_code(&self, identity: &Identity) -> StorageResult<Option<SecretCode>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT pin FROM pins WHERE name = ?")
            .bind(identity.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(pin,)| {
            SecretCode::parse(&pin).map_err(|e| StorageError::corrupt(identity.as_str(), e))
        })
        .transpose()
    }

    async fn exists(&self, identity: &Identity) -> StorageResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM face_embeddings WHERE name = ?")
            .bind(identity.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    async fn insert(&self, credential: &Credential) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        if transaction::face_exists(&mut tx, credential.identity.as_str()).await? {
            return Err(StorageError::duplicate(credential.identity.as_str()));
        }
        transaction::insert_face(&mut tx, credential).await?;
        transaction::insert_pin(&mut tx, credential).await?;

        tx.commit().await?;
        info!(identity = %credential.identity, "Credential enrolled");
        Ok(())
    }

    async fn replace(&self, credential: &Credential) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        transaction::upsert_face(&mut tx, credential).await?;
        transaction::upsert_pin(&mut tx, credential).await?;

        tx.commit().await?;
        info!(identity = %credential.identity, "Credential replaced");
        Ok(())
    }

    async fn list(&self) -> StorageResult<Vec<EnrollmentSummary>> {
        let summaries = sqlx::query_as::<_, EnrollmentSummary>(
            r#"
            SELECT f.name, f.dimension, f.enrolled_at,
                   (p.name IS NOT NULL) AS has_code
            FROM face_embeddings f
            LEFT JOIN pins p ON p.name = f.name
            ORDER BY f.seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    async fn count(&self) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM face_embeddings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
