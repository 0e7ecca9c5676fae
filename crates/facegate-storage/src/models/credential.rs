use chrono::{DateTime, Utc};
use facegate_core::{Embedding, Identity, SecretCode};
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// A complete credential as written by enrollment.
///
/// Both halves are persisted together or not at all; see
/// [`transaction`](crate::transaction).
#[derive(Debug, Clone)]
pub struct Credential {
    pub identity: Identity,
    pub embedding: Embedding,
    pub code: SecretCode,
}

impl Credential {
    pub fn new(identity: Identity, embedding: Embedding, code: SecretCode) -> Self {
        Self {
            identity,
            embedding,
            code,
        }
    }
}

/// Raw row of the `face_embeddings` table.
///
/// The embedding is stored as little-endian `f64` values.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaceRow {
    /// Enrollment order
    pub seq: i64,
    pub name: String,
    pub embedding: Vec<u8>,
    pub dimension: i64,
    pub enrolled_at: DateTime<Utc>,
}

impl FaceRow {
    /// Decode the row into domain types, checking the stored dimension.
    pub fn into_enrolled(self) -> StorageResult<EnrolledFace> {
        let identity =
            Identity::new(&self.name).map_err(|e| StorageError::corrupt(&self.name, e))?;
        let embedding = Embedding::from_le_bytes(&self.embedding)
            .map_err(|e| StorageError::corrupt(&self.name, e))?;

        if embedding.dimension() as i64 != self.dimension {
            return Err(StorageError::corrupt(
                &self.name,
                format!(
                    "stored dimension {} but blob holds {} values",
                    self.dimension,
                    embedding.dimension()
                ),
            ));
        }

        Ok(EnrolledFace {
            identity,
            embedding,
            enrolled_at: self.enrolled_at,
        })
    }
}

/// An enrolled `(identity, embedding)` pair, as loaded for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledFace {
    pub identity: Identity,
    pub embedding: Embedding,
    pub enrolled_at: DateTime<Utc>,
}

/// Listing entry for an enrolled identity. Never carries the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EnrollmentSummary {
    pub name: String,
    pub dimension: i64,
    pub enrolled_at: DateTime<Utc>,
    pub has_code: bool,
}
