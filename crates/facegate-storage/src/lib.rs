//! Credential store for the facegate access controller.
//!
//! This crate provides SQLite-backed persistence for enrolled credentials
//! (a face embedding and a secret code per identity) and for the access
//! audit trail.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`CredentialRepository`], [`AccessLogRepository`] - Data access traits
//! - [`transaction`] - Transaction-aware writes that keep both halves of a
//!   credential together
//!
//! # Data Layout
//!
//! | Table | Key | Content |
//! |-------|-----|---------|
//! | `face_embeddings` | `name` | embedding blob, dimension, enrollment order |
//! | `pins` | `name` | `pin` |
//! | `access_logs` | `id` | one row per session outcome |
//!
//! Identities are unique. Rows are appended by enrollment and replaced only
//! when the overwrite policy is configured; nothing is ever deleted.
//!
//! # Examples
//!
//! ```no_run
//! use facegate_core::{Embedding, Identity, SecretCode};
//! use facegate_storage::{Database, DatabaseConfig};
//! use facegate_storage::models::Credential;
//! use facegate_storage::repositories::{CredentialRepository, SqliteCredentialRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("facegate.db")).await?;
//! let repo = SqliteCredentialRepository::new(db.pool().clone());
//!
//! let alice = Identity::new("alice")?;
//! if !repo.exists(&alice).await? {
//!     let credential = Credential::new(
//!         alice,
//!         Embedding::new(vec![0.1, 0.2, 0.3])?,
//!         SecretCode::new("123456", 6)?,
//!     );
//!     repo.insert(&credential).await?;
//! }
//!
//! for face in repo.load_faces().await? {
//!     println!("{} ({} values)", face.identity, face.embedding.dimension());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! Secret codes are stored in clear text. Anyone who can read the database
//! file can read every code. Protect the file with filesystem permissions.
//!
//! All queries use parameterized statements via SQLx.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod transaction;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{AccessLog, AccessOutcome, Credential, EnrolledFace, EnrollmentSummary};
pub use repositories::{
    AccessLogRepository, CredentialRepository, SqliteAccessLogRepository,
    SqliteCredentialRepository,
};
