use crate::{
    Result,
    constants::{MAX_CODE_LENGTH, MAX_IDENTITY_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Human-readable name that keys a credential.
///
/// Names are trimmed before validation. Comparison is exact (case-sensitive),
/// matching how the store keys its records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create a new identity with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the trimmed name is empty, longer
    /// than [`MAX_IDENTITY_LENGTH`] characters, or contains control characters
    /// or path separators.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::InvalidIdentity("name must not be empty".to_string()));
        }

        let len = name.chars().count();
        if len > MAX_IDENTITY_LENGTH {
            return Err(Error::InvalidIdentity(format!(
                "name must be at most {MAX_IDENTITY_LENGTH} chars, got {len}"
            )));
        }

        if name
            .chars()
            .any(|c| c.is_control() || c == '/' || c == '\\')
        {
            return Err(Error::InvalidIdentity(
                "name must not contain control characters or path separators".to_string(),
            ));
        }

        Ok(Identity(name.to_string()))
    }

    /// Get the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identity::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Identity::new(&value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

/// Numeric secret bound to an identity.
///
/// # Security
/// Codes are stored in clear text by the credential store. This type only
/// guards against accidental disclosure through `Debug` output and timing
/// differences during comparison; it is not a substitute for hashing.
#[derive(Clone, Eq)]
pub struct SecretCode(String);

impl SecretCode {
    /// Create a code that must have exactly `length` digits.
    ///
    /// # Errors
    /// Returns `Error::InvalidCode` if the code is empty, contains a non-digit
    /// or has a length other than `length`.
    pub fn new(code: &str, length: usize) -> Result<Self> {
        let code = Self::parse(code)?;
        if code.len() != length {
            return Err(Error::InvalidCode(format!(
                "code must be exactly {length} digits, got {}",
                code.len()
            )));
        }
        Ok(code)
    }

    /// Parse a stored code without enforcing a particular length.
    ///
    /// Codes enrolled under a different configured length remain loadable;
    /// they simply never compare equal to an entry of the current length.
    ///
    /// # Errors
    /// Returns `Error::InvalidCode` if the code is empty, longer than
    /// [`MAX_CODE_LENGTH`] or contains a non-digit.
    pub fn parse(code: &str) -> Result<Self> {
        if code.is_empty() {
            return Err(Error::InvalidCode("code must not be empty".to_string()));
        }
        if code.len() > MAX_CODE_LENGTH {
            return Err(Error::InvalidCode(format!(
                "code must be at most {MAX_CODE_LENGTH} digits, got {}",
                code.len()
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidCode("code must be numeric".to_string()));
        }
        Ok(SecretCode(code.to_string()))
    }

    /// Build a code from individual digit values (0-9).
    ///
    /// # Errors
    /// Returns `Error::InvalidCode` if any value is greater than 9 or the
    /// slice is empty.
    pub fn from_digits(digits: &[u8]) -> Result<Self> {
        if let Some(bad) = digits.iter().find(|d| **d > 9) {
            return Err(Error::InvalidCode(format!("digit must be 0-9, got {bad}")));
        }
        let code: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        Self::parse(&code)
    }

    /// Get the code as a string slice.
    ///
    /// Only the credential store and comparison paths should need this.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Number of digits in the code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed code; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Constant-time comparison, so a wrong code takes as long to reject no
/// matter which digit differs.
impl PartialEq for SecretCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for SecretCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretCode({} digits)", self.0.len())
    }
}

/// Fixed-length face descriptor produced by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Embedding(Vec<f64>);

impl Embedding {
    /// Create an embedding with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidEmbedding` if the vector is empty or holds a
    /// non-finite value.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidEmbedding(
                "embedding must not be empty".to_string(),
            ));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidEmbedding(format!(
                "non-finite value at index {pos}"
            )));
        }
        Ok(Embedding(values))
    }

    /// Number of components.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Borrow the components.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance to another embedding.
    ///
    /// # Errors
    /// Returns `Error::DimensionMismatch` if the embeddings differ in length.
    pub fn distance_to(&self, other: &Embedding) -> Result<f64> {
        if self.dimension() != other.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        let sum: f64 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Ok(sum.sqrt())
    }

    /// Serialize as little-endian `f64` words.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Decode little-endian `f64` words.
    ///
    /// # Errors
    /// Returns `Error::InvalidEmbedding` if the byte length is not a multiple
    /// of 8 or the decoded vector fails [`Embedding::new`] validation.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(Error::InvalidEmbedding(format!(
                "byte length {} is not a multiple of 8",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                f64::from_le_bytes(word)
            })
            .collect();
        Embedding::new(values)
    }
}

impl TryFrom<Vec<f64>> for Embedding {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Embedding::new(values)
    }
}

impl From<Embedding> for Vec<f64> {
    fn from(embedding: Embedding) -> Self {
        embedding.0
    }
}

/// Closest enrolled identity for a captured embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Enrolled identity with the minimum distance.
    pub identity: Identity,

    /// Euclidean distance between the live and enrolled embeddings.
    pub distance: f64,
}

impl MatchResult {
    pub fn new(identity: Identity, distance: f64) -> Self {
        Self { identity, distance }
    }

    /// Returns `true` if the distance is strictly below `threshold`.
    #[inline]
    #[must_use]
    pub fn is_accepted(&self, threshold: f64) -> bool {
        self.distance < threshold
    }
}

/// Operation chosen at the start of a presence session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Register,
    Unlock,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkflowKind::Register => write!(f, "register"),
            WorkflowKind::Unlock => write!(f, "unlock"),
        }
    }
}

impl std::str::FromStr for WorkflowKind {
    type Err = Error;

    /// Parse an operator selection; surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "register" => Ok(WorkflowKind::Register),
            "unlock" => Ok(WorkflowKind::Unlock),
            other => Err(Error::Config(format!("unknown workflow: {other:?}"))),
        }
    }
}
