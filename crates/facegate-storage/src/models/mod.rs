pub mod access_log;
pub mod credential;

pub use access_log::{AccessLog, AccessOutcome};
pub use credential::{Credential, EnrolledFace, EnrollmentSummary, FaceRow};
