//! Enrollment workflow: capture one face, collect a code, persist both.

use facegate_core::Identity;
use facegate_core::constants::{
    MSG_CAPTURE_FAILED, MSG_MULTIPLE_FACES, MSG_NO_FACE, MSG_PIN_ENTRY_FAILED, PROMPT_CAPTURE,
};
use facegate_hardware::{Camera, FaceAnalyzer, KeypadDevice, OutputDevice};
use facegate_storage::{Credential, CredentialRepository, StorageError};
use tracing::{debug, info, warn};

use crate::code_entry::{CodeEntry, CodeEntryCollector};
use crate::config::DuplicatePolicy;
use crate::console::Console;
use crate::error::EngineResult;
use crate::feedback::Feedback;
use crate::outcome::SessionOutcome;
use crate::session::Session;

/// Registers one new credential per invocation.
///
/// The capture loop retries until a triggered frame holds exactly one face
/// and code entry completes. Nothing is written until both halves of the
/// credential exist, and both are written in one transaction.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentWorkflow {
    collector: CodeEntryCollector,
    feedback: Feedback,
    duplicate_policy: DuplicatePolicy,
}

impl EnrollmentWorkflow {
    pub fn new(
        collector: CodeEntryCollector,
        feedback: Feedback,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        Self {
            collector,
            feedback,
            duplicate_policy,
        }
    }

    /// Enroll `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for a permanent camera or analyzer failure, a store
    /// failure, or a console failure. Detection ambiguity and cancelled code
    /// entry are retried, not returned.
    pub async fn run<C, A, K, O, T, R>(
        &self,
        session: &mut Session<'_, C, A, K, O, T>,
        store: &R,
        name: &str,
    ) -> EngineResult<SessionOutcome>
    where
        C: Camera,
        A: FaceAnalyzer,
        K: KeypadDevice,
        O: OutputDevice,
        T: Console,
        R: CredentialRepository,
    {
        let identity = match Identity::new(name) {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "Rejected enrollment name");
                let outcome = SessionOutcome::InvalidIdentity {
                    input: name.to_string(),
                };
                session.console.message(&outcome.message()).await?;
                self.feedback.failure(session.outputs).await;
                return Ok(outcome);
            }
        };

        let replace = if store.exists(&identity).await? {
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    info!(identity = %identity, "Identity already enrolled, rejecting");
                    let outcome = SessionOutcome::DuplicateIdentity { identity };
                    session.console.message(&outcome.message()).await?;
                    self.feedback.failure(session.outputs).await;
                    return Ok(outcome);
                }
                DuplicatePolicy::Overwrite => {
                    info!(identity = %identity, "Identity already enrolled, will overwrite");
                    true
                }
            }
        } else {
            false
        };

        session.console.message(PROMPT_CAPTURE).await?;

        loop {
            let frame = match session.camera.capture().await {
                Ok(frame) => frame,
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Frame capture failed, retrying");
                    session.console.message(MSG_CAPTURE_FAILED).await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if !session.console.capture_trigger().await? {
                continue;
            }

            let faces = match session.analyzer.detect_faces(&frame).await {
                Ok(faces) => faces,
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Face detection failed, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let region = match faces.as_slice() {
                [region] => *region,
                [] => {
                    session
                        .console
                        .message(&format!("{MSG_NO_FACE}. Please try again."))
                        .await?;
                    self.feedback.failure(session.outputs).await;
                    continue;
                }
                _ => {
                    debug!(count = faces.len(), "Ambiguous enrollment frame");
                    session
                        .console
                        .message(&format!(
                            "{MSG_MULTIPLE_FACES}. Please ensure only one face is visible."
                        ))
                        .await?;
                    self.feedback.failure(session.outputs).await;
                    continue;
                }
            };

            let embedding = session.analyzer.encode_face(&frame, &region).await?;

            let code = match self
                .collector
                .collect(session.keypad, session.console)
                .await?
            {
                CodeEntry::Complete(code) => code,
                CodeEntry::Cancelled(reason) => {
                    debug!(?reason, "Enrollment code entry cancelled, embedding discarded");
                    session
                        .console
                        .message(&format!("{MSG_PIN_ENTRY_FAILED}. Try again."))
                        .await?;
                    self.feedback.failure(session.outputs).await;
                    continue;
                }
            };

            let credential = Credential::new(identity.clone(), embedding, code);
            if replace {
                store.replace(&credential).await?;
            } else {
                match store.insert(&credential).await {
                    Ok(()) => {}
                    Err(StorageError::Duplicate { .. }) => {
                        let outcome = SessionOutcome::DuplicateIdentity { identity };
                        session.console.message(&outcome.message()).await?;
                        self.feedback.failure(session.outputs).await;
                        return Ok(outcome);
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            info!(
                identity = %identity,
                dimension = credential.embedding.dimension(),
                code_length = credential.code.len(),
                replaced = replace,
                "Credential enrolled"
            );
            let outcome = SessionOutcome::Enrolled {
                identity,
                replaced: replace,
            };
            session.console.message(&outcome.message()).await?;
            self.feedback.success(session.outputs).await;
            return Ok(outcome);
        }
    }
}
