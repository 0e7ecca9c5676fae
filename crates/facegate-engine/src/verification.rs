//! Verification workflow: one capture, nearest match, then the code.

use facegate_core::constants::{MSG_NO_FACES_REGISTERED, MSG_PIN_ENTRY_FAILED};
use facegate_hardware::{Camera, FaceAnalyzer, KeypadDevice, OutputDevice};
use facegate_storage::CredentialRepository;
use tracing::{debug, info, warn};

use crate::code_entry::{CodeEntry, CodeEntryCollector};
use crate::config::FacePolicy;
use crate::console::Console;
use crate::error::EngineResult;
use crate::feedback::Feedback;
use crate::matcher::best_match;
use crate::outcome::SessionOutcome;
use crate::session::Session;

/// Single-shot verification of one presence trigger.
#[derive(Debug, Clone, Copy)]
pub struct VerificationWorkflow {
    collector: CodeEntryCollector,
    feedback: Feedback,
    match_threshold: f64,
    face_policy: FacePolicy,
}

impl VerificationWorkflow {
    pub fn new(
        collector: CodeEntryCollector,
        feedback: Feedback,
        match_threshold: f64,
        face_policy: FacePolicy,
    ) -> Self {
        Self {
            collector,
            feedback,
            match_threshold,
            face_policy,
        }
    }

    /// Run one verification attempt.
    ///
    /// Enrolled faces are loaded fresh on every call. An empty store fails
    /// before the camera is touched.
    ///
    /// # Errors
    ///
    /// Returns an error for a camera, analyzer, store or console failure.
    pub async fn run<C, A, K, O, T, R>(
        &self,
        session: &mut Session<'_, C, A, K, O, T>,
        store: &R,
    ) -> EngineResult<SessionOutcome>
    where
        C: Camera,
        A: FaceAnalyzer,
        K: KeypadDevice,
        O: OutputDevice,
        T: Console,
        R: CredentialRepository,
    {
        let enrolled = store.load_faces().await?;
        if enrolled.is_empty() {
            info!("Verification requested with no enrolled faces");
            session.console.message(MSG_NO_FACES_REGISTERED).await?;
            return Ok(SessionOutcome::NoFacesRegistered);
        }
        debug!(enrolled = enrolled.len(), "Loaded enrolled faces");

        let frame = session.camera.capture().await?;
        self.feedback.scanning(session.outputs).await;

        let faces = session.analyzer.detect_faces(&frame).await?;
        let region = match (faces.as_slice(), self.face_policy) {
            ([], _) => return self.fail(session, SessionOutcome::NoFace).await,
            ([_, _, ..], FacePolicy::RejectMultiple) => {
                debug!(count = faces.len(), "Rejecting ambiguous frame");
                return self.fail(session, SessionOutcome::MultipleFaces).await;
            }
            ([first, ..], _) => {
                if faces.len() > 1 {
                    debug!(count = faces.len(), "Evaluating first detected face only");
                }
                *first
            }
        };

        let probe = session.analyzer.encode_face(&frame, &region).await?;

        let Some(candidate) = best_match(&probe, &enrolled) else {
            warn!(
                dimension = probe.dimension(),
                "No enrolled face is comparable with the probe"
            );
            return self.fail(session, SessionOutcome::NoMatch { best: None }).await;
        };

        if !candidate.is_accepted(self.match_threshold) {
            info!(
                candidate = %candidate.identity,
                distance = candidate.distance,
                threshold = self.match_threshold,
                "Closest face above match threshold"
            );
            return self
                .fail(session, SessionOutcome::NoMatch { best: Some(candidate) })
                .await;
        }

        session
            .console
            .message(&format!("Detected: {}", candidate.identity))
            .await?;

        let entered = match self
            .collector
            .collect(session.keypad, session.console)
            .await?
        {
            CodeEntry::Complete(code) => code,
            CodeEntry::Cancelled(reason) => {
                session.console.message(MSG_PIN_ENTRY_FAILED).await?;
                self.feedback.failure(session.outputs).await;
                return Ok(SessionOutcome::CodeEntryCancelled {
                    identity: candidate.identity,
                    reason,
                });
            }
        };

        let stored = store.find_code(&candidate.identity).await?;
        let verified = stored.is_some_and(|stored| stored == entered);
        if verified {
            let outcome = SessionOutcome::Granted {
                identity: candidate.identity,
                distance: candidate.distance,
            };
            session.console.message(&outcome.message()).await?;
            self.feedback.grant(session.outputs).await;
            Ok(outcome)
        } else {
            self.fail(
                session,
                SessionOutcome::Denied {
                    identity: candidate.identity,
                },
            )
            .await
        }
    }

    async fn fail<C, A, K, O, T>(
        &self,
        session: &mut Session<'_, C, A, K, O, T>,
        outcome: SessionOutcome,
    ) -> EngineResult<SessionOutcome>
    where
        C: Camera,
        A: FaceAnalyzer,
        K: KeypadDevice,
        O: OutputDevice,
        T: Console,
    {
        session.console.message(&outcome.message()).await?;
        self.feedback.failure(session.outputs).await;
        Ok(outcome)
    }
}
