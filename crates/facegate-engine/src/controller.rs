//! Access session controller.
//!
//! The controller owns every peripheral and runs the top-level loop:
//! poll presence while idle, and on presence acquire the camera, ask the
//! operator for a workflow, run it, then release the camera and go back to
//! idle. Every session ends at a single exit point where the outcome is
//! logged, written to the access log and fed to the lockout counter.

use std::future::Future;

use chrono::Utc;
use facegate_core::WorkflowKind;
use facegate_core::constants::{MSG_PRESENCE_DETECTED, PROMPT_IDENTITY, PROMPT_WORKFLOW};
use facegate_hardware::{
    Camera, DeviceInfo, DistanceSensor, FaceAnalyzer, KeypadDevice, OutputDevice,
};
use facegate_storage::{AccessLog, AccessLogRepository, CredentialRepository};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::code_entry::CodeEntryCollector;
use crate::config::ControllerConfig;
use crate::console::Console;
use crate::enrollment::EnrollmentWorkflow;
use crate::error::{EngineError, EngineResult};
use crate::feedback::Feedback;
use crate::lockout::LockoutTracker;
use crate::outcome::SessionOutcome;
use crate::presence::PresenceMonitor;
use crate::session::{CameraLease, Session};
use crate::state_machine::{SessionState, StateMachine};
use crate::verification::VerificationWorkflow;

/// The peripherals a controller drives.
#[derive(Debug)]
pub struct Devices<S, K, O, C, A> {
    pub ranger: S,
    pub keypad: K,
    pub outputs: O,
    pub camera: C,
    pub analyzer: A,
}

/// Top-level access controller.
///
/// # Examples
///
/// ```no_run
/// use facegate_engine::{AccessController, ControllerConfig, Devices};
/// use facegate_engine::console::ScriptedConsole;
/// use facegate_hardware::mock::{MockCamera, MockFaceAnalyzer, MockKeypad, MockOutputs, MockRanger};
/// use facegate_storage::{Database, SqliteAccessLogRepository, SqliteCredentialRepository};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let devices = Devices {
///     ranger: MockRanger::new().0,
///     keypad: MockKeypad::new().0,
///     outputs: MockOutputs::new().0,
///     camera: MockCamera::new().0,
///     analyzer: MockFaceAnalyzer::new().0,
/// };
///
/// let mut controller = AccessController::new(
///     devices,
///     ScriptedConsole::new().0,
///     SqliteCredentialRepository::new(db.pool().clone()),
///     SqliteAccessLogRepository::new(db.pool().clone()),
///     ControllerConfig::default(),
/// )?;
///
/// controller.run_until(tokio::signal::ctrl_c()).await?;
/// # Ok(())
/// # }
/// ```
pub struct AccessController<S, K, O, C, A, T, R, L> {
    presence: PresenceMonitor<S>,
    keypad: K,
    outputs: O,
    camera: C,
    analyzer: A,
    console: T,
    credentials: R,
    access_log: L,
    config: ControllerConfig,
    feedback: Feedback,
    enrollment: EnrollmentWorkflow,
    verification: VerificationWorkflow,
    machine: StateMachine,
    lockout: LockoutTracker,
    active_workflow: Option<WorkflowKind>,
}

impl<S, K, O, C, A, T, R, L> AccessController<S, K, O, C, A, T, R, L>
where
    S: DistanceSensor,
    K: KeypadDevice,
    O: OutputDevice,
    C: Camera,
    A: FaceAnalyzer,
    T: Console,
    R: CredentialRepository,
    L: AccessLogRepository,
{
    /// Build a controller.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the configuration is invalid.
    pub fn new(
        devices: Devices<S, K, O, C, A>,
        console: T,
        credentials: R,
        access_log: L,
        config: ControllerConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let feedback = Feedback::new(config.feedback);
        let collector = CodeEntryCollector::from_config(&config);

        Ok(Self {
            presence: PresenceMonitor::new(devices.ranger, config.proximity_threshold_cm),
            keypad: devices.keypad,
            outputs: devices.outputs,
            camera: devices.camera,
            analyzer: devices.analyzer,
            console,
            credentials,
            access_log,
            feedback,
            enrollment: EnrollmentWorkflow::new(collector, feedback, config.duplicate_policy),
            verification: VerificationWorkflow::new(
                collector,
                feedback,
                config.match_threshold,
                config.face_policy,
            ),
            machine: StateMachine::new(),
            lockout: LockoutTracker::new(config.lockout),
            active_workflow: None,
            config,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        *self.machine.current_state()
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Identify the ranger, keypad, outputs and camera, in that order.
    ///
    /// A device that cannot report its identity is left out.
    pub async fn device_inventory(&self) -> Vec<DeviceInfo> {
        let reports = [
            self.presence.sensor().get_info().await,
            self.keypad.get_info().await,
            self.outputs.get_info().await,
            self.camera.get_info().await,
        ];

        reports
            .into_iter()
            .filter_map(|report| match report {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(error = %e, "Device did not report its identity");
                    None
                }
            })
            .collect()
    }

    /// Poll presence once and, if a subject is in range, run a full session.
    ///
    /// Returns `Ok(None)` after an idle interval when nobody is present.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InputClosed`] when the operator input ends.
    /// The session is still cleaned up and recorded first.
    pub async fn step(&mut self) -> EngineResult<Option<SessionOutcome>> {
        if self.lockout.is_locked() {
            if self.presence.poll().await {
                self.active_workflow = None;
                let outcome = SessionOutcome::LockedOut;
                self.announce(&outcome).await;
                self.feedback.failure(&mut self.outputs).await;
                self.record(&outcome).await;
                return Ok(Some(outcome));
            }
            sleep(self.config.idle_interval).await;
            return Ok(None);
        }

        if !self.presence.poll().await {
            debug!("No one detected in range");
            sleep(self.config.idle_interval).await;
            return Ok(None);
        }

        self.run_session().await.map(Some)
    }

    /// Run one presence session from camera acquisition back to idle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InputClosed`] when the operator input ends.
    pub async fn run_session(&mut self) -> EngineResult<SessionOutcome> {
        info!("Presence detected, starting session");
        self.active_workflow = None;

        let (outcome, closed) = match self.session_inner().await {
            Ok(outcome) => (outcome, false),
            Err(e) => {
                let closed = matches!(e, EngineError::InputClosed);
                error!(error = %e, "Session aborted");
                let outcome = SessionOutcome::Aborted {
                    reason: e.to_string(),
                };
                self.announce(&outcome).await;
                self.feedback.failure(&mut self.outputs).await;
                (outcome, closed)
            }
        };

        self.return_to_idle();
        info!(
            workflow = ?self.active_workflow,
            outcome = outcome.access_outcome().as_str(),
            identity = outcome.identity().map(|i| i.as_str()),
            "Session finished"
        );
        self.record(&outcome).await;
        self.lockout.record(&outcome);

        if closed {
            return Err(EngineError::InputClosed);
        }
        Ok(outcome)
    }

    /// Run until `shutdown` resolves, then switch every output off.
    ///
    /// A session interrupted by `shutdown` is dropped at its current await
    /// point; the camera is released by its lease.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InputClosed`] when the operator input ends.
    pub async fn run_until<F>(&mut self, shutdown: F) -> EngineResult<()>
    where
        F: Future,
    {
        info!(
            threshold_cm = self.presence.threshold_cm(),
            "Access controller running"
        );
        for device in self.device_inventory().await {
            info!(%device, "Device ready");
        }
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                step = self.step() => {
                    if let Err(e) = step {
                        break Err(e);
                    }
                }
            }
        };

        self.shutdown().await;
        result
    }

    /// De-assert outputs, release the camera and reset to idle.
    pub async fn shutdown(&mut self) {
        self.feedback.all_off(&mut self.outputs).await;
        self.camera.release();
        if self.state() != SessionState::Idle {
            self.machine.reset();
        }
        info!("Access controller stopped");
    }

    async fn session_inner(&mut self) -> EngineResult<SessionOutcome> {
        self.console.message(MSG_PRESENCE_DETECTED).await?;
        self.machine.transition_to(SessionState::AwaitingCamera)?;

        let lease = CameraLease::acquire(&mut self.camera).await?;
        let mut session = Session::new(
            lease,
            &mut self.analyzer,
            &mut self.keypad,
            &mut self.outputs,
            &mut self.console,
        );

        let selection = session
            .console
            .prompt(PROMPT_WORKFLOW)
            .await?
            .ok_or(EngineError::InputClosed)?;

        let kind = match selection.parse::<WorkflowKind>() {
            Ok(kind) => kind,
            Err(_) => {
                let outcome = SessionOutcome::InvalidSelection {
                    input: selection.trim().to_string(),
                };
                session.console.message(&outcome.message()).await?;
                self.feedback.failure(session.outputs).await;
                return Ok(outcome);
            }
        };

        self.active_workflow = Some(kind);
        self.machine.transition_to(SessionState::InWorkflow)?;
        debug!(workflow = %kind, "Workflow selected");

        match kind {
            WorkflowKind::Register => {
                let name = session
                    .console
                    .prompt(PROMPT_IDENTITY)
                    .await?
                    .ok_or(EngineError::InputClosed)?;
                self.enrollment
                    .run(&mut session, &self.credentials, &name)
                    .await
            }
            WorkflowKind::Unlock => {
                session
                    .console
                    .message("System is active and scanning for faces.")
                    .await?;
                self.verification.run(&mut session, &self.credentials).await
            }
        }
    }

    fn return_to_idle(&mut self) {
        if self.state() == SessionState::Idle {
            return;
        }
        if let Err(e) = self.machine.transition_to(SessionState::Idle) {
            warn!(error = %e, "Forcing state machine reset");
            self.machine.reset();
        }
    }

    async fn announce(&mut self, outcome: &SessionOutcome) {
        if let Err(e) = self.console.message(&outcome.message()).await {
            warn!(error = %e, "Failed to show session message");
        }
    }

    async fn record(&self, outcome: &SessionOutcome) {
        let entry = AccessLog::new(
            outcome.identity().map(|i| i.to_string()),
            self.active_workflow.map(|k| k.to_string()),
            outcome.access_outcome(),
            outcome.message(),
            Utc::now(),
        );
        if let Err(e) = self.access_log.create(&entry).await {
            warn!(error = %e, "Failed to write access log entry");
        }
    }
}
