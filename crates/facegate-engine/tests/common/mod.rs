//! Shared fixtures for engine integration tests.
//!
//! The repositories here keep state in memory so tests can run on a paused
//! clock; the SQLite store is exercised separately in `sqlite_end_to_end`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use facegate_core::{Embedding, Identity, SecretCode};
use facegate_engine::console::{ScriptedConsole, ScriptedConsoleHandle};
use facegate_engine::{AccessController, ControllerConfig, Devices};
use facegate_hardware::mock::{
    MockCamera, MockCameraHandle, MockFaceAnalyzer, MockFaceAnalyzerHandle, MockKeypad,
    MockKeypadHandle, MockOutputs, MockOutputsHandle, MockRanger, MockRangerHandle,
};
use facegate_storage::{
    AccessLog, AccessLogRepository, AccessOutcome, Credential, CredentialRepository,
    EnrolledFace, EnrollmentSummary, StorageError, StorageResult,
};

pub fn embedding(values: &[f64]) -> Embedding {
    Embedding::new(values.to_vec()).unwrap()
}

pub fn credential(name: &str, values: &[f64], code: &str) -> Credential {
    Credential::new(
        Identity::new(name).unwrap(),
        embedding(values),
        SecretCode::new(code, code.len()).unwrap(),
    )
}

#[derive(Debug, Default)]
struct CredentialState {
    rows: Vec<(Credential, DateTime<Utc>)>,
    loads: usize,
    code_lookups: usize,
    writes: usize,
}

/// In-memory credential store that counts reads and writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentials {
    state: Arc<Mutex<CredentialState>>,
}

impl MemoryCredentials {
    fn with_state<T>(&self, f: impl FnOnce(&mut CredentialState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Seed a credential without counting it as a write.
    pub fn seed(&self, name: &str, values: &[f64], code: &str) {
        let credential = credential(name, values, code);
        self.with_state(|s| s.rows.push((credential, Utc::now())));
    }

    pub fn credentials(&self) -> Vec<Credential> {
        self.with_state(|s| s.rows.iter().map(|(c, _)| c.clone()).collect())
    }

    pub fn get(&self, name: &str) -> Option<Credential> {
        self.credentials()
            .into_iter()
            .find(|c| c.identity.as_str() == name)
    }

    pub fn loads(&self) -> usize {
        self.with_state(|s| s.loads)
    }

    pub fn code_lookups(&self) -> usize {
        self.with_state(|s| s.code_lookups)
    }

    pub fn writes(&self) -> usize {
        self.with_state(|s| s.writes)
    }
}

impl CredentialRepository for MemoryCredentials {
    async fn load_faces(&self) -> StorageResult<Vec<EnrolledFace>> {
        Ok(self.with_state(|s| {
            s.loads += 1;
            s.rows
                .iter()
                .map(|(c, at)| EnrolledFace {
                    identity: c.identity.clone(),
                    embedding: c.embedding.clone(),
                    enrolled_at: *at,
                })
                .collect()
        }))
    }

    async fn find_code(&self, identity: &Identity) -> StorageResult<Option<SecretCode>> {
        Ok(self.with_state(|s| {
            s.code_lookups += 1;
            s.rows
                .iter()
                .find(|(c, _)| &c.identity == identity)
                .map(|(c, _)| c.code.clone())
        }))
    }

    async fn exists(&self, identity: &Identity) -> StorageResult<bool> {
        Ok(self.with_state(|s| s.rows.iter().any(|(c, _)| &c.identity == identity)))
    }

    async fn insert(&self, credential: &Credential) -> StorageResult<()> {
        self.with_state(|s| {
            if s.rows.iter().any(|(c, _)| c.identity == credential.identity) {
                return Err(StorageError::duplicate(credential.identity.as_str()));
            }
            s.writes += 1;
            s.rows.push((credential.clone(), Utc::now()));
            Ok(())
        })
    }

    async fn replace(&self, credential: &Credential) -> StorageResult<()> {
        self.with_state(|s| {
            s.writes += 1;
            match s
                .rows
                .iter_mut()
                .find(|(c, _)| c.identity == credential.identity)
            {
                Some((existing, _)) => *existing = credential.clone(),
                None => s.rows.push((credential.clone(), Utc::now())),
            }
            Ok(())
        })
    }

    async fn list(&self) -> StorageResult<Vec<EnrollmentSummary>> {
        Ok(self.with_state(|s| {
            s.rows
                .iter()
                .map(|(c, at)| EnrollmentSummary {
                    name: c.identity.to_string(),
                    dimension: c.embedding.dimension() as i64,
                    enrolled_at: *at,
                    has_code: true,
                })
                .collect()
        }))
    }

    async fn count(&self) -> StorageResult<i64> {
        Ok(self.with_state(|s| s.rows.len() as i64))
    }
}

/// In-memory access log.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessLog {
    entries: Arc<Mutex<Vec<AccessLog>>>,
}

impl MemoryAccessLog {
    pub fn entries(&self) -> Vec<AccessLog> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn outcomes(&self) -> Vec<AccessOutcome> {
        self.entries()
            .iter()
            .filter_map(AccessLog::get_outcome)
            .collect()
    }
}

impl AccessLogRepository for MemoryAccessLog {
    async fn create(&self, log: &AccessLog) -> StorageResult<i64> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut log = log.clone();
        log.id = entries.len() as i64 + 1;
        entries.push(log);
        Ok(entries.len() as i64)
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<AccessLog>> {
        Ok(self
            .entries()
            .into_iter()
            .rev()
            .take(limit as usize)
            .collect())
    }

    async fn find_by_identity(&self, identity: &str, limit: i64) -> StorageResult<Vec<AccessLog>> {
        Ok(self
            .entries()
            .into_iter()
            .rev()
            .filter(|l| l.identity.as_deref() == Some(identity))
            .take(limit as usize)
            .collect())
    }

    async fn find_by_outcome(
        &self,
        outcome: AccessOutcome,
        limit: i64,
    ) -> StorageResult<Vec<AccessLog>> {
        Ok(self
            .entries()
            .into_iter()
            .rev()
            .filter(|l| l.outcome == outcome.as_str())
            .take(limit as usize)
            .collect())
    }

    async fn count_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64> {
        Ok(self
            .entries()
            .iter()
            .filter(|l| l.timestamp >= start && l.timestamp <= end)
            .count() as i64)
    }
}

/// Mock peripherals for driving a workflow directly.
pub struct Peripherals {
    pub camera: MockCamera,
    pub analyzer: MockFaceAnalyzer,
    pub keypad: MockKeypad,
    pub outputs: MockOutputs,
    pub console: ScriptedConsole,
}

/// Handles for scripting [`Peripherals`] and the controller.
#[derive(Clone)]
pub struct Rig {
    pub ranger: MockRangerHandle,
    pub camera: MockCameraHandle,
    pub analyzer: MockFaceAnalyzerHandle,
    pub keypad: MockKeypadHandle,
    pub outputs: MockOutputsHandle,
    pub console: ScriptedConsoleHandle,
    pub credentials: MemoryCredentials,
    pub logs: MemoryAccessLog,
}

impl Rig {
    /// Queue a frame holding a single face.
    pub fn single_face_frame(&self, values: &[f64]) -> u64 {
        let sequence = self.camera.push_frame();
        self.analyzer.set_single_face(sequence, embedding(values));
        sequence
    }
}

pub fn peripherals() -> (Peripherals, Rig) {
    let (_, ranger) = MockRanger::new();
    let (camera, camera_handle) = MockCamera::new();
    let (analyzer, analyzer_handle) = MockFaceAnalyzer::new();
    let (keypad, keypad_handle) = MockKeypad::new();
    let (outputs, outputs_handle) = MockOutputs::new();
    let (console, console_handle) = ScriptedConsole::new();

    (
        Peripherals {
            camera,
            analyzer,
            keypad,
            outputs,
            console,
        },
        Rig {
            ranger,
            camera: camera_handle,
            analyzer: analyzer_handle,
            keypad: keypad_handle,
            outputs: outputs_handle,
            console: console_handle,
            credentials: MemoryCredentials::default(),
            logs: MemoryAccessLog::default(),
        },
    )
}

pub type TestController = AccessController<
    MockRanger,
    MockKeypad,
    MockOutputs,
    MockCamera,
    MockFaceAnalyzer,
    ScriptedConsole,
    MemoryCredentials,
    MemoryAccessLog,
>;

/// Controller wired to mocks and in-memory repositories.
pub fn controller(config: ControllerConfig) -> (TestController, Rig) {
    let (ranger, ranger_handle) = MockRanger::new();
    let (p, mut rig) = peripherals();
    rig.ranger = ranger_handle;

    let controller = AccessController::new(
        Devices {
            ranger,
            keypad: p.keypad,
            outputs: p.outputs,
            camera: p.camera,
            analyzer: p.analyzer,
        },
        p.console,
        rig.credentials.clone(),
        rig.logs.clone(),
        config,
    )
    .unwrap();

    (controller, rig)
}
