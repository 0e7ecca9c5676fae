//! Mock face analyzer for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use facegate_core::Embedding;

use crate::{
    HardwareError, Result,
    traits::FaceAnalyzer,
    types::{FaceRegion, Frame},
};

#[derive(Debug, Default)]
struct AnalyzerState {
    /// frame sequence -> faces in detector order
    faces: HashMap<u64, Vec<(FaceRegion, Embedding)>>,
    detections: usize,
    encodings: usize,
}

/// Mock face analyzer driven by per-frame scripts.
///
/// Frames without a script contain no faces.
///
/// # Examples
///
/// ```
/// use facegate_core::Embedding;
/// use facegate_hardware::mock::MockFaceAnalyzer;
/// use facegate_hardware::traits::FaceAnalyzer;
/// use facegate_hardware::types::{FaceRegion, Frame};
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (mut analyzer, handle) = MockFaceAnalyzer::new();
///     let region = FaceRegion::new(0, 100, 100, 0);
///     let embedding = Embedding::new(vec![0.1, 0.2]).unwrap();
///     handle.set_faces(1, vec![(region, embedding.clone())]);
///
///     let frame = Frame::new(1, 640, 480, Vec::new());
///     let regions = analyzer.detect_faces(&frame).await?;
///     assert_eq!(regions, vec![region]);
///     assert_eq!(analyzer.encode_face(&frame, &region).await?, embedding);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockFaceAnalyzer {
    state: Arc<Mutex<AnalyzerState>>,
}

impl MockFaceAnalyzer {
    /// Create a new mock analyzer and its control handle.
    pub fn new() -> (Self, MockFaceAnalyzerHandle) {
        let state = Arc::new(Mutex::new(AnalyzerState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFaceAnalyzerHandle { state },
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AnalyzerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockFaceAnalyzer {
    fn default() -> Self {
        Self::new().0
    }
}

impl FaceAnalyzer for MockFaceAnalyzer {
    async fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        let mut state = self.lock();
        state.detections += 1;
        Ok(state
            .faces
            .get(&frame.sequence)
            .map(|faces| faces.iter().map(|(region, _)| *region).collect())
            .unwrap_or_default())
    }

    async fn encode_face(&mut self, frame: &Frame, region: &FaceRegion) -> Result<Embedding> {
        let mut state = self.lock();
        state.encodings += 1;
        state
            .faces
            .get(&frame.sequence)
            .and_then(|faces| faces.iter().find(|(r, _)| r == region))
            .map(|(_, embedding)| embedding.clone())
            .ok_or_else(|| {
                HardwareError::encoding_failed(format!(
                    "no scripted face at {:?} in frame {}",
                    region, frame.sequence
                ))
            })
    }
}

/// Handle for scripting and inspecting a mock face analyzer.
#[derive(Debug, Clone)]
pub struct MockFaceAnalyzerHandle {
    state: Arc<Mutex<AnalyzerState>>,
}

impl MockFaceAnalyzerHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut AnalyzerState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Script the faces found in the frame with the given sequence number.
    pub fn set_faces(&self, sequence: u64, faces: Vec<(FaceRegion, Embedding)>) {
        self.with_state(|s| {
            s.faces.insert(sequence, faces);
        });
    }

    /// Script a single face with a default bounding box.
    pub fn set_single_face(&self, sequence: u64, embedding: Embedding) {
        self.set_faces(sequence, vec![(FaceRegion::new(100, 400, 400, 100), embedding)]);
    }

    /// Number of `detect_faces` calls.
    pub fn detections(&self) -> usize {
        self.with_state(|s| s.detections)
    }

    /// Number of `encode_face` calls.
    pub fn encodings(&self) -> usize {
        self.with_state(|s| s.encodings)
    }
}
