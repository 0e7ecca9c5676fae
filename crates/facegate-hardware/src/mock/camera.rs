//! Mock camera for testing and development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    HardwareError, Result,
    traits::Camera,
    types::{DeviceInfo, Frame},
};

#[derive(Debug)]
enum Capture {
    Frame(Frame),
    Failure,
}

#[derive(Debug, Default)]
struct CameraState {
    queue: VecDeque<Capture>,
    next_sequence: u64,
    open: bool,
    fail_open: bool,
    opens: usize,
    releases: usize,
    captures: usize,
}

/// Mock camera that serves queued frames.
///
/// Each queued frame gets a sequence number that tests can use to script
/// the [`MockFaceAnalyzer`](super::MockFaceAnalyzer). Once the queue is
/// empty, captures fail with a disconnection error so a runaway capture
/// loop under test terminates.
///
/// # Examples
///
/// ```
/// use facegate_hardware::mock::MockCamera;
/// use facegate_hardware::traits::Camera;
///
/// #[tokio::main]
/// async fn main() -> facegate_hardware::Result<()> {
///     let (mut camera, handle) = MockCamera::new();
///     let seq = handle.push_frame();
///
///     camera.open().await?;
///     assert_eq!(camera.capture_frame().await?.sequence, seq);
///     camera.release();
///
///     assert_eq!(handle.opens(), 1);
///     assert_eq!(handle.releases(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCamera {
    state: Arc<Mutex<CameraState>>,
}

impl MockCamera {
    /// Create a new mock camera and its control handle.
    pub fn new() -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(CameraState {
            next_sequence: 1,
            ..CameraState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockCameraHandle { state },
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CameraState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new().0
    }
}

impl Camera for MockCamera {
    async fn open(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.fail_open {
            return Err(HardwareError::initialization_failed(
                "Mock camera configured to fail",
            ));
        }
        state.opens += 1;
        state.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    async fn capture_frame(&mut self) -> Result<Frame> {
        let mut state = self.lock();
        if !state.open {
            return Err(HardwareError::disconnected("Mock camera is not open"));
        }
        state.captures += 1;
        match state.queue.pop_front() {
            Some(Capture::Frame(frame)) => Ok(frame),
            Some(Capture::Failure) => Err(HardwareError::capture_failed("Mock frame dropped")),
            None => Err(HardwareError::disconnected("Mock camera has no more frames")),
        }
    }

    fn release(&mut self) {
        let mut state = self.lock();
        if state.open {
            state.open = false;
            state.releases += 1;
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Mock Camera", "Mock Camera v1.0"))
    }
}

/// Handle for scripting and inspecting a mock camera.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut CameraState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Queue an empty 640x480 frame and return its sequence number.
    pub fn push_frame(&self) -> u64 {
        self.push_frame_with_data(Vec::new())
    }

    /// Queue a 640x480 frame carrying `data` and return its sequence number.
    pub fn push_frame_with_data(&self, data: Vec<u8>) -> u64 {
        self.with_state(|s| {
            let sequence = s.next_sequence;
            s.next_sequence += 1;
            s.queue
                .push_back(Capture::Frame(Frame::new(sequence, 640, 480, data)));
            sequence
        })
    }

    /// Queue a transient capture failure.
    pub fn push_failure(&self) {
        self.with_state(|s| s.queue.push_back(Capture::Failure));
    }

    /// Make subsequent `open` calls fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.with_state(|s| s.fail_open = fail);
    }

    /// Whether the camera is currently open.
    pub fn is_open(&self) -> bool {
        self.with_state(|s| s.open)
    }

    /// Number of successful `open` calls.
    pub fn opens(&self) -> usize {
        self.with_state(|s| s.opens)
    }

    /// Number of `release` calls that closed an open camera.
    pub fn releases(&self) -> usize {
        self.with_state(|s| s.releases)
    }

    /// Number of capture attempts.
    pub fn captures(&self) -> usize {
        self.with_state(|s| s.captures)
    }

    /// Number of frames still queued.
    pub fn pending(&self) -> usize {
        self.with_state(|s| s.queue.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_requires_open() {
        let (mut camera, handle) = MockCamera::new();
        handle.push_frame();

        assert!(camera.capture_frame().await.is_err());
        camera.open().await.unwrap();
        assert!(camera.capture_frame().await.is_ok());
    }

    #[tokio::test]
    async fn test_sequences_increase() {
        let (mut camera, handle) = MockCamera::new();
        let first = handle.push_frame();
        let second = handle.push_frame();
        assert!(second > first);

        camera.open().await.unwrap();
        assert_eq!(camera.capture_frame().await.unwrap().sequence, first);
        assert_eq!(camera.capture_frame().await.unwrap().sequence, second);
    }

    #[tokio::test]
    async fn test_failure_is_transient_and_exhaustion_is_not() {
        let (mut camera, handle) = MockCamera::new();
        handle.push_failure();
        camera.open().await.unwrap();

        let transient = camera.capture_frame().await.unwrap_err();
        assert!(transient.is_transient());

        let exhausted = camera.capture_frame().await.unwrap_err();
        assert!(!exhausted.is_transient());
        assert_eq!(handle.captures(), 2);
    }

    #[tokio::test]
    async fn test_fail_open() {
        let (mut camera, handle) = MockCamera::new();
        handle.set_fail_open(true);

        assert!(camera.open().await.is_err());
        assert!(!camera.is_open());
        assert_eq!(handle.opens(), 0);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (mut camera, handle) = MockCamera::new();
        camera.open().await.unwrap();

        camera.release();
        camera.release();

        assert_eq!(handle.releases(), 1);
        assert!(!handle.is_open());
    }
}
