//! Per-session device access.
//!
//! A [`Session`] bundles mutable borrows of every peripheral a workflow needs
//! for the length of one presence session. The camera is held through a
//! [`CameraLease`], which releases it on drop so an error, an early return
//! or a cancelled future never leaves it open.

use facegate_hardware::{Camera, FaceAnalyzer, Frame, KeypadDevice, OutputDevice};
use tracing::debug;

use crate::console::Console;
use crate::error::EngineResult;

/// Scoped camera acquisition.
#[derive(Debug)]
pub struct CameraLease<'a, C: Camera> {
    camera: &'a mut C,
}

impl<'a, C: Camera> CameraLease<'a, C> {
    /// Open the camera for the duration of the lease.
    ///
    /// # Errors
    ///
    /// Returns the device error if the camera cannot be opened. The camera is
    /// released before returning.
    pub async fn acquire(camera: &'a mut C) -> EngineResult<Self> {
        if let Err(e) = camera.open().await {
            camera.release();
            return Err(e.into());
        }
        debug!("Camera acquired");
        Ok(Self { camera })
    }

    pub async fn capture(&mut self) -> facegate_hardware::Result<Frame> {
        self.camera.capture_frame().await
    }

    pub fn is_open(&self) -> bool {
        self.camera.is_open()
    }
}

impl<C: Camera> Drop for CameraLease<'_, C> {
    fn drop(&mut self) {
        self.camera.release();
        debug!("Camera released");
    }
}

/// Peripherals borrowed for one presence session.
pub struct Session<'a, C, A, K, O, T>
where
    C: Camera,
{
    pub camera: CameraLease<'a, C>,
    pub analyzer: &'a mut A,
    pub keypad: &'a mut K,
    pub outputs: &'a mut O,
    pub console: &'a mut T,
}

impl<'a, C, A, K, O, T> Session<'a, C, A, K, O, T>
where
    C: Camera,
    A: FaceAnalyzer,
    K: KeypadDevice,
    O: OutputDevice,
    T: Console,
{
    pub fn new(
        camera: CameraLease<'a, C>,
        analyzer: &'a mut A,
        keypad: &'a mut K,
        outputs: &'a mut O,
        console: &'a mut T,
    ) -> Self {
        Self {
            camera,
            analyzer,
            keypad,
            outputs,
            console,
        }
    }
}
