//! Mock device implementations for testing and development.
//!
//! Every mock comes with a handle that scripts its behaviour and counts the
//! calls made on it, so tests can assert that a device was never touched.

pub mod analyzer;
pub mod camera;
pub mod keypad;
pub mod outputs;
pub mod ranger;

pub use analyzer::{MockFaceAnalyzer, MockFaceAnalyzerHandle};
pub use camera::{MockCamera, MockCameraHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use outputs::{MockOutputs, MockOutputsHandle, OutputEvent};
pub use ranger::{MOCK_OUT_OF_RANGE_CM, MockRanger, MockRangerHandle};
