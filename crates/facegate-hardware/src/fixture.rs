//! File-backed camera and face analyzer for running on a development host.
//!
//! [`FixtureCamera`] serves the files of a directory as frames, in file name
//! order, cycling back to the first after the last. [`FixtureAnalyzer`]
//! reads each frame payload as a JSON face fixture:
//!
//! ```json
//! {
//!   "faces": [
//!     { "region": { "top": 80, "right": 320, "bottom": 300, "left": 120 },
//!       "embedding": [0.12, -0.03, 0.44] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use facegate_core::Embedding;
use serde::Deserialize;
use tracing::debug;

use crate::{
    HardwareError, Result,
    traits::{Camera, FaceAnalyzer},
    types::{DeviceInfo, FaceRegion, Frame},
};

/// Reported frame width.
pub const FIXTURE_FRAME_WIDTH: u32 = 640;

/// Reported frame height.
pub const FIXTURE_FRAME_HEIGHT: u32 = 480;

/// Camera that replays the files of a directory.
#[derive(Debug)]
pub struct FixtureCamera {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
    open: bool,
}

impl FixtureCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            cursor: 0,
            sequence: 0,
            open: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            HardwareError::initialization_failed(format!(
                "cannot read fixture directory {}: {e}",
                dir.display()
            ))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl Camera for FixtureCamera {
    async fn open(&mut self) -> Result<()> {
        let files = Self::list_files(&self.dir).await?;
        if files.is_empty() {
            return Err(HardwareError::initialization_failed(format!(
                "no fixture frames in {}",
                self.dir.display()
            )));
        }
        debug!(dir = %self.dir.display(), frames = files.len(), "Fixture camera opened");
        self.files = files;
        self.cursor = 0;
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn capture_frame(&mut self) -> Result<Frame> {
        if !self.open {
            return Err(HardwareError::disconnected("Fixture camera is not open"));
        }
        let path = self.files[self.cursor % self.files.len()].clone();
        self.cursor = (self.cursor + 1) % self.files.len();

        let data = tokio::fs::read(&path).await.map_err(|e| {
            HardwareError::capture_failed(format!("{}: {e}", path.display()))
        })?;
        self.sequence += 1;
        debug!(frame = %path.display(), sequence = self.sequence, "Fixture frame captured");

        Ok(Frame::new(
            self.sequence,
            FIXTURE_FRAME_WIDTH,
            FIXTURE_FRAME_HEIGHT,
            data,
        ))
    }

    fn release(&mut self) {
        self.open = false;
        self.files.clear();
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Fixture Camera", "Directory replay")
            .with_location(self.dir.display().to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct FixtureDocument {
    #[serde(default)]
    faces: Vec<FixtureFace>,
}

#[derive(Debug, Deserialize)]
struct FixtureFace {
    region: FaceRegion,
    embedding: Embedding,
}

/// Face analyzer that decodes JSON face fixtures.
#[derive(Debug, Default)]
pub struct FixtureAnalyzer;

impl FixtureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn parse(frame: &Frame) -> Result<FixtureDocument> {
        serde_json::from_slice(&frame.data).map_err(|e| {
            HardwareError::detection_failed(format!(
                "frame {} is not a face fixture: {e}",
                frame.sequence
            ))
        })
    }
}

impl FaceAnalyzer for FixtureAnalyzer {
    async fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>> {
        Ok(Self::parse(frame)?
            .faces
            .into_iter()
            .map(|face| face.region)
            .collect())
    }

    async fn encode_face(&mut self, frame: &Frame, region: &FaceRegion) -> Result<Embedding> {
        Self::parse(frame)?
            .faces
            .into_iter()
            .find(|face| face.region == *region)
            .map(|face| face.embedding)
            .ok_or_else(|| {
                HardwareError::encoding_failed(format!(
                    "frame {} has no face at {region:?}",
                    frame.sequence
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ONE_FACE: &str = r#"{"faces":[{"region":{"top":1,"right":9,"bottom":9,"left":1},"embedding":[0.5,0.25]}]}"#;
    const NO_FACE: &str = r#"{"faces":[]}"#;

    fn fixture_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_camera_cycles_in_name_order() {
        let dir = fixture_dir(&[("b.json", NO_FACE), ("a.json", ONE_FACE)]);
        let mut camera = FixtureCamera::new(dir.path());
        camera.open().await.unwrap();

        let first = camera.capture_frame().await.unwrap();
        let second = camera.capture_frame().await.unwrap();
        let third = camera.capture_frame().await.unwrap();

        assert_eq!(first.data, ONE_FACE.as_bytes());
        assert_eq!(second.data, NO_FACE.as_bytes());
        assert_eq!(third.data, ONE_FACE.as_bytes());
        assert_eq!(third.sequence, 3);
    }

    #[tokio::test]
    async fn test_camera_empty_dir_fails_to_open() {
        let dir = fixture_dir(&[]);
        let mut camera = FixtureCamera::new(dir.path());

        assert!(matches!(
            camera.open().await,
            Err(HardwareError::InitializationFailed { .. })
        ));
        assert!(!camera.is_open());
    }

    #[tokio::test]
    async fn test_camera_release() {
        let dir = fixture_dir(&[("a.json", NO_FACE)]);
        let mut camera = FixtureCamera::new(dir.path());
        camera.open().await.unwrap();
        camera.release();

        assert!(!camera.is_open());
        assert!(camera.capture_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_analyzer_reads_fixture() {
        let mut analyzer = FixtureAnalyzer::new();
        let frame = Frame::new(1, 640, 480, ONE_FACE.as_bytes().to_vec());

        let regions = analyzer.detect_faces(&frame).await.unwrap();
        assert_eq!(regions, vec![FaceRegion::new(1, 9, 9, 1)]);

        let embedding = analyzer.encode_face(&frame, &regions[0]).await.unwrap();
        assert_eq!(embedding.as_slice(), &[0.5, 0.25]);
    }

    #[tokio::test]
    async fn test_analyzer_rejects_garbage() {
        let mut analyzer = FixtureAnalyzer::new();
        let frame = Frame::new(1, 640, 480, b"\x89PNG".to_vec());

        assert!(matches!(
            analyzer.detect_faces(&frame).await,
            Err(HardwareError::DetectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyzer_rejects_empty_embedding() {
        let mut analyzer = FixtureAnalyzer::new();
        let body = r#"{"faces":[{"region":{"top":0,"right":1,"bottom":1,"left":0},"embedding":[]}]}"#;
        let frame = Frame::new(1, 640, 480, body.as_bytes().to_vec());

        assert!(analyzer.detect_faces(&frame).await.is_err());
    }
}
