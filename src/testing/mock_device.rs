//! Scriptable in-memory camera
//!
//! Writes real files into a scratch directory so the media store and the
//! photo compressor see genuine JPEG and container bytes.

use super::synthetic_data::{synthetic_jpeg, synthetic_video_bytes};
use crate::device::{CaptureDevice, PhotoRequest, RawCapture, VideoRequest};
use crate::errors::DeviceError;
use crate::types::{FlashMode, FocusPoint, LensFacing};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::time::Instant;

/// Count of each device primitive the session invoked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub photos: usize,
    pub starts: usize,
    pub stops: usize,
    pub flash: Vec<FlashMode>,
    pub lens: Vec<LensFacing>,
    pub focus: usize,
}

#[derive(Debug, Default)]
struct MockState {
    photo_size: (u32, u32),
    picture_sizes: Vec<String>,
    fail_next_photo: bool,
    fail_next_start: bool,
    fail_next_stop: bool,
    empty_next_stop: bool,
    fail_controls: bool,
    recording_since: Option<Instant>,
    start_gate: Option<Arc<Notify>>,
    control_gate: Option<Arc<Notify>>,
    calls: MockCalls,
    video_requests: Vec<VideoRequest>,
    last_focus: Option<FocusPoint>,
}

/// Camera double for tests and the CLI demo
#[derive(Debug)]
pub struct MockDevice {
    dir: PathBuf,
    state: Mutex<MockState>,
}

impl MockDevice {
    /// Device writing its temporary captures into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            state: Mutex::new(MockState {
                photo_size: (320, 240),
                picture_sizes: vec![
                    "640x480".to_string(),
                    "1280x720".to_string(),
                    "1920x1080".to_string(),
                    "4032x3024".to_string(),
                ],
                ..MockState::default()
            }),
        }
    }

    pub fn with_photo_size(self, width: u32, height: u32) -> Self {
        self.state().photo_size = (width, height);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn set_picture_sizes(&self, sizes: Vec<String>) {
        self.state().picture_sizes = sizes;
    }

    pub fn fail_next_photo(&self) {
        self.state().fail_next_photo = true;
    }

    pub fn fail_next_start(&self) {
        self.state().fail_next_start = true;
    }

    pub fn fail_next_stop(&self) {
        self.state().fail_next_stop = true;
    }

    /// Next stop succeeds but yields no file
    pub fn empty_next_stop(&self) {
        self.state().empty_next_stop = true;
    }

    /// Make flash, lens and focus calls fail until reset
    pub fn fail_controls(&self, fail: bool) {
        self.state().fail_controls = fail;
    }

    /// Hold `start_recording` until the returned gate is notified.
    pub fn hold_recording_start(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().start_gate = Some(gate.clone());
        gate
    }

    /// Hold the next flash or lens call until the returned gate is notified.
    pub fn hold_next_control(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().control_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> MockCalls {
        self.state().calls.clone()
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        self.state().video_requests.clone()
    }

    pub fn last_focus(&self) -> Option<FocusPoint> {
        self.state().last_focus
    }

    pub fn is_recording(&self) -> bool {
        self.state().recording_since.is_some()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scratch_path(&self, extension: &str) -> PathBuf {
        self.dir
            .join(format!("mock-{}.{}", uuid::Uuid::new_v4(), extension))
    }

    async fn write_scratch(&self, path: &Path, bytes: &[u8]) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| format!("scratch dir: {}", e))?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| format!("write {}: {}", path.display(), e))
    }

    async fn wait_control_gate(&self) {
        let gate = self.state().control_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn control(&self) -> Result<MutexGuard<'_, MockState>, DeviceError> {
        let state = self.state();
        if state.fail_controls {
            return Err(DeviceError::Control("mock control failure".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl CaptureDevice for MockDevice {
    async fn take_photo(&self, _request: &PhotoRequest) -> Result<RawCapture, DeviceError> {
        let (width, height) = {
            let mut state = self.state();
            state.calls.photos += 1;
            if std::mem::take(&mut state.fail_next_photo) {
                return Err(DeviceError::Capture("mock shutter failure".to_string()));
            }
            state.photo_size
        };

        let bytes = synthetic_jpeg(width, height, 92).map_err(|e| DeviceError::Capture(e.to_string()))?;
        let path = self.scratch_path("jpg");
        self.write_scratch(&path, &bytes)
            .await
            .map_err(DeviceError::Capture)?;
        Ok(RawCapture::new(path))
    }

    async fn start_recording(&self, request: &VideoRequest) -> Result<(), DeviceError> {
        let gate = {
            let mut state = self.state();
            state.calls.starts += 1;
            state.video_requests.push(request.clone());
            state.start_gate.take()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state();
        if std::mem::take(&mut state.fail_next_start) {
            return Err(DeviceError::Recording("mock encoder refused to start".to_string()));
        }
        if state.recording_since.is_some() {
            return Err(DeviceError::Recording("already recording".to_string()));
        }
        state.recording_since = Some(Instant::now());
        Ok(())
    }

    async fn stop_recording(&self) -> Result<Option<RawCapture>, DeviceError> {
        let started = {
            let mut state = self.state();
            state.calls.stops += 1;
            if std::mem::take(&mut state.fail_next_stop) {
                return Err(DeviceError::Recording("mock stop failure".to_string()));
            }
            let Some(started) = state.recording_since.take() else {
                return Err(DeviceError::Recording("not recording".to_string()));
            };
            if std::mem::take(&mut state.empty_next_stop) {
                return Ok(None);
            }
            started
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let path = self.scratch_path("mp4");
        self.write_scratch(&path, &synthetic_video_bytes(duration_ms))
            .await
            .map_err(DeviceError::Recording)?;
        Ok(Some(RawCapture::new(path)))
    }

    async fn set_flash(&self, mode: FlashMode) -> Result<(), DeviceError> {
        self.wait_control_gate().await;
        self.control()?.calls.flash.push(mode);
        Ok(())
    }

    async fn set_lens(&self, lens: LensFacing) -> Result<(), DeviceError> {
        self.wait_control_gate().await;
        self.control()?.calls.lens.push(lens);
        Ok(())
    }

    async fn set_focus_point(&self, point: FocusPoint) -> Result<(), DeviceError> {
        let mut state = self.control()?;
        state.calls.focus += 1;
        state.last_focus = Some(point);
        Ok(())
    }

    async fn picture_sizes(&self) -> Result<Vec<String>, DeviceError> {
        Ok(self.state().picture_sizes.clone())
    }
}
