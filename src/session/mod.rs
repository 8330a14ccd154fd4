//! Capture session state machine
//!
//! One session owns the capture mode, the recording sub-state and the pending
//! artifact. Intents are processed one at a time: while a device call is
//! outstanding the session is busy and any further state-changing intent is
//! rejected synchronously. Every transition publishes a [`SessionSnapshot`].

mod guard;

use crate::config::CrabShutterConfig;
use crate::device::{CaptureDevice, PhotoRequest, VideoRequest};
use crate::errors::{CaptureError, ErrorDescriptor, Rejection};
use crate::quality::{tiered_photo_presets, QualityCatalog, QualityPreset};
use crate::store::{compress_photo, MediaStore};
use crate::timing::RecordingClock;
use crate::types::{
    CaptureMode, CapturedArtifact, FlashMode, FocusPoint, FocusTap, Handoff, LensFacing,
    MediaKind, RecordingState, SessionSnapshot, Viewport,
};
use guard::{BusyGuard, ControlGuard};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Session behavior knobs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Minimum recording length before a stop is honored
    pub dwell_time: Duration,
    /// Mode the session opens in
    pub default_mode: CaptureMode,
    /// Stay in the last-used mode after confirm
    pub remember_last_mode: bool,
    /// Scratch directory for recompressed photos
    pub staging_dir: PathBuf,
    /// Edge margin applied to focus taps
    pub focus_margin: f32,
    /// How long the focus ring stays up after a tap
    pub focus_indicator: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            dwell_time: Duration::from_millis(1000),
            default_mode: CaptureMode::Photo,
            remember_last_mode: true,
            staging_dir: std::env::temp_dir().join("crabshutter-staging"),
            focus_margin: 50.0,
            focus_indicator: Duration::from_millis(1200),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &CrabShutterConfig) -> Self {
        Self {
            dwell_time: Duration::from_millis(config.session.dwell_time_ms),
            default_mode: config.session.default_mode,
            remember_last_mode: config.session.remember_last_mode,
            staging_dir: config.staging_directory(),
            focus_margin: config.focus.edge_margin,
            focus_indicator: Duration::from_millis(config.focus.indicator_ms),
        }
    }
}

#[derive(Debug, Clone)]
enum Recording {
    Idle,
    Arming,
    /// The preset is fixed for the lifetime of the recording
    Active {
        clock: RecordingClock,
        preset: QualityPreset,
    },
}

#[derive(Debug, Clone)]
enum Phase {
    Live(Recording),
    PreviewPending(CapturedArtifact),
}

#[derive(Debug)]
struct Core {
    mode: CaptureMode,
    phase: Phase,
    busy: bool,
    /// A flash or lens change is waiting on the device
    controls_busy: bool,
    closed: bool,
    flash: FlashMode,
    lens: LensFacing,
    catalog: QualityCatalog,
}

impl Core {
    fn admit(&self) -> Result<(), Rejection> {
        if self.closed {
            return Err(Rejection::Closed);
        }
        if self.busy {
            return Err(Rejection::Busy);
        }
        Ok(())
    }

    fn recording_state(&self) -> RecordingState {
        match &self.phase {
            Phase::Live(Recording::Arming) => RecordingState::Arming,
            Phase::Live(Recording::Active { .. }) => RecordingState::Recording,
            _ => RecordingState::Idle,
        }
    }

    fn clock(&self) -> Option<&RecordingClock> {
        match &self.phase {
            Phase::Live(Recording::Active { clock, .. }) => Some(clock),
            _ => None,
        }
    }

    fn snapshot(&self, error: Option<ErrorDescriptor>) -> SessionSnapshot {
        let pending = match &self.phase {
            Phase::PreviewPending(artifact) => Some(artifact.clone()),
            Phase::Live(_) => None,
        };
        SessionSnapshot {
            mode: self.mode,
            recording: self.recording_state(),
            elapsed_secs: self.clock().map_or(0, RecordingClock::elapsed_secs),
            pending,
            flash: self.flash,
            lens: self.lens,
            busy: self.busy,
            closed: self.closed,
            photo_preset: self.catalog.active_preset(CaptureMode::Photo).id.clone(),
            video_preset: self.catalog.active_preset(CaptureMode::Video).id.clone(),
            error,
        }
    }
}

enum ShutterStep {
    TakePhoto(QualityPreset),
    StartRecording(QualityPreset),
    StopRecording,
}

/// A camera capture session over a device and a media store.
pub struct CaptureSession<D, S> {
    device: D,
    store: S,
    options: SessionOptions,
    core: Mutex<Core>,
    idle: Notify,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<D: CaptureDevice, S: MediaStore> CaptureSession<D, S> {
    /// Session with the built-in quality presets
    pub fn new(device: D, store: S, options: SessionOptions) -> Self {
        Self::with_catalog(device, store, options, QualityCatalog::standard())
    }

    pub fn with_catalog(
        device: D,
        store: S,
        options: SessionOptions,
        catalog: QualityCatalog,
    ) -> Self {
        let core = Core {
            mode: options.default_mode,
            phase: Phase::Live(Recording::Idle),
            busy: false,
            controls_busy: false,
            closed: false,
            flash: FlashMode::default(),
            lens: LensFacing::default(),
            catalog,
        };
        let (snapshots, _) = watch::channel(core.snapshot(None));
        log::info!("Capture session opened in {} mode", core.mode);
        Self {
            device,
            store,
            options,
            core: Mutex::new(core),
            idle: Notify::new(),
            snapshots,
        }
    }

    /// Session built from validated configuration
    pub fn from_config(device: D, store: S, config: &CrabShutterConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::Config)?;
        let catalog = QualityCatalog::with_defaults(
            &config.quality.default_photo_preset,
            &config.quality.default_video_preset,
        )?;
        Ok(Self::with_catalog(
            device,
            store,
            SessionOptions::from_config(config),
            catalog,
        ))
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current state, with the elapsed counter computed now
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot(None)
    }

    /// Receive a snapshot after every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn mode(&self) -> CaptureMode {
        self.lock().mode
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Time since the device confirmed the recording start
    pub fn elapsed(&self) -> Option<Duration> {
        self.lock().clock().map(RecordingClock::elapsed)
    }

    pub fn presets(&self, mode: CaptureMode) -> Vec<QualityPreset> {
        self.lock().catalog.presets(mode).to_vec()
    }

    pub fn active_preset(&self, mode: CaptureMode) -> QualityPreset {
        self.lock().catalog.active_preset(mode).clone()
    }

    /// Switch between photo and video.
    ///
    /// A running recording is stopped and its partial file discarded first.
    pub async fn set_mode(&self, mode: CaptureMode) -> Result<SessionSnapshot, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_mode_switch(&mut core, mode)
        };
        let discard = planned.map_err(|r| self.fail(r.into()))?;

        if discard {
            let guard = self.begin();
            self.discard_recording().await;
            self.lock().mode = mode;
            drop(guard);
        }

        log::info!("Capture mode set to {}", mode);
        Ok(self.publish(None))
    }

    fn plan_mode_switch(core: &mut Core, mode: CaptureMode) -> Result<bool, Rejection> {
        core.admit()?;
        match core.phase {
            Phase::PreviewPending(_) => Err(Rejection::PreviewPending),
            Phase::Live(Recording::Arming) => Err(Rejection::Busy),
            Phase::Live(Recording::Active { .. }) => {
                core.busy = true;
                Ok(true)
            }
            Phase::Live(Recording::Idle) => {
                core.mode = mode;
                Ok(false)
            }
        }
    }

    /// Take a photo, start a recording or stop the running one.
    pub async fn shutter(&self) -> Result<SessionSnapshot, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_shutter(&mut core, self.options.dwell_time)
        };
        let step = planned.map_err(|r| self.fail(r.into()))?;

        let guard = self.begin();
        let outcome = match step {
            ShutterStep::TakePhoto(preset) => self.capture_photo(&preset).await,
            ShutterStep::StartRecording(preset) => self.start_recording(preset).await,
            ShutterStep::StopRecording => self.stop_recording().await,
        };
        drop(guard);
        self.settle(outcome)
    }

    fn plan_shutter(core: &mut Core, dwell: Duration) -> Result<ShutterStep, Rejection> {
        core.admit()?;
        let step = match core.recording_state() {
            _ if matches!(core.phase, Phase::PreviewPending(_)) => {
                return Err(Rejection::PreviewPending)
            }
            RecordingState::Arming => return Err(Rejection::Busy),
            RecordingState::Recording => {
                match core.clock() {
                    Some(clock) if !clock.has_dwelled(dwell) => {
                        return Err(Rejection::DwellTime {
                            elapsed_ms: clock.elapsed().as_millis() as u64,
                            required_ms: dwell.as_millis() as u64,
                        });
                    }
                    _ => ShutterStep::StopRecording,
                }
            }
            RecordingState::Idle => {
                let preset = core.catalog.active_preset(core.mode).clone();
                match core.mode {
                    CaptureMode::Photo => ShutterStep::TakePhoto(preset),
                    CaptureMode::Video => {
                        core.phase = Phase::Live(Recording::Arming);
                        ShutterStep::StartRecording(preset)
                    }
                }
            }
        };
        core.busy = true;
        Ok(step)
    }

    async fn capture_photo(&self, preset: &QualityPreset) -> Result<(), CaptureError> {
        log::debug!("Taking photo with preset {}", preset.id);
        let raw = self
            .device
            .take_photo(&PhotoRequest::for_preset(preset))
            .await?;

        let staged = compress_photo(&raw.path, preset, &self.options.staging_dir).await?;
        let source = staged.as_deref().unwrap_or(&raw.path);
        let persisted = self.store.persist(source, MediaKind::Photo).await;
        if let Some(staged) = &staged {
            if let Err(e) = tokio::fs::remove_file(staged).await {
                log::debug!("Could not remove staged photo {}: {}", staged.display(), e);
            }
        }

        let artifact = persisted?;
        log::info!("Photo captured: {}", artifact.uri.display());
        self.lock().phase = Phase::PreviewPending(artifact);
        Ok(())
    }

    async fn start_recording(&self, preset: QualityPreset) -> Result<(), CaptureError> {
        let request = VideoRequest::for_preset(&preset);
        log::debug!(
            "Starting recording at {}x{} ({} bps)",
            request.width,
            request.height,
            request.bitrate
        );

        if let Err(e) = self.device.start_recording(&request).await {
            self.lock().phase = Phase::Live(Recording::Idle);
            return Err(e.into());
        }

        log::info!("Recording started with preset {}", preset.id);
        self.lock().phase = Phase::Live(Recording::Active {
            clock: RecordingClock::start(),
            preset,
        });
        Ok(())
    }

    async fn stop_recording(&self) -> Result<(), CaptureError> {
        // a failed stop leaves the recording running
        let raw = self.device.stop_recording().await?;
        self.lock().phase = Phase::Live(Recording::Idle);

        let Some(raw) = raw else {
            log::info!("Recording stopped without output, discarded");
            return Ok(());
        };
        if !has_content(&raw.path).await {
            log::info!("Recording {} is empty, discarded", raw.path.display());
            self.delete_quietly(&raw.path).await;
            return Ok(());
        }

        let artifact = self.store.persist(&raw.path, MediaKind::Video).await?;
        log::info!("Recording captured: {}", artifact.uri.display());
        self.lock().phase = Phase::PreviewPending(artifact);
        Ok(())
    }

    /// Stop the device and delete whatever it produced. Always ends Idle.
    async fn discard_recording(&self) {
        let stopped = self.device.stop_recording().await;
        self.lock().phase = Phase::Live(Recording::Idle);
        match stopped {
            Ok(Some(raw)) => {
                log::info!("Discarding partial recording {}", raw.path.display());
                self.delete_quietly(&raw.path).await;
            }
            Ok(None) => log::info!("Recording discarded"),
            Err(e) => log::warn!("Device failed to stop during discard, forcing idle: {}", e),
        }
    }

    /// Hand the pending artifact over to the caller. The file is kept.
    pub async fn confirm(&self) -> Result<Handoff, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_pending(&mut core, false)
        };
        let artifact = planned.map_err(|r| self.fail(r.into()))?;

        let guard = self.begin();
        let size = self.store.size_of(&artifact.uri).await;
        let size_bytes = match size {
            Ok(size) => size,
            Err(e) => {
                drop(guard);
                return Err(self.fail(e.into()));
            }
        };

        {
            let mut core = self.lock();
            core.phase = Phase::Live(Recording::Idle);
            if !self.options.remember_last_mode {
                core.mode = self.options.default_mode;
            }
        }
        drop(guard);

        log::info!(
            "Confirmed {} {} ({} bytes)",
            artifact.kind,
            artifact.uri.display(),
            size_bytes
        );
        self.publish(None);
        Ok(Handoff {
            uri: artifact.uri,
            kind: artifact.kind,
            size_bytes,
        })
    }

    /// Drop the pending artifact and delete its file.
    ///
    /// The pending slot is cleared even when deletion fails.
    pub async fn retake(&self) -> Result<SessionSnapshot, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_pending(&mut core, true)
        };
        let artifact = planned.map_err(|r| self.fail(r.into()))?;

        let guard = self.begin();
        log::info!("Retake, deleting {}", artifact.uri.display());
        self.delete_quietly(&artifact.uri).await;
        drop(guard);
        Ok(self.publish(None))
    }

    fn plan_pending(core: &mut Core, clear: bool) -> Result<CapturedArtifact, Rejection> {
        core.admit()?;
        let Phase::PreviewPending(artifact) = &core.phase else {
            return Err(Rejection::NothingPending);
        };
        let artifact = artifact.clone();
        if clear {
            core.phase = Phase::Live(Recording::Idle);
        }
        core.busy = true;
        Ok(artifact)
    }

    /// Change the active preset for `mode`.
    ///
    /// Applies from the next capture; a running recording keeps its preset.
    pub fn set_quality_preset(
        &self,
        mode: CaptureMode,
        preset: &QualityPreset,
    ) -> Result<SessionSnapshot, CaptureError> {
        let updated = {
            let mut core = self.lock();
            if core.closed {
                Err(Rejection::Closed.into())
            } else {
                core.catalog.set_active_preset(mode, preset)
            }
        };
        updated.map_err(|e| self.fail(e))?;
        log::info!("Active {} preset set to {}", mode, preset.id);
        Ok(self.publish(None))
    }

    /// Select the active preset for `mode` by id
    pub fn select_quality_preset(
        &self,
        mode: CaptureMode,
        id: &str,
    ) -> Result<SessionSnapshot, CaptureError> {
        let preset = {
            let core = self.lock();
            core.catalog.find(mode, id).cloned()
        };
        match preset {
            Some(preset) => self.set_quality_preset(mode, &preset),
            None => Err(self.fail(
                Rejection::UnknownPreset {
                    mode,
                    id: id.to_string(),
                }
                .into(),
            )),
        }
    }

    /// Preset the running recording was started with
    pub fn recording_preset(&self) -> Option<QualityPreset> {
        match &self.lock().phase {
            Phase::Live(Recording::Active { preset, .. }) => Some(preset.clone()),
            _ => None,
        }
    }

    /// Replace the photo presets with four tiers of the device's picture sizes
    pub async fn load_device_presets(&self) -> Result<SessionSnapshot, CaptureError> {
        self.ensure_open()?;
        let outcome = self.install_device_presets().await;
        self.settle(outcome)
    }

    async fn install_device_presets(&self) -> Result<(), CaptureError> {
        let sizes = self.device.picture_sizes().await?;
        let presets = tiered_photo_presets(&sizes)?;
        self.lock().catalog.replace_photo_presets(presets)?;
        log::info!("Loaded {} photo presets from device picture sizes", sizes.len());
        Ok(())
    }

    pub async fn set_focus_point(&self, point: FocusPoint) -> Result<SessionSnapshot, CaptureError> {
        self.ensure_open()?;
        log::debug!("Focus at ({:.1}, {:.1})", point.x, point.y);
        let outcome = self.device.set_focus_point(point).await.map_err(Into::into);
        self.settle(outcome)
    }

    /// Clamp a tap on the preview into the focus margin and focus there
    pub async fn tap_to_focus(
        &self,
        x: f32,
        y: f32,
        viewport: Viewport,
    ) -> Result<FocusTap, CaptureError> {
        let point = FocusPoint::clamped(x, y, viewport, self.options.focus_margin);
        self.set_focus_point(point).await?;
        Ok(FocusTap {
            point,
            indicator_ms: self.options.focus_indicator.as_millis() as u64,
        })
    }

    /// Advance flash off, on, auto. The value only changes once the device accepts it.
    pub async fn toggle_flash(&self) -> Result<SessionSnapshot, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_control(&mut core).map(|()| core.flash.next())
        };
        let next = planned.map_err(|r| self.fail(r.into()))?;

        let guard = ControlGuard::new(&self.core);
        let outcome = match self.device.set_flash(next).await {
            Ok(()) => {
                self.lock().flash = next;
                log::info!("Flash set to {:?}", next);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        drop(guard);
        self.settle(outcome)
    }

    /// Switch between back and front lens
    pub async fn toggle_lens(&self) -> Result<SessionSnapshot, CaptureError> {
        let planned = {
            let mut core = self.lock();
            Self::plan_control(&mut core).map(|()| core.lens.toggled())
        };
        let next = planned.map_err(|r| self.fail(r.into()))?;

        let guard = ControlGuard::new(&self.core);
        let outcome = match self.device.set_lens(next).await {
            Ok(()) => {
                self.lock().lens = next;
                log::info!("Lens set to {:?}", next);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
        drop(guard);
        self.settle(outcome)
    }

    fn plan_control(core: &mut Core) -> Result<(), Rejection> {
        if core.closed {
            return Err(Rejection::Closed);
        }
        if core.controls_busy {
            return Err(Rejection::Busy);
        }
        core.controls_busy = true;
        Ok(())
    }

    /// Tear the session down.
    ///
    /// Waits for an outstanding device call, then discards a running recording
    /// and any unconfirmed artifact.
    pub async fn close(&self) -> Result<SessionSnapshot, CaptureError> {
        let already_closed = {
            let mut core = self.lock();
            std::mem::replace(&mut core.closed, true)
        };
        if already_closed {
            return Err(Rejection::Closed.into());
        }
        log::info!("Closing capture session");

        loop {
            let notified = self.idle.notified();
            let busy = self.lock().busy;
            if !busy {
                break;
            }
            log::debug!("Waiting for outstanding device call before teardown");
            notified.await;
        }

        let (recording, pending) = {
            let core = self.lock();
            match &core.phase {
                Phase::Live(Recording::Active { .. }) => (true, None),
                Phase::PreviewPending(artifact) => (false, Some(artifact.uri.clone())),
                Phase::Live(_) => (false, None),
            }
        };

        if recording {
            self.discard_recording().await;
        }
        if let Some(uri) = pending {
            log::info!("Discarding unconfirmed capture {}", uri.display());
            self.lock().phase = Phase::Live(Recording::Idle);
            self.delete_quietly(&uri).await;
        }

        log::info!("Capture session closed");
        Ok(self.publish(None))
    }

    fn ensure_open(&self) -> Result<(), CaptureError> {
        let closed = self.lock().closed;
        if closed {
            return Err(self.fail(Rejection::Closed.into()));
        }
        Ok(())
    }

    async fn delete_quietly(&self, uri: &Path) {
        if let Err(e) = self.store.delete(uri).await {
            log::warn!("Failed to delete {}: {}", uri.display(), e);
        }
    }

    /// Cover a planned device or store call with the busy flag and publish it.
    fn begin(&self) -> BusyGuard<'_> {
        let guard = BusyGuard::new(&self.core, &self.idle, &self.snapshots);
        self.publish(None);
        guard
    }

    fn settle(&self, outcome: Result<(), CaptureError>) -> Result<SessionSnapshot, CaptureError> {
        match outcome {
            Ok(()) => Ok(self.publish(None)),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, err: CaptureError) -> CaptureError {
        match &err {
            CaptureError::Rejected(r) => log::debug!("Intent rejected: {}", r),
            CaptureError::Storage(e) => log::error!("Storage failure: {}", e),
            CaptureError::Device(e) => log::warn!("Device failure: {}", e),
            CaptureError::Config(e) => log::warn!("Configuration failure: {}", e),
        }
        self.publish(Some(err.descriptor()));
        err
    }

    fn publish(&self, error: Option<ErrorDescriptor>) -> SessionSnapshot {
        let snapshot = self.lock().snapshot(error);
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        lock_core(&self.core)
    }
}

impl<D, S> Drop for CaptureSession<D, S> {
    fn drop(&mut self) {
        let core = lock_core(&self.core);
        if !core.closed && matches!(core.phase, Phase::Live(Recording::Active { .. })) {
            log::warn!("Capture session dropped while recording; call close() to discard the partial file");
        }
    }
}

fn lock_core(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn has_content(path: &Path) -> bool {
    matches!(tokio::fs::metadata(path).await, Ok(m) if m.is_file() && m.len() > 0)
}
