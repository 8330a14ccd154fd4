//! Host command layer over the session registry

use crabshutter::commands::{
    close_session, confirm, get_snapshot, list_presets, list_sessions, open_session_with_config,
    retake, set_focus_point, set_mode, set_quality_preset, shutter, toggle_flash, toggle_lens,
};
use crabshutter::device::CaptureDevice;
use crabshutter::testing::MockDevice;
use crabshutter::{CaptureMode, CrabShutterConfig, FlashMode, LensFacing, MediaKind};
use std::sync::Arc;
use tempfile::TempDir;

async fn open(dir: &TempDir, configure: impl FnOnce(&mut CrabShutterConfig)) -> String {
    let mut config = CrabShutterConfig::default();
    config.storage.capture_directory = dir.path().join("captures").to_string_lossy().into_owned();
    config.storage.staging_directory = Some(dir.path().join("staging").to_string_lossy().into_owned());
    configure(&mut config);

    let device: Arc<dyn CaptureDevice> = Arc::new(MockDevice::new(dir.path().join("device")));
    open_session_with_config(device, &config).await.unwrap()
}

#[tokio::test]
async fn test_session_lifecycle_through_commands() {
    let dir = tempfile::tempdir().unwrap();
    let id = open(&dir, |_| {}).await;
    assert!(id.starts_with("session_"));
    assert!(list_sessions().await.unwrap().contains(&id));

    let snap = shutter(id.clone()).await.unwrap();
    assert!(snap.pending.is_some());
    let handoff = confirm(id.clone()).await.unwrap();
    assert_eq!(handoff.kind, MediaKind::Photo);
    assert!(handoff.uri.starts_with(dir.path().join("captures")));

    let closed = close_session(id.clone()).await.unwrap();
    assert!(closed.closed);
    assert!(!list_sessions().await.unwrap().contains(&id));
    assert!(get_snapshot(id).await.is_err());
}

#[tokio::test]
async fn test_controls_and_presets() {
    let dir = tempfile::tempdir().unwrap();
    let id = open(&dir, |_| {}).await;

    assert_eq!(toggle_flash(id.clone()).await.unwrap().flash, FlashMode::On);
    assert_eq!(toggle_lens(id.clone()).await.unwrap().lens, LensFacing::Front);

    let tap = set_focus_point(id.clone(), 1.0, 1.0, 300.0, 300.0).await.unwrap();
    assert_eq!((tap.point.x, tap.point.y), (50.0, 50.0));
    assert_eq!(tap.indicator_ms, 1200);

    let video = list_presets(id.clone(), CaptureMode::Video).await.unwrap();
    assert_eq!(video.len(), 5);
    let snap = set_quality_preset(id.clone(), CaptureMode::Video, "480p".to_string())
        .await
        .unwrap();
    assert_eq!(snap.video_preset, "480p");
    assert!(set_quality_preset(id.clone(), CaptureMode::Photo, "8k".to_string())
        .await
        .is_err());

    close_session(id).await.unwrap();
}

#[tokio::test]
async fn test_retake_and_mode_through_commands() {
    let dir = tempfile::tempdir().unwrap();
    let id = open(&dir, |c| c.session.default_mode = CaptureMode::Video).await;
    assert_eq!(get_snapshot(id.clone()).await.unwrap().mode, CaptureMode::Video);

    set_mode(id.clone(), CaptureMode::Photo).await.unwrap();
    let pending = shutter(id.clone()).await.unwrap().pending.unwrap();
    retake(id.clone()).await.unwrap();
    assert!(!pending.uri.exists());

    close_session(id).await.unwrap();
}

#[tokio::test]
async fn test_device_derived_presets() {
    let dir = tempfile::tempdir().unwrap();
    let id = open(&dir, |c| c.quality.derive_from_device = true).await;

    let photo = list_presets(id.clone(), CaptureMode::Photo).await.unwrap();
    assert_eq!(photo.len(), 4);
    assert!(photo.iter().all(|p| p.picture_size().is_some()));

    close_session(id).await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CrabShutterConfig::default();
    config.session.dwell_time_ms = 0;
    let device: Arc<dyn CaptureDevice> = Arc::new(MockDevice::new(dir.path()));
    assert!(open_session_with_config(device, &config).await.is_err());
}

#[tokio::test]
async fn test_unknown_session() {
    assert!(shutter("session_0_missing".to_string()).await.is_err());
    assert!(close_session("session_0_missing".to_string()).await.is_err());
}
