use crate::commands::config::get_config;
use crate::config::CrabShutterConfig;
use crate::device::CaptureDevice;
use crate::quality::QualityPreset;
use crate::session::CaptureSession;
use crate::store::FsMediaStore;
use crate::types::{CaptureMode, FocusTap, Handoff, SessionSnapshot, Viewport};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session type held by the registry
pub type HostSession = CaptureSession<Arc<dyn CaptureDevice>, FsMediaStore>;

lazy_static::lazy_static! {
    static ref SESSION_REGISTRY: Arc<RwLock<HashMap<String, Arc<HostSession>>>> = Arc::new(RwLock::new(HashMap::new()));
}

/// Open a session on `device` using the global configuration
pub async fn open_session(device: Arc<dyn CaptureDevice>) -> Result<String, String> {
    let config = get_config().await?;
    open_session_with_config(device, &config).await
}

/// Open a session on `device` with an explicit configuration
pub async fn open_session_with_config(
    device: Arc<dyn CaptureDevice>,
    config: &CrabShutterConfig,
) -> Result<String, String> {
    let store = FsMediaStore::from_config(&config.storage);
    let session = CaptureSession::from_config(device, store, config).map_err(|e| {
        log::error!("Failed to open capture session: {}", e);
        format!("Failed to open capture session: {}", e)
    })?;

    if config.quality.derive_from_device {
        if let Err(e) = session.load_device_presets().await {
            log::warn!("Keeping built-in photo presets: {}", e);
        }
    }

    let session_id = format!(
        "session_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4()
    );
    let mut registry = SESSION_REGISTRY.write().await;
    registry.insert(session_id.clone(), Arc::new(session));
    log::info!("Opened capture session {}", session_id);
    Ok(session_id)
}

async fn get_session(session_id: &str) -> Result<Arc<HostSession>, String> {
    let registry = SESSION_REGISTRY.read().await;
    registry
        .get(session_id)
        .cloned()
        .ok_or_else(|| format!("Session not found: {}", session_id))
}

/// Switch the session between photo and video
pub async fn set_mode(session_id: String, mode: CaptureMode) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session
        .set_mode(mode)
        .await
        .map_err(|e| format!("Failed to set mode: {}", e))
}

/// Press the shutter
pub async fn shutter(session_id: String) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session.shutter().await.map_err(|e| {
        log::warn!("Shutter on {} failed: {}", session_id, e);
        format!("Shutter failed: {}", e)
    })
}

/// Accept the pending capture
pub async fn confirm(session_id: String) -> Result<Handoff, String> {
    let session = get_session(&session_id).await?;
    session
        .confirm()
        .await
        .map_err(|e| format!("Failed to confirm capture: {}", e))
}

/// Discard the pending capture
pub async fn retake(session_id: String) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session
        .retake()
        .await
        .map_err(|e| format!("Failed to retake: {}", e))
}

/// Select the active preset for `mode` by id
pub async fn set_quality_preset(
    session_id: String,
    mode: CaptureMode,
    preset_id: String,
) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session
        .select_quality_preset(mode, &preset_id)
        .map_err(|e| format!("Failed to set quality preset: {}", e))
}

/// Focus at a tap on a `width` x `height` preview
pub async fn set_focus_point(
    session_id: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Result<FocusTap, String> {
    let session = get_session(&session_id).await?;
    session
        .tap_to_focus(x, y, Viewport::new(width, height))
        .await
        .map_err(|e| format!("Failed to set focus point: {}", e))
}

pub async fn toggle_flash(session_id: String) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session
        .toggle_flash()
        .await
        .map_err(|e| format!("Failed to toggle flash: {}", e))
}

pub async fn toggle_lens(session_id: String) -> Result<SessionSnapshot, String> {
    let session = get_session(&session_id).await?;
    session
        .toggle_lens()
        .await
        .map_err(|e| format!("Failed to toggle lens: {}", e))
}

pub async fn get_snapshot(session_id: String) -> Result<SessionSnapshot, String> {
    Ok(get_session(&session_id).await?.snapshot())
}

/// Presets selectable for `mode`, as the session currently knows them
pub async fn list_presets(session_id: String, mode: CaptureMode) -> Result<Vec<QualityPreset>, String> {
    Ok(get_session(&session_id).await?.presets(mode))
}

/// Close the session and drop it from the registry
pub async fn close_session(session_id: String) -> Result<SessionSnapshot, String> {
    let session = {
        let mut registry = SESSION_REGISTRY.write().await;
        registry
            .remove(&session_id)
            .ok_or_else(|| format!("Session not found: {}", session_id))?
    };
    let snapshot = session
        .close()
        .await
        .map_err(|e| format!("Failed to close session: {}", e))?;
    log::info!("Closed capture session {}", session_id);
    Ok(snapshot)
}

pub async fn list_sessions() -> Result<Vec<String>, String> {
    let registry = SESSION_REGISTRY.read().await;
    Ok(registry.keys().cloned().collect())
}
