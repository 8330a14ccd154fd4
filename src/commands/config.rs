use crate::config::{CrabShutterConfig, FocusConfig, QualityConfig, SessionConfig, StorageConfig};
use std::sync::{Arc, RwLock};

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<CrabShutterConfig>> = Arc::new(RwLock::new(CrabShutterConfig::load_or_default()));
}

/// Get the current configuration
pub async fn get_config() -> Result<CrabShutterConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Update configuration
pub async fn update_config(new_config: CrabShutterConfig) -> Result<(), String> {
    // Validate first
    new_config.validate()?;

    {
        let mut config = GLOBAL_CONFIG.write().map_err(|e| e.to_string())?;
        *config = new_config.clone();
    }

    new_config
        .save_to_file(CrabShutterConfig::default_path())
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Reset configuration to defaults
pub async fn reset_config() -> Result<CrabShutterConfig, String> {
    let default_config = CrabShutterConfig::default();

    {
        let mut config = GLOBAL_CONFIG
            .write()
            .map_err(|e| format!("Failed to write config: {}", e))?;
        *config = default_config.clone();
    }

    default_config
        .save_to_file(CrabShutterConfig::default_path())
        .map_err(|e| e.to_string())?;

    Ok(default_config)
}

pub async fn get_session_config() -> Result<SessionConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.session.clone())
}

pub async fn get_storage_config() -> Result<StorageConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.storage.clone())
}

pub async fn get_quality_config() -> Result<QualityConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.quality.clone())
}

pub async fn get_focus_config() -> Result<FocusConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.focus.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_config_is_valid() {
        let config = get_config().await.unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            get_session_config().await.unwrap().dwell_time_ms,
            config.session.dwell_time_ms
        );
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_config() {
        let before = get_config().await.unwrap();
        let mut bad = before.clone();
        bad.session.dwell_time_ms = 0;

        assert!(update_config(bad).await.is_err());
        assert_eq!(get_config().await.unwrap(), before);
    }
}
