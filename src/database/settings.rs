use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::store::ConfigStore;
use crate::errors::{
    constants::{
        DEFAULT_ENABLED, DEFAULT_VOICE, DEFAULT_VOLUME, KEY_ENABLED, KEY_VOICE, KEY_VOLUME,
        MAX_VOLUME,
    },
    Result,
};

/// The relay's settings as read at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub enabled: bool,
    pub voice: String,
    pub volume: u8,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            voice: DEFAULT_VOICE.to_string(),
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Typed access to the `enabled`, `voice` and `volume` settings.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn ConfigStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Write the defaults for every setting that has never been set.
    pub async fn ensure_defaults(&self) -> Result<()> {
        let defaults = ConfigSnapshot::default();
        self.store
            .ensure(KEY_ENABLED, Value::from(defaults.enabled))
            .await?;
        self.store
            .ensure(KEY_VOICE, Value::from(defaults.voice))
            .await?;
        self.store
            .ensure(KEY_VOLUME, Value::from(defaults.volume))
            .await
    }

    pub async fn snapshot(&self) -> Result<ConfigSnapshot> {
        Ok(ConfigSnapshot {
            enabled: self.enabled().await?,
            voice: self.voice().await?,
            volume: self.volume().await?,
        })
    }

    pub async fn enabled(&self) -> Result<bool> {
        let value = self.store.get(KEY_ENABLED).await?;
        Ok(value
            .as_ref()
            .and_then(coerce_bool)
            .unwrap_or(DEFAULT_ENABLED))
    }

    pub async fn voice(&self) -> Result<String> {
        let value = self.store.get(KEY_VOICE).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|voice| !voice.is_empty())
            .unwrap_or(DEFAULT_VOICE)
            .to_string())
    }

    pub async fn volume(&self) -> Result<u8> {
        let value = self.store.get(KEY_VOLUME).await?;
        Ok(value
            .as_ref()
            .and_then(coerce_volume)
            .unwrap_or(DEFAULT_VOLUME))
    }

    /// Flip `enabled` and return the new state.
    pub async fn toggle_enabled(&self) -> Result<bool> {
        let enabled = !self.enabled().await?;
        self.store.set(KEY_ENABLED, Value::from(enabled)).await?;
        Ok(enabled)
    }

    /// Replace the voice, falling back to the default for blank input.
    /// Returns the previous voice.
    pub async fn set_voice(&self, voice: Option<&str>) -> Result<(String, String)> {
        let old = self.voice().await?;
        let new = voice
            .map(str::trim)
            .filter(|voice| !voice.is_empty())
            .unwrap_or(DEFAULT_VOICE)
            .to_string();

        self.store.set(KEY_VOICE, Value::from(new.clone())).await?;
        Ok((old, new))
    }

    pub async fn set_volume(&self, volume: u8) -> Result<()> {
        self.store
            .set(KEY_VOLUME, Value::from(volume.min(MAX_VOLUME)))
            .await
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Older stores may hold the volume as a string; out-of-range numbers are clamped.
fn coerce_volume(value: &Value) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() {
        warn!(?value, "Ignoring stored volume");
        return None;
    }

    Some(number.round().clamp(0.0, MAX_VOLUME as f64) as u8)
}
