//! Bridge settings
//!
//! Persisted in LocalStorage on the web; hosts can also ship them inline as JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::scene::ReconcilerConfig;
use crate::snapshot::{CodecConfig, ShapeTransforms, WireShape};

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    // === Wire format ===
    /// Inbound wire shape used by the deployed logic component
    pub wire_shape: WireShape,
    /// Which fields of each shape are logic-space (centered)
    pub transforms: ShapeTransforms,

    // === Mount points ===
    /// Selector of the element hosting the logic component
    pub logic_mount: String,
    /// Selector of the render surface
    pub render_mount: String,

    // === Scene ===
    /// Paddle y in render-space. `None` places it `PADDLE_BASELINE_MARGIN`
    /// above the bottom of the surface.
    pub paddle_y: Option<f32>,
    /// Paddle size handed to the backend on creation
    pub paddle_size: Option<(f32, f32)>,
    /// Ball size handed to the backend on creation
    pub ball_size: Option<(f32, f32)>,
    /// Most visuals the placeholder backend will hold
    pub max_visuals: usize,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            wire_shape: WireShape::G3,
            transforms: ShapeTransforms::default(),

            logic_mount: "#logic".to_string(),
            render_mount: "#canvas".to_string(),

            paddle_y: None,
            paddle_size: Some(DEFAULT_PADDLE_SIZE),
            ball_size: Some(DEFAULT_BALL_SIZE),
            max_visuals: DEFAULT_MAX_VISUALS,

            show_fps: true,
        }
    }
}

impl BridgeSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            shape: self.wire_shape,
            transforms: self.transforms,
        }
    }

    /// Reconciler configuration for a surface of the given height
    pub fn reconciler_config(&self, surface_height: f32) -> ReconcilerConfig {
        ReconcilerConfig {
            paddle_y: self
                .paddle_y
                .unwrap_or(surface_height - PADDLE_BASELINE_MARGIN),
            paddle_size: self.paddle_size.map(|(w, h)| Vec2::new(w, h)),
            ball_size: self.ball_size.map(|(w, h)| Vec2::new(w, h)),
        }
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "breakout_bridge_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native: read `BRIDGE_SETTINGS` (inline JSON) if set
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        match std::env::var("BRIDGE_SETTINGS") {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring BRIDGE_SETTINGS: {}", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}
