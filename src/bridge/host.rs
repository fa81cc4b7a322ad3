//! Host environment queries used during startup

/// What the bridge needs from its host before a session can start
pub trait HostEnvironment {
    /// Size of the render surface under `selector`, once it is ready
    fn surface_size(&self, selector: &str) -> Option<(f32, f32)>;

    /// Whether a mount point matching `selector` exists
    fn has_mount(&self, selector: &str) -> bool;
}

/// Host with a fixed surface and a fixed set of mount points (native runs, tests)
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    surface: Option<(String, f32, f32)>,
    mounts: Vec<String>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surface(mut self, selector: &str, width: f32, height: f32) -> Self {
        self.surface = Some((selector.to_string(), width, height));
        self
    }

    pub fn with_mount(mut self, selector: &str) -> Self {
        self.mounts.push(selector.to_string());
        self
    }
}

impl HostEnvironment for HeadlessHost {
    fn surface_size(&self, selector: &str) -> Option<(f32, f32)> {
        match &self.surface {
            Some((s, w, h)) if s == selector => Some((*w, *h)),
            _ => None,
        }
    }

    fn has_mount(&self, selector: &str) -> bool {
        self.mounts.iter().any(|m| m == selector)
    }
}
