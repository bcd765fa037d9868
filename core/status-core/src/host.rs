//! Capabilities the host shell provides to the engine.
//!
//! The engine never draws, opens dialogs or touches disk on its own; it calls
//! through these traits. Everything except [`StatusSurface`] may be called from
//! any thread.

use std::sync::Mutex;

use crate::color::Color;
use crate::error::{Result, StatusError};
use crate::publisher::{IconFrame, MenuEntry, UserNotice};
use crate::settings::Settings;

/// Opaque load/save of the settings record.
pub trait SettingsPersistence: Send + Sync {
    /// Returns `None` when nothing has been saved yet.
    fn load(&self) -> Option<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Source of the host theme's accent color, used as the border fallback.
pub trait ThemeProvider: Send + Sync {
    fn accent_color(&self) -> Option<Color>;
}

/// Fire-and-forget launcher for status-change URIs.
pub trait ActionLauncher: Send + Sync {
    fn launch(&self, uri: &str) -> Result<()>;
}

/// The host's rendering surface.
///
/// Only ever called from the UI-owning thread (through
/// [`crate::publisher::UiPump`]), so implementations need not be `Send`.
pub trait StatusSurface {
    fn render_icon(&mut self, frame: &IconFrame);
    fn render_border(&mut self, border: Color);
    fn show_menu(&mut self, entries: &[MenuEntry]) -> Result<()>;
    fn show_error(&mut self, notice: &UserNotice);
}

/// Theme provider for hosts without a theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTheme;

impl ThemeProvider for NoTheme {
    fn accent_color(&self) -> Option<Color> {
        None
    }
}

/// Theme provider with a fixed accent color.
#[derive(Debug, Clone, Copy)]
pub struct FixedTheme(pub Color);

impl ThemeProvider for FixedTheme {
    fn accent_color(&self) -> Option<Color> {
        Some(self.0)
    }
}

/// In-memory persistence for embedded hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Settings>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            saved: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsPersistence for MemoryPersistence {
    fn load(&self) -> Option<Settings> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| StatusError::PersistenceUnavailable("memory store poisoned".into()))?;
        *saved = Some(settings.clone());
        Ok(())
    }
}
