//! # steam-status-core
//!
//! Core library for the Steam status indicator: polls a user's Steam
//! presence, keeps a single "current status" and asks the host to repaint
//! its indicator when that status changes. Users can also pick a status from
//! a menu, which launches Steam's `steam://friends/status/<name>` URI.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Background work runs on
//!   plain threads talking over channels.
//! - **Host-agnostic**: Drawing, persistence, theming and URI launching are
//!   traits in [`host`]. The engine never renders directly; it queues
//!   [`UiUpdate`]s for the UI thread to apply.
//! - **Graceful degradation**: Bad colors fall back to defaults, failed polls
//!   keep the previous status, missing settings load as defaults.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use steam_status_core::*;
//!
//! let storage = StorageConfig::default();
//! let (executor, pump) = ui_channel();
//! let engine = StatusEngine::start(HostServices {
//!     persistence: Arc::new(JsonSettingsFile::from_storage(&storage)),
//!     theme: Arc::new(NoTheme),
//!     launcher: Arc::new(my_launcher),
//!     presence: Arc::new(SteamWebClient::new()?),
//!     executor: Arc::new(executor),
//! });
//! engine.refresh_icon();
//! pump.run(&mut my_surface);
//! ```

// Public modules
pub mod color;
pub mod engine;
pub mod error;
pub mod host;
pub mod persona;
pub mod presence;
pub mod publisher;
pub mod runtime;
pub mod scheduler;
pub mod settings;
pub mod status;
pub mod storage;

// Re-export commonly used items at crate root
pub use color::Color;
pub use engine::{HostServices, StatusEngine};
pub use error::{Result, StatusError};
pub use host::*;
pub use persona::extract_persona_state;
pub use presence::{PresenceClient, SteamWebClient, DEFAULT_PRESENCE_URL};
pub use publisher::{
    ui_channel, ChannelExecutor, IconFrame, MenuEntry, StatusPublisher, UiExecutor, UiPump,
    UiUpdate, UserNotice,
};
pub use runtime::{Origin, StatusHandle, StatusSnapshot};
pub use scheduler::{SchedulerState, SkipReason, TickOutcome};
pub use settings::{Settings, SettingsStore, SharedSettings, ValidationReport};
pub use status::{resolve_persona, Status};
pub use storage::*;
