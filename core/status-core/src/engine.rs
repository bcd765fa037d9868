//! StatusEngine - the object a host shell holds on to.
//!
//! Wires settings, the status owner, the publisher and the poll scheduler
//! together and exposes the handful of operations a host needs:
//!
//! - settings edits (`begin_edit` / `cancel_edit` / `end_edit`)
//! - the status menu and manual selection
//! - icon refresh and on-demand polling
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use steam_status_core::{HostServices, StatusEngine};
//!
//! let (executor, pump) = steam_status_core::ui_channel();
//! let engine = StatusEngine::start(HostServices { executor: Arc::new(executor), ..services });
//! engine.refresh_icon();
//! pump.drain(&mut surface);
//! ```
//!
//! Never call into the engine while holding the settings lock obtained from
//! [`StatusEngine::settings`]; the status owner takes that lock to build
//! icon frames.

use std::sync::{Arc, Mutex};

use crate::error::{Result, StatusError};
use crate::host::{ActionLauncher, SettingsPersistence, ThemeProvider};
use crate::presence::PresenceClient;
use crate::publisher::{self, StatusPublisher, UiExecutor};
use crate::runtime::{spawn_status_owner, StatusHandle, StatusSnapshot};
use crate::scheduler::{PollScheduler, Poller, SchedulerState, TickOutcome};
use crate::settings::{lock_settings, Settings, SettingsStore, SharedSettings, ValidationReport};
use crate::status::Status;

/// Capabilities supplied by the host.
pub struct HostServices {
    pub persistence: Arc<dyn SettingsPersistence>,
    pub theme: Arc<dyn ThemeProvider>,
    pub launcher: Arc<dyn ActionLauncher>,
    pub presence: Arc<dyn PresenceClient>,
    pub executor: Arc<dyn UiExecutor>,
}

pub struct StatusEngine {
    settings: SharedSettings,
    runtime: StatusHandle,
    publisher: StatusPublisher,
    scheduler: PollScheduler,
    launcher: Arc<dyn ActionLauncher>,
}

impl StatusEngine {
    /// Loads settings, starts the status owner and the poller, and applies
    /// the timer settings. The status starts as `Offline`.
    pub fn start(host: HostServices) -> Self {
        let store = SettingsStore::load(host.persistence, host.theme);
        let settings: SharedSettings = Arc::new(Mutex::new(store));
        let publisher = StatusPublisher::new(settings.clone(), host.executor);
        let runtime = spawn_status_owner(publisher.clone());
        let scheduler = PollScheduler::spawn(Poller::new(
            settings.clone(),
            host.presence,
            runtime.clone(),
        ));

        let engine = Self {
            settings,
            runtime,
            publisher,
            scheduler,
            launcher: host.launcher,
        };
        engine.apply_timer_settings();
        tracing::info!(state = ?engine.scheduler.state(), "Status engine started");
        engine
    }

    pub fn settings(&self) -> SharedSettings {
        self.settings.clone()
    }

    /// Runs `f` against the live settings store.
    pub fn with_settings<R>(&self, f: impl FnOnce(&mut SettingsStore) -> R) -> R {
        f(&mut lock_settings(&self.settings))
    }

    pub fn values(&self) -> Settings {
        lock_settings(&self.settings).values().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Settings edits
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn begin_edit(&self) {
        lock_settings(&self.settings).begin_edit();
    }

    pub fn cancel_edit(&self) {
        lock_settings(&self.settings).cancel_edit();
    }

    /// Commits the edit: persists, reconfigures the timer and re-publishes
    /// the border. The timer and border are updated even if saving failed.
    pub fn end_edit(&self) -> Result<()> {
        let saved = lock_settings(&self.settings).end_edit();
        if let Err(err) = &saved {
            tracing::warn!(error = %err, "Failed to persist settings");
        }
        self.after_settings_change();
        saved
    }

    /// Replaces all settings with `settings` and commits them as
    /// [`Self::end_edit`] does.
    pub fn save_settings(&self, settings: Settings) -> Result<()> {
        let saved = {
            let mut store = lock_settings(&self.settings);
            store.apply(settings);
            store.end_edit()
        };
        if let Err(err) = &saved {
            tracing::warn!(error = %err, "Failed to persist settings");
        }
        self.after_settings_change();
        saved
    }

    pub fn validate(&self) -> ValidationReport {
        lock_settings(&self.settings).validate()
    }

    fn after_settings_change(&self) {
        self.apply_timer_settings();
        self.publisher.publish_border();
    }

    /// Configures the timer under the settings lock so concurrent commits
    /// reach the scheduler in commit order. `configure` never takes the
    /// settings lock itself.
    fn apply_timer_settings(&self) -> SchedulerState {
        let store = lock_settings(&self.settings);
        self.scheduler.configure(store.values())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies a status picked from the menu. See [`publisher::set_manual`].
    pub fn set_manual(&self, status: Status) -> Result<()> {
        publisher::set_manual(status, self.launcher.as_ref(), &self.runtime, &self.publisher)
    }

    pub fn open_menu(&self) {
        self.publisher.open_menu();
    }

    /// Re-publishes the current status, e.g. when the host (re)creates its
    /// indicator.
    pub fn refresh_icon(&self) {
        self.publisher.publish(self.runtime.current());
    }

    pub fn current_status(&self) -> Status {
        self.runtime.current()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.runtime.snapshot()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Runs one poll cycle now, serialized with timer ticks.
    pub fn poll_now(&self) -> Result<TickOutcome> {
        self.scheduler
            .poll_now()
            .ok_or(StatusError::WorkerStopped("presence poller"))
    }

    /// Stops the timer and the status owner. In-flight requests finish and
    /// are discarded.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        self.runtime.shutdown();
        tracing::info!("Status engine stopped");
    }
}

impl Drop for StatusEngine {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        self.runtime.shutdown();
    }
}
