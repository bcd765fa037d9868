//! User-editable settings with transactional edits and a memoized border color.
//!
//! ## Border color resolution
//!
//! The border shown around the status dot resolves in this order:
//!
//! 1. The stored `border_color`, if non-empty and parseable
//! 2. The host theme's accent color
//! 3. Opaque white
//!
//! The result is memoized against a version counter that every
//! `set_border_color` call bumps, including writes of the same value, so the
//! next read after any write recomputes.
//!
//! ## Edits
//!
//! `begin_edit` snapshots every field, `cancel_edit` restores all of them
//! through the regular setters, `end_edit` persists the current values and
//! drops the snapshot. Validation is advisory and never blocks a save.

use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::Result;
use crate::host::{SettingsPersistence, ThemeProvider};
use crate::status::Status;

pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 60;
/// Longest timer period; intervals above this are capped.
pub const MAX_POLL_INTERVAL_SECS: i64 = i32::MAX as i64;

pub const DEFAULT_ONLINE_COLOR: &str = "#FF32CD32";
pub const DEFAULT_AWAY_COLOR: &str = "#FFDAA520";
pub const DEFAULT_BUSY_COLOR: &str = "#FFFF4500";
pub const DEFAULT_INVISIBLE_COLOR: &str = "#FF708090";
pub const DEFAULT_OFFLINE_COLOR: &str = "#FF696969";

/// The persisted settings record.
///
/// Field names serialize in PascalCase so records written by earlier
/// releases load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    pub api_key: String,
    pub steam_id: String,
    pub poll_interval_seconds: i64,
    pub online_color: String,
    pub away_color: String,
    pub busy_color: String,
    pub invisible_color: String,
    pub offline_color: String,
    pub border_color: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            steam_id: String::new(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECS,
            online_color: DEFAULT_ONLINE_COLOR.to_string(),
            away_color: DEFAULT_AWAY_COLOR.to_string(),
            busy_color: DEFAULT_BUSY_COLOR.to_string(),
            invisible_color: DEFAULT_INVISIBLE_COLOR.to_string(),
            offline_color: DEFAULT_OFFLINE_COLOR.to_string(),
            border_color: None,
        }
    }
}

impl Settings {
    /// True when both credentials are non-blank.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.steam_id.trim().is_empty()
    }

    /// Timer period derived from the stored interval.
    ///
    /// Non-positive values fall back to the default and values above
    /// [`MAX_POLL_INTERVAL_SECS`] are capped; the stored value is left as-is
    /// so validation can still report it.
    pub fn effective_poll_interval(&self) -> Duration {
        let secs = if self.poll_interval_seconds <= 0 {
            DEFAULT_POLL_INTERVAL_SECS
        } else {
            self.poll_interval_seconds
        };
        Duration::from_secs(secs.clamp(1, MAX_POLL_INTERVAL_SECS) as u64)
    }

    pub fn status_color_raw(&self, status: Status) -> &str {
        match status {
            Status::Online => &self.online_color,
            Status::Away => &self.away_color,
            Status::Busy => &self.busy_color,
            Status::Invisible => &self.invisible_color,
            Status::Offline => &self.offline_color,
        }
    }

    /// Dot color for `status`: the stored string when valid, else the
    /// built-in default for that status.
    pub fn status_color(&self, status: Status) -> Color {
        Color::resolve_or(Some(self.status_color_raw(status)), default_status_color(status))
    }

    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        let steam_id = self.steam_id.trim();
        let numeric =
            steam_id.bytes().all(|b| b.is_ascii_digit()) && steam_id.parse::<u64>().is_ok();
        if !steam_id.is_empty() && !numeric {
            errors.push("SteamId must be numeric".to_string());
        }

        if self.poll_interval_seconds <= 0 {
            errors.push("Poll interval must be positive".to_string());
        }

        ValidationReport { errors }
    }
}

pub fn default_status_color(status: Status) -> Color {
    match status {
        Status::Online => Color::LIME_GREEN,
        Status::Away => Color::GOLDENROD,
        Status::Busy => Color::ORANGE_RED,
        Status::Invisible => Color::SLATE_GRAY,
        Status::Offline => Color::DIM_GRAY,
    }
}

/// Advisory validation outcome shown by the settings editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Identifies which field a change notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    ApiKey,
    SteamId,
    PollIntervalSeconds,
    StatusColor(Status),
    BorderColor,
    /// The derived border color must be re-read.
    BorderBrush,
}

type ChangeListener = Box<dyn Fn(SettingChange) + Send>;

/// Memo cell for the derived border color.
#[derive(Debug, Default)]
struct BorderMemo {
    source_version: Cell<u64>,
    cached: Cell<Option<(u64, Color)>>,
    generation: Cell<u64>,
}

impl BorderMemo {
    fn invalidate(&self) {
        self.source_version.set(self.source_version.get().wrapping_add(1));
    }

    fn get_or_compute(&self, compute: impl FnOnce() -> Color) -> Color {
        let version = self.source_version.get();
        if let Some((cached_version, color)) = self.cached.get() {
            if cached_version == version {
                return color;
            }
        }
        let color = compute();
        self.cached.set(Some((version, color)));
        self.generation.set(self.generation.get().wrapping_add(1));
        color
    }
}

/// Settings shared between the host, the scheduler and the publisher.
///
/// Holders keep the lock only for field reads and writes, never across a
/// network call.
pub type SharedSettings = Arc<Mutex<SettingsStore>>;

/// Locks shared settings, recovering the guard if a holder panicked.
pub fn lock_settings(settings: &SharedSettings) -> MutexGuard<'_, SettingsStore> {
    settings.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the live settings record.
pub struct SettingsStore {
    values: Settings,
    snapshot: Option<Settings>,
    border: BorderMemo,
    theme: Arc<dyn ThemeProvider>,
    persistence: Arc<dyn SettingsPersistence>,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("values", &self.values)
            .field("editing", &self.snapshot.is_some())
            .field("brush_generation", &self.border.generation.get())
            .finish()
    }
}

impl SettingsStore {
    /// Loads persisted settings (or defaults) and makes sure a border color
    /// is stored, seeding it from the theme accent or white.
    pub fn load(
        persistence: Arc<dyn SettingsPersistence>,
        theme: Arc<dyn ThemeProvider>,
    ) -> Self {
        let loaded = persistence.load();
        if loaded.is_none() {
            tracing::info!("No saved settings; using defaults");
        }
        let mut store = Self::from_settings(loaded.unwrap_or_default(), persistence, theme);

        let border_missing = store
            .values
            .border_color
            .as_deref()
            .map_or(true, |value| value.trim().is_empty());
        if border_missing {
            let seeded = store
                .theme
                .accent_color()
                .unwrap_or(Color::WHITE)
                .to_hex();
            store.set_border_color(Some(seeded));
        }
        store
    }

    /// Wraps an existing record without any construction side effects.
    pub fn from_settings(
        values: Settings,
        persistence: Arc<dyn SettingsPersistence>,
        theme: Arc<dyn ThemeProvider>,
    ) -> Self {
        Self {
            values,
            snapshot: None,
            border: BorderMemo::default(),
            theme,
            persistence,
            listeners: Vec::new(),
        }
    }

    pub fn values(&self) -> &Settings {
        &self.values
    }

    pub fn subscribe(&mut self, listener: impl Fn(SettingChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, change: SettingChange) {
        for listener in &self.listeners {
            listener(change);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Fields
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn api_key(&self) -> &str {
        &self.values.api_key
    }

    pub fn set_api_key(&mut self, value: impl Into<String>) {
        self.values.api_key = value.into();
        self.notify(SettingChange::ApiKey);
    }

    pub fn steam_id(&self) -> &str {
        &self.values.steam_id
    }

    pub fn set_steam_id(&mut self, value: impl Into<String>) {
        self.values.steam_id = value.into();
        self.notify(SettingChange::SteamId);
    }

    pub fn poll_interval_seconds(&self) -> i64 {
        self.values.poll_interval_seconds
    }

    pub fn set_poll_interval_seconds(&mut self, value: i64) {
        self.values.poll_interval_seconds = value;
        self.notify(SettingChange::PollIntervalSeconds);
    }

    pub fn status_color_raw(&self, status: Status) -> &str {
        self.values.status_color_raw(status)
    }

    pub fn set_status_color(&mut self, status: Status, value: impl Into<String>) {
        let value = value.into();
        match status {
            Status::Online => self.values.online_color = value,
            Status::Away => self.values.away_color = value,
            Status::Busy => self.values.busy_color = value,
            Status::Invisible => self.values.invisible_color = value,
            Status::Offline => self.values.offline_color = value,
        }
        self.notify(SettingChange::StatusColor(status));
    }

    pub fn status_color(&self, status: Status) -> Color {
        self.values.status_color(status)
    }

    pub fn border_color(&self) -> Option<&str> {
        self.values.border_color.as_deref()
    }

    /// Stores the border color and invalidates the memoized brush, even when
    /// the value is unchanged.
    pub fn set_border_color(&mut self, value: Option<String>) {
        self.values.border_color = value;
        self.border.invalidate();
        self.notify(SettingChange::BorderColor);
        self.notify(SettingChange::BorderBrush);
    }

    /// The memoized border color.
    pub fn border_brush(&self) -> Color {
        self.border.get_or_compute(|| self.resolve_border_color())
    }

    /// Number of times the border color has been computed.
    pub fn brush_generation(&self) -> u64 {
        self.border.generation.get()
    }

    /// Resolves the border color without consulting the memo.
    pub fn resolve_border_color(&self) -> Color {
        if let Some(stored) = self.border_color().filter(|s| !s.trim().is_empty()) {
            match Color::parse(stored) {
                Ok(color) => return color,
                Err(err) => tracing::debug!(error = %err, "Stored border color unusable"),
            }
        }
        self.theme.accent_color().unwrap_or(Color::WHITE)
    }

    pub fn has_credentials(&self) -> bool {
        self.values.has_credentials()
    }

    pub fn effective_poll_interval(&self) -> Duration {
        self.values.effective_poll_interval()
    }

    pub fn validate(&self) -> ValidationReport {
        self.values.validate()
    }

    /// Replaces every field through the setters.
    pub fn apply(&mut self, settings: Settings) {
        let Settings {
            api_key,
            steam_id,
            poll_interval_seconds,
            online_color,
            away_color,
            busy_color,
            invisible_color,
            offline_color,
            border_color,
        } = settings;

        self.set_api_key(api_key);
        self.set_steam_id(steam_id);
        self.set_poll_interval_seconds(poll_interval_seconds);
        self.set_status_color(Status::Online, online_color);
        self.set_status_color(Status::Away, away_color);
        self.set_status_color(Status::Busy, busy_color);
        self.set_status_color(Status::Invisible, invisible_color);
        self.set_status_color(Status::Offline, offline_color);
        self.set_border_color(border_color);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Edit transactions
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn is_editing(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn begin_edit(&mut self) {
        self.snapshot = Some(self.values.clone());
    }

    /// Restores every field from the snapshot taken by `begin_edit`.
    pub fn cancel_edit(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.apply(snapshot);
        }
    }

    /// Persists the current values and drops the snapshot.
    ///
    /// The snapshot is dropped even if saving fails; the values stay applied.
    pub fn end_edit(&mut self) -> Result<()> {
        self.snapshot = None;
        self.persistence.save(&self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FixedTheme, MemoryPersistence, NoTheme};

    fn store_with(settings: Settings) -> (SettingsStore, Arc<MemoryPersistence>) {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = SettingsStore::from_settings(settings, persistence.clone(), Arc::new(NoTheme));
        (store, persistence)
    }

    #[test]
    fn defaults_use_named_colors() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval_seconds, 60);
        assert_eq!(settings.status_color(Status::Online), Color::LIME_GREEN);
        assert_eq!(settings.status_color(Status::Away), Color::GOLDENROD);
        assert_eq!(settings.status_color(Status::Busy), Color::ORANGE_RED);
        assert_eq!(settings.status_color(Status::Invisible), Color::SLATE_GRAY);
        assert_eq!(settings.status_color(Status::Offline), Color::DIM_GRAY);
    }

    #[test]
    fn invalid_status_color_falls_back_per_status() {
        let (mut store, _) = store_with(Settings::default());
        store.set_status_color(Status::Busy, "not a color");
        store.set_status_color(Status::Away, "");
        assert_eq!(store.status_color(Status::Busy), Color::ORANGE_RED);
        assert_eq!(store.status_color(Status::Away), Color::GOLDENROD);
        assert_eq!(store.status_color_raw(Status::Busy), "not a color");
    }

    #[test]
    fn load_seeds_border_from_theme_when_nothing_saved() {
        let accent = Color::rgb(0x12, 0x34, 0x56);
        let store = SettingsStore::load(
            Arc::new(MemoryPersistence::new()),
            Arc::new(FixedTheme(accent)),
        );
        assert_eq!(store.border_color(), Some("#FF123456"));
        assert_eq!(store.border_brush(), accent);
    }

    #[test]
    fn load_seeds_white_border_without_theme() {
        let store = SettingsStore::load(Arc::new(MemoryPersistence::new()), Arc::new(NoTheme));
        assert_eq!(store.border_color(), Some("#FFFFFFFF"));
    }

    #[test]
    fn load_keeps_saved_border_and_fills_blank_one() {
        let saved = Settings {
            api_key: "KEY".into(),
            border_color: Some("#FF000000".into()),
            ..Settings::default()
        };
        let store = SettingsStore::load(
            Arc::new(MemoryPersistence::with_settings(saved)),
            Arc::new(FixedTheme(Color::GOLDENROD)),
        );
        assert_eq!(store.api_key(), "KEY");
        assert_eq!(store.border_color(), Some("#FF000000"));

        let blank = Settings {
            border_color: Some("   ".into()),
            ..Settings::default()
        };
        let store = SettingsStore::load(
            Arc::new(MemoryPersistence::with_settings(blank)),
            Arc::new(FixedTheme(Color::GOLDENROD)),
        );
        assert_eq!(store.border_color(), Some("#FFDAA520"));
    }

    #[test]
    fn border_precedence_stored_then_theme_then_white() {
        let persistence: Arc<dyn SettingsPersistence> = Arc::new(MemoryPersistence::new());
        let mut themed = SettingsStore::from_settings(
            Settings::default(),
            persistence.clone(),
            Arc::new(FixedTheme(Color::SLATE_GRAY)),
        );
        themed.set_border_color(Some("#FF112233".into()));
        assert_eq!(themed.border_brush(), Color::rgb(0x11, 0x22, 0x33));
        themed.set_border_color(Some("garbage".into()));
        assert_eq!(themed.border_brush(), Color::SLATE_GRAY);

        let mut plain =
            SettingsStore::from_settings(Settings::default(), persistence, Arc::new(NoTheme));
        plain.set_border_color(None);
        assert_eq!(plain.border_brush(), Color::WHITE);
    }

    #[test]
    fn border_brush_is_memoized_until_written() {
        let (mut store, _) = store_with(Settings::default());
        store.set_border_color(Some("#FF112233".into()));

        let first = store.border_brush();
        let generation = store.brush_generation();
        assert_eq!(store.border_brush(), first);
        assert_eq!(store.brush_generation(), generation);

        store.set_api_key("unrelated");
        store.set_status_color(Status::Online, "#FF000000");
        assert_eq!(store.border_brush(), first);
        assert_eq!(store.brush_generation(), generation);
    }

    #[test]
    fn writing_same_border_value_forces_recompute() {
        let (mut store, _) = store_with(Settings::default());
        store.set_border_color(Some("#FF112233".into()));
        let before = store.border_brush();
        let generation = store.brush_generation();

        store.set_border_color(Some("#FF112233".into()));
        assert_eq!(store.border_brush(), before);
        assert_eq!(store.brush_generation(), generation + 1);
    }

    #[test]
    fn setters_emit_change_notifications() {
        let (mut store, _) = store_with(Settings::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |change| sink.lock().unwrap().push(change));

        store.set_steam_id("1");
        store.set_border_color(Some("#FFFFFFFF".into()));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                SettingChange::SteamId,
                SettingChange::BorderColor,
                SettingChange::BorderBrush
            ]
        );
    }

    #[test]
    fn cancel_edit_restores_every_field() {
        let original = Settings {
            api_key: "KEY".into(),
            steam_id: "76561197960435530".into(),
            poll_interval_seconds: 30,
            border_color: Some("#FF101010".into()),
            ..Settings::default()
        };
        let (mut store, persistence) = store_with(original.clone());

        store.begin_edit();
        assert!(store.is_editing());
        store.set_api_key("OTHER");
        store.set_steam_id("abc");
        store.set_poll_interval_seconds(0);
        for status in Status::MENU_ORDER {
            store.set_status_color(status, "#FF000000");
        }
        store.set_border_color(None);
        store.cancel_edit();

        assert!(!store.is_editing());
        assert_eq!(store.values(), &original);
        assert_eq!(store.border_brush(), Color::rgb(0x10, 0x10, 0x10));
        assert!(persistence.load().is_none(), "cancel must not persist");
    }

    #[test]
    fn end_edit_persists_current_values() {
        let (mut store, persistence) = store_with(Settings::default());
        store.begin_edit();
        store.set_api_key("KEY");
        store.set_poll_interval_seconds(-5);
        store.end_edit().unwrap();

        assert!(!store.is_editing());
        let saved = persistence.load().unwrap();
        assert_eq!(saved.api_key, "KEY");
        assert_eq!(saved.poll_interval_seconds, -5);

        // Nothing to restore after commit.
        store.cancel_edit();
        assert_eq!(store.api_key(), "KEY");
    }

    #[test]
    fn validation_reports_non_numeric_steam_id() {
        let settings = Settings {
            steam_id: "abc".into(),
            ..Settings::default()
        };
        let report = settings.validate();
        assert!(!report.is_ok());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("numeric"));
    }

    #[test]
    fn validation_reports_non_positive_interval() {
        let settings = Settings {
            poll_interval_seconds: 0,
            ..Settings::default()
        };
        let report = settings.validate();
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("positive"));
    }

    #[test]
    fn validation_reports_both_errors() {
        let settings = Settings {
            steam_id: "abc".into(),
            poll_interval_seconds: 0,
            ..Settings::default()
        };
        assert_eq!(settings.validate().errors.len(), 2);
    }

    #[test]
    fn validation_accepts_blank_and_u64_ids() {
        for steam_id in ["", "   ", "76561197960435530", "18446744073709551615"] {
            let settings = Settings {
                steam_id: steam_id.into(),
                ..Settings::default()
            };
            assert!(settings.validate().is_ok(), "{steam_id:?}");
        }
        for steam_id in ["18446744073709551616", "+5", "-1", "12 34"] {
            let settings = Settings {
                steam_id: steam_id.into(),
                ..Settings::default()
            };
            assert!(!settings.validate().is_ok(), "{steam_id:?}");
        }
    }

    #[test]
    fn validation_does_not_mutate() {
        let (store, _) = store_with(Settings {
            poll_interval_seconds: -1,
            ..Settings::default()
        });
        let _ = store.validate();
        assert_eq!(store.poll_interval_seconds(), -1);
    }

    #[test]
    fn effective_interval_substitutes_default() {
        let mut settings = Settings::default();
        settings.poll_interval_seconds = 0;
        assert_eq!(settings.effective_poll_interval(), Duration::from_secs(60));
        settings.poll_interval_seconds = -30;
        assert_eq!(settings.effective_poll_interval(), Duration::from_secs(60));
        settings.poll_interval_seconds = 5;
        assert_eq!(settings.effective_poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.poll_interval_seconds, 5);
        settings.poll_interval_seconds = i64::MAX;
        assert_eq!(
            settings.effective_poll_interval(),
            Duration::from_secs(i32::MAX as u64)
        );
        assert_eq!(settings.poll_interval_seconds, i64::MAX);
    }

    #[test]
    fn credentials_require_both_non_blank() {
        let mut settings = Settings::default();
        assert!(!settings.has_credentials());
        settings.api_key = "KEY".into();
        assert!(!settings.has_credentials());
        settings.steam_id = "  ".into();
        assert!(!settings.has_credentials());
        settings.steam_id = "1".into();
        assert!(settings.has_credentials());
    }

    #[test]
    fn deserializes_pascal_case_with_missing_fields() {
        let json = r##"{"ApiKey":"K","SteamId":"42","BorderColor":"#FF000000"}"##;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.api_key, "K");
        assert_eq!(settings.steam_id, "42");
        assert_eq!(settings.poll_interval_seconds, 60);
        assert_eq!(settings.online_color, DEFAULT_ONLINE_COLOR);
        assert_eq!(settings.border_color.as_deref(), Some("#FF000000"));
    }
}
