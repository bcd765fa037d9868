//! Integration tests for the engine wired to file-backed settings.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use steam_status_core::{
    ui_channel, Color, HostServices, IconFrame, JsonSettingsFile, MenuEntry, NoTheme,
    PresenceClient, SchedulerState, Settings, SettingsPersistence, Status, StatusEngine,
    StatusError, StatusSurface, StorageConfig, TickOutcome, UiPump, UserNotice,
};
use tempfile::TempDir;

#[derive(Default)]
struct ScriptedPresence {
    responses: Mutex<VecDeque<steam_status_core::Result<String>>>,
}

impl ScriptedPresence {
    fn personas(codes: &[i32]) -> Self {
        let responses = codes
            .iter()
            .map(|code| {
                Ok(format!(
                    r#"{{"response":{{"players":[{{"steamid":"76561197960435530","communityvisibilitystate":3,"personastate":{code},"personaname":"tester"}}]}}}}"#
                ))
            })
            .collect();
        Self {
            responses: Mutex::new(responses),
        }
    }

    fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(StatusError::HttpStatus {
                status: 403,
            })])),
        }
    }
}

impl PresenceClient for ScriptedPresence {
    fn fetch(&self, _api_key: &str, _steam_id: &str) -> steam_status_core::Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StatusError::Network("script exhausted".into())))
    }
}

#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
    fail: bool,
}

impl steam_status_core::ActionLauncher for RecordingLauncher {
    fn launch(&self, uri: &str) -> steam_status_core::Result<()> {
        self.launched.lock().unwrap().push(uri.to_string());
        if self.fail {
            return Err(StatusError::ExternalAction {
                target: uri.to_string(),
                details: "Steam is not installed".into(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSurface {
    icons: Vec<IconFrame>,
    borders: Vec<Color>,
    menus: Vec<Vec<MenuEntry>>,
    errors: Vec<UserNotice>,
}

impl StatusSurface for RecordingSurface {
    fn render_icon(&mut self, frame: &IconFrame) {
        self.icons.push(frame.clone());
    }

    fn render_border(&mut self, border: Color) {
        self.borders.push(border);
    }

    fn show_menu(&mut self, entries: &[MenuEntry]) -> steam_status_core::Result<()> {
        self.menus.push(entries.to_vec());
        Ok(())
    }

    fn show_error(&mut self, notice: &UserNotice) {
        self.errors.push(notice.clone());
    }
}

struct Fixture {
    _dir: TempDir,
    file: JsonSettingsFile,
    engine: StatusEngine,
    pump: UiPump,
    launcher: Arc<RecordingLauncher>,
}

fn credentials() -> Settings {
    Settings {
        api_key: "KEY".into(),
        steam_id: "76561197960435530".into(),
        ..Settings::default()
    }
}

fn fixture(saved: Option<Settings>, presence: ScriptedPresence, launcher: RecordingLauncher) -> Fixture {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig::with_root(dir.path().to_path_buf());
    let file = JsonSettingsFile::from_storage(&storage);
    if let Some(saved) = saved {
        file.save(&saved).unwrap();
    }

    let launcher = Arc::new(launcher);
    let (executor, pump) = ui_channel();
    let engine = StatusEngine::start(HostServices {
        persistence: Arc::new(file.clone()),
        theme: Arc::new(NoTheme),
        launcher: launcher.clone(),
        presence: Arc::new(presence),
        executor: Arc::new(executor),
    });

    Fixture {
        _dir: dir,
        file,
        engine,
        pump,
        launcher,
    }
}

#[test]
fn test_snooze_resolves_to_away_and_publishes_once() {
    let f = fixture(
        Some(credentials()),
        ScriptedPresence::personas(&[4, 4]),
        RecordingLauncher::default(),
    );

    assert_eq!(f.engine.poll_now().unwrap(), TickOutcome::Published(Status::Away));
    assert_eq!(f.engine.poll_now().unwrap(), TickOutcome::Unchanged(Status::Away));

    let mut surface = RecordingSurface::default();
    f.pump.drain(&mut surface);
    assert_eq!(surface.icons.len(), 1);
    assert_eq!(surface.icons[0].status, Status::Away);
    assert_eq!(surface.icons[0].dot, Color::GOLDENROD);
    assert_eq!(surface.icons[0].tooltip, "Steam status: Away");
}

#[test]
fn test_manual_busy_then_matching_poll_is_not_republished() {
    let f = fixture(
        Some(credentials()),
        ScriptedPresence::personas(&[2]),
        RecordingLauncher::default(),
    );

    f.engine.set_manual(Status::Busy).unwrap();
    assert_eq!(f.engine.poll_now().unwrap(), TickOutcome::Unchanged(Status::Busy));

    let mut surface = RecordingSurface::default();
    f.pump.drain(&mut surface);
    let statuses: Vec<_> = surface.icons.iter().map(|frame| frame.status).collect();
    assert_eq!(statuses, vec![Status::Busy]);
    assert_eq!(
        f.launcher.launched.lock().unwrap().as_slice(),
        ["steam://friends/status/busy"]
    );
}

#[test]
fn test_failed_launch_notifies_and_keeps_local_status() {
    let f = fixture(
        None,
        ScriptedPresence::default(),
        RecordingLauncher {
            fail: true,
            ..RecordingLauncher::default()
        },
    );

    assert!(f.engine.set_manual(Status::Invisible).is_err());
    assert_eq!(f.engine.current_status(), Status::Invisible);

    let mut surface = RecordingSurface::default();
    f.pump.drain(&mut surface);
    assert_eq!(surface.errors, vec![UserNotice::status_change_failed()]);
    assert_eq!(surface.icons.last().map(|frame| frame.status), Some(Status::Invisible));
}

#[test]
fn test_fetch_failure_leaves_status_alone() {
    let f = fixture(
        Some(credentials()),
        ScriptedPresence::failing(),
        RecordingLauncher::default(),
    );

    assert!(matches!(f.engine.poll_now().unwrap(), TickOutcome::Skipped(_)));
    assert_eq!(f.engine.current_status(), Status::Offline);
    assert_eq!(f.pump.pending(), 0);
}

#[test]
fn test_settings_edit_round_trip_through_file() {
    let f = fixture(None, ScriptedPresence::default(), RecordingLauncher::default());
    assert_eq!(f.engine.scheduler_state(), SchedulerState::Idle);

    f.engine.begin_edit();
    f.engine.with_settings(|store| {
        store.set_api_key("KEY");
        store.set_steam_id("76561197960435530");
        store.set_poll_interval_seconds(-5);
        store.set_status_color(Status::Online, "#00FF00");
    });
    f.engine.end_edit().unwrap();

    assert_eq!(
        f.engine.scheduler_state(),
        SchedulerState::Active {
            period: std::time::Duration::from_secs(60)
        }
    );
    let saved = f.file.load().unwrap();
    assert_eq!(saved.poll_interval_seconds, -5);
    assert_eq!(saved.online_color, "#00FF00");
    assert_eq!(saved.border_color.as_deref(), Some("#FFFFFFFF"));
    assert!(!f.engine.validate().is_ok());

    f.engine.begin_edit();
    f.engine.with_settings(|store| store.set_api_key(""));
    f.engine.cancel_edit();
    assert_eq!(f.engine.values().api_key, "KEY");
    assert!(f.engine.scheduler_state().is_active());
}

#[test]
fn test_clearing_credentials_idles_scheduler() {
    let f = fixture(
        Some(credentials()),
        ScriptedPresence::default(),
        RecordingLauncher::default(),
    );
    assert!(f.engine.scheduler_state().is_active());

    let mut cleared = f.engine.values();
    cleared.steam_id = "   ".into();
    f.engine.save_settings(cleared).unwrap();
    assert_eq!(f.engine.scheduler_state(), SchedulerState::Idle);
}

#[test]
fn test_menu_uses_configured_colors() {
    let f = fixture(
        Some(Settings {
            busy_color: "not a color".into(),
            away_color: "#F00".into(),
            ..Settings::default()
        }),
        ScriptedPresence::default(),
        RecordingLauncher::default(),
    );

    f.engine.open_menu();
    let mut surface = RecordingSurface::default();
    f.pump.drain(&mut surface);

    let menu = &surface.menus[0];
    assert_eq!(menu[1].status, Status::Away);
    assert_eq!(menu[1].dot, Color::rgb(0xFF, 0, 0));
    assert_eq!(menu[2].dot, Color::ORANGE_RED);
}
