//! Hand-off of status and border updates to the UI thread.
//!
//! Publishing never renders. [`StatusPublisher`] builds plain data
//! ([`UiUpdate`]) and hands it to a [`UiExecutor`], which queues it for the
//! thread that owns the host surface. That thread drains the queue through a
//! [`UiPump`], the only place a [`StatusSurface`] is touched.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::color::Color;
use crate::error::StatusError;
use crate::host::{ActionLauncher, StatusSurface};
use crate::runtime::StatusHandle;
use crate::settings::{lock_settings, SharedSettings};
use crate::status::Status;

const NOTICE_TITLE: &str = "Steam Status";

/// Everything the host needs to draw the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFrame {
    pub status: Status,
    pub dot: Color,
    pub border: Color,
    pub tooltip: String,
}

/// One selectable line of the status menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub status: Status,
    pub dot: Color,
    pub uri: String,
    pub separator_before: bool,
}

/// A one-line, user-facing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
}

impl UserNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: NOTICE_TITLE.to_string(),
            message: message.into(),
        }
    }

    pub fn status_change_failed() -> Self {
        Self::new("Failed to change Steam status.")
    }

    pub fn menu_failed() -> Self {
        Self::new("Couldn't open the status menu.")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    Icon(IconFrame),
    Border(Color),
    Menu(Vec<MenuEntry>),
    Notice(UserNotice),
}

/// Schedules UI work onto the UI-owning thread.
///
/// `dispatch` always enqueues; it never runs the update on the caller's
/// thread, whichever thread that is.
pub trait UiExecutor: Send + Sync {
    fn dispatch(&self, update: UiUpdate);
}

/// Sending half of the UI queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    tx: Sender<UiUpdate>,
}

impl UiExecutor for ChannelExecutor {
    fn dispatch(&self, update: UiUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("UI pump is gone; dropping update");
        }
    }
}

/// Receiving half of the UI queue, owned by the UI thread.
#[derive(Debug)]
pub struct UiPump {
    rx: Receiver<UiUpdate>,
}

/// Creates a connected executor/pump pair.
pub fn ui_channel() -> (ChannelExecutor, UiPump) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelExecutor { tx }, UiPump { rx })
}

impl UiPump {
    /// Number of updates waiting to be applied.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Applies every queued update and returns how many were applied.
    pub fn drain<S: StatusSurface + ?Sized>(&self, surface: &mut S) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(update) => {
                    apply_update(surface, update);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Waits up to `timeout` for one update and applies it.
    pub fn pump_one<S: StatusSurface + ?Sized>(&self, surface: &mut S, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(update) => {
                apply_update(surface, update);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Applies updates until every executor has been dropped.
    pub fn run<S: StatusSurface + ?Sized>(&self, surface: &mut S) {
        for update in self.rx.iter() {
            apply_update(surface, update);
        }
    }
}

fn apply_update<S: StatusSurface + ?Sized>(surface: &mut S, update: UiUpdate) {
    match update {
        UiUpdate::Icon(frame) => surface.render_icon(&frame),
        UiUpdate::Border(border) => surface.render_border(border),
        UiUpdate::Menu(entries) => {
            if let Err(err) = surface.show_menu(&entries) {
                tracing::warn!(error = %err, "Failed to show status menu");
                surface.show_error(&UserNotice::menu_failed());
            }
        }
        UiUpdate::Notice(notice) => surface.show_error(&notice),
    }
}

/// Builds UI updates from the current settings and queues them.
#[derive(Clone)]
pub struct StatusPublisher {
    settings: SharedSettings,
    executor: Arc<dyn UiExecutor>,
}

impl StatusPublisher {
    pub fn new(settings: SharedSettings, executor: Arc<dyn UiExecutor>) -> Self {
        Self { settings, executor }
    }

    pub fn frame(&self, status: Status) -> IconFrame {
        let settings = lock_settings(&self.settings);
        IconFrame {
            status,
            dot: settings.status_color(status),
            border: settings.border_brush(),
            tooltip: status.tooltip(),
        }
    }

    /// Queues a full icon update for `status`.
    pub fn publish(&self, status: Status) {
        let frame = self.frame(status);
        tracing::debug!(status = %status, dot = %frame.dot, "Publishing status");
        self.executor.dispatch(UiUpdate::Icon(frame));
    }

    /// Queues a border-only update, e.g. after settings were saved.
    pub fn publish_border(&self) {
        let border = lock_settings(&self.settings).border_brush();
        self.executor.dispatch(UiUpdate::Border(border));
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        let settings = lock_settings(&self.settings);
        Status::MENU_ORDER
            .iter()
            .map(|&status| MenuEntry {
                label: status.label().to_string(),
                status,
                dot: settings.status_color(status),
                uri: status.steam_uri(),
                separator_before: status == Status::Offline,
            })
            .collect()
    }

    pub fn open_menu(&self) {
        self.executor.dispatch(UiUpdate::Menu(self.menu_entries()));
    }

    pub fn notify(&self, notice: UserNotice) {
        self.executor.dispatch(UiUpdate::Notice(notice));
    }
}

/// Applies a user-chosen status.
///
/// Launches the status-change URI, then applies `status` locally whether or
/// not the launch succeeded. A failed launch is reported to the user but the
/// local status is not rolled back.
pub fn set_manual(
    status: Status,
    launcher: &dyn ActionLauncher,
    runtime: &StatusHandle,
    publisher: &StatusPublisher,
) -> Result<(), StatusError> {
    let uri = status.steam_uri();
    let launched = launcher.launch(&uri);
    if let Err(err) = &launched {
        tracing::warn!(error = %err, uri = %uri, "Status change request failed");
        publisher.notify(UserNotice::status_change_failed());
    }

    runtime.apply_manual(status);
    tracing::info!(status = %status, "Manual status applied");
    launched
}
