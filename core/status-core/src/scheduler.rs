//! Periodic presence polling.
//!
//! A single worker thread owns the timer. It is either **Idle** (no timer)
//! or **Active** (fixed period). Every tick, and every on-demand poll, runs on
//! that worker, so two fetches for the same scheduler never overlap; a tick
//! that comes due while another is still in flight simply runs after it.
//!
//! ```text
//! configure(settings) ──► Idle            credentials missing
//!                    └──► Active{period}  both credentials present
//!
//! tick: fetch ─► extract persona ─► resolve ─► apply_poll (publish on change)
//!         │              │
//!         └─ error: log, skip    └─ not found: skip
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::persona::extract_persona_state;
use crate::presence::PresenceClient;
use crate::runtime::StatusHandle;
use crate::settings::{lock_settings, Settings, SharedSettings};
use crate::status::{resolve_persona, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active { period: Duration },
}

impl SchedulerState {
    /// The state a scheduler should be in for `settings`.
    pub fn for_settings(settings: &Settings) -> Self {
        if settings.has_credentials() {
            SchedulerState::Active {
                period: settings.effective_poll_interval(),
            }
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SchedulerState::Active { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCredentials,
    FetchFailed,
    PersonaNotFound,
    ShuttingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    /// Resolved status matched the current one; nothing published.
    Unchanged(Status),
    Published(Status),
}

/// One poll cycle's worth of dependencies.
#[derive(Clone)]
pub struct Poller {
    settings: SharedSettings,
    client: Arc<dyn PresenceClient>,
    runtime: StatusHandle,
    stopping: Arc<AtomicBool>,
}

impl Poller {
    pub fn new(
        settings: SharedSettings,
        client: Arc<dyn PresenceClient>,
        runtime: StatusHandle,
    ) -> Self {
        Self {
            settings,
            client,
            runtime,
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one poll cycle on the calling thread.
    ///
    /// Credentials are copied out under the settings lock, which is released
    /// before the network call.
    pub fn tick(&self) -> TickOutcome {
        let (api_key, steam_id) = {
            let settings = lock_settings(&self.settings);
            if !settings.has_credentials() {
                return TickOutcome::Skipped(SkipReason::NoCredentials);
            }
            (
                settings.api_key().trim().to_string(),
                settings.steam_id().trim().to_string(),
            )
        };

        let payload = match self.client.fetch(&api_key, &steam_id) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "Presence fetch failed; skipping cycle");
                return TickOutcome::Skipped(SkipReason::FetchFailed);
            }
        };

        if self.stopping.load(Ordering::SeqCst) {
            tracing::debug!("Discarding presence response after shutdown");
            return TickOutcome::Skipped(SkipReason::ShuttingDown);
        }

        let Some(code) = extract_persona_state(&payload) else {
            tracing::debug!(bytes = payload.len(), "No persona state in presence payload");
            return TickOutcome::Skipped(SkipReason::PersonaNotFound);
        };

        let status = resolve_persona(code);
        if self.runtime.apply_poll(status) {
            TickOutcome::Published(status)
        } else {
            tracing::debug!(persona = code, status = %status, "Presence unchanged");
            TickOutcome::Unchanged(status)
        }
    }
}

enum Control {
    Configure(SchedulerState),
    PollNow(Sender<TickOutcome>),
    Shutdown,
}

/// Owner of the polling worker thread.
pub struct PollScheduler {
    tx: Sender<Control>,
    state: Mutex<SchedulerState>,
    stopping: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    /// Starts the worker in the Idle state.
    pub fn spawn(poller: Poller) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let stopping = poller.stopping.clone();
        let worker = thread::Builder::new()
            .name("presence-poller".into())
            .spawn(move || run_worker(rx, poller));
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::error!(error = %err, "Failed to spawn presence poller");
                None
            }
        };

        Self {
            tx,
            state: Mutex::new(SchedulerState::Idle),
            stopping,
            worker: Mutex::new(worker),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recomputes the timer state from `settings`.
    ///
    /// The new state is observable as soon as this returns and the worker
    /// picks it up before its next tick; an Active state restarts the period.
    pub fn configure(&self, settings: &Settings) -> SchedulerState {
        let next = SchedulerState::for_settings(settings);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *state, next);
        // Sent under the guard so the worker sees configurations in the
        // same order as `state()`.
        let sent = self.tx.send(Control::Configure(next));
        drop(state);

        if previous != next {
            match next {
                SchedulerState::Active { period } => {
                    tracing::info!(period_secs = period.as_secs(), "Presence polling active")
                }
                SchedulerState::Idle => tracing::info!("Presence polling idle"),
            }
        }

        if sent.is_err() {
            tracing::warn!("Presence poller is not running");
        }
        next
    }

    /// Runs one cycle on the worker, after any tick already in flight.
    pub fn poll_now(&self) -> Option<TickOutcome> {
        let (reply, answer) = crossbeam_channel::bounded(1);
        self.tx.send(Control::PollNow(reply)).ok()?;
        answer.recv().ok()
    }

    /// Disables the timer. An in-flight request is allowed to finish and its
    /// result is discarded.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SchedulerState::Idle;
        let _ = self.tx.send(Control::Shutdown);
    }

    /// Waits for the worker thread to exit. Call after [`Self::shutdown`].
    pub fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Presence poller panicked");
            }
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(rx: Receiver<Control>, poller: Poller) {
    let mut period: Option<Duration> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let message = match deadline {
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    Err(RecvTimeoutError::Timeout)
                } else {
                    rx.recv_timeout(at - now)
                }
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(Control::Configure(state)) => {
                period = match state {
                    SchedulerState::Active { period } => Some(period),
                    SchedulerState::Idle => None,
                };
                // An unrepresentable deadline means the timer never fires.
                deadline = period.and_then(|period| Instant::now().checked_add(period));
            }
            Ok(Control::PollNow(reply)) => {
                let _ = reply.send(poller.tick());
            }
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let outcome = poller.tick();
                tracing::debug!(outcome = ?outcome, "Presence tick");
                deadline = match (deadline, period) {
                    (Some(at), Some(period)) => {
                        let now = Instant::now();
                        // Ticks that came due during a slow fetch are dropped.
                        match at.checked_add(period) {
                            Some(next) if next > now => Some(next),
                            _ => now.checked_add(period),
                        }
                    }
                    _ => None,
                };
            }
        }
    }
    tracing::debug!("Presence poller stopped");
}
