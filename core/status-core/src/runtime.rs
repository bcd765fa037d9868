//! The process-wide "current status" cell.
//!
//! One thread owns the current status and is its only writer. Poll results
//! and manual selections reach it as messages, each answered once applied, so
//! read-modify-write never races and callers see the serialized outcome. The
//! owner also queues the UI publish while handling the message, which keeps
//! publishes in the same order as the writes.

use std::thread;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};

use crate::publisher::StatusPublisher;
use crate::status::Status;

/// Where the most recent write came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Poll,
    Manual,
}

/// A point-in-time copy of the runtime status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub status: Status,
    pub origin: Option<Origin>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Number of UI publishes requested so far.
    pub publishes: u64,
}

enum Command {
    Apply {
        origin: Origin,
        status: Status,
        reply: Sender<bool>,
    },
    Snapshot {
        reply: Sender<StatusSnapshot>,
    },
    Shutdown,
}

/// Handle to the status owner thread. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    tx: Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Apply { origin, status, .. } => f
                .debug_struct("Apply")
                .field("origin", origin)
                .field("status", status)
                .finish(),
            Command::Snapshot { .. } => f.write_str("Snapshot"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Starts the owner thread with the status initialized to `Offline`.
pub fn spawn_status_owner(publisher: StatusPublisher) -> StatusHandle {
    let (tx, rx) = crossbeam_channel::unbounded();
    if let Err(err) = thread::Builder::new()
        .name("status-owner".into())
        .spawn(move || run_owner(rx, publisher))
    {
        tracing::error!(error = %err, "Failed to spawn status owner");
    }
    StatusHandle { tx }
}

fn run_owner(rx: Receiver<Command>, publisher: StatusPublisher) {
    let mut snapshot = StatusSnapshot::default();

    for command in rx.iter() {
        match command {
            Command::Apply {
                origin,
                status,
                reply,
            } => {
                let changed = status != snapshot.status;
                // Manual selections always repaint; poll results only on change.
                let publish = changed || origin == Origin::Manual;
                if publish {
                    snapshot.status = status;
                    snapshot.origin = Some(origin);
                    snapshot.updated_at = Some(Utc::now());
                    snapshot.publishes += 1;
                    publisher.publish(status);
                }
                if changed {
                    tracing::info!(status = %status, origin = ?origin, "Status changed");
                }
                let _ = reply.send(changed);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(snapshot.clone());
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("Status owner stopped");
}

impl StatusHandle {
    /// Applies a poll result. Publishes and returns true only if the status
    /// differs from the current one.
    pub fn apply_poll(&self, status: Status) -> bool {
        self.apply(Origin::Poll, status)
    }

    /// Applies a manual selection. Always publishes; returns whether the
    /// status changed.
    pub fn apply_manual(&self, status: Status) -> bool {
        self.apply(Origin::Manual, status)
    }

    fn apply(&self, origin: Origin, status: Status) -> bool {
        let (reply, answer) = crossbeam_channel::bounded(1);
        if self
            .tx
            .send(Command::Apply {
                origin,
                status,
                reply,
            })
            .is_err()
        {
            tracing::warn!(status = %status, origin = ?origin, "Status owner stopped; update dropped");
            return false;
        }
        answer.recv().unwrap_or(false)
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let (reply, answer) = crossbeam_channel::bounded(1);
        if self.tx.send(Command::Snapshot { reply }).is_err() {
            return StatusSnapshot::default();
        }
        answer.recv().unwrap_or_default()
    }

    pub fn current(&self) -> Status {
        self.snapshot().status
    }

    /// Stops the owner thread after it finishes queued messages.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}
