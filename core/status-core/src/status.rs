//! The local status enumeration and the persona-code mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five statuses the indicator can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Offline,
    Online,
    Away,
    Busy,
    Invisible,
}

impl Status {
    /// Menu order. The host draws a separator before `Offline`.
    pub const MENU_ORDER: [Status; 5] = [
        Status::Online,
        Status::Away,
        Status::Busy,
        Status::Invisible,
        Status::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Offline => "offline",
            Status::Online => "online",
            Status::Away => "away",
            Status::Busy => "busy",
            Status::Invisible => "invisible",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Offline => "Offline",
            Status::Online => "Online",
            Status::Away => "Away",
            Status::Busy => "Busy",
            Status::Invisible => "Invisible",
        }
    }

    pub fn tooltip(&self) -> String {
        format!("Steam status: {}", self.label())
    }

    /// URI handed to the Steam client to request this status.
    pub fn steam_uri(&self) -> String {
        format!("steam://friends/status/{}", self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(Status::Offline),
            "online" => Ok(Status::Online),
            "away" => Ok(Status::Away),
            "busy" => Ok(Status::Busy),
            "invisible" => Ok(Status::Invisible),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

/// Maps a presence-service persona code to a local status.
///
/// Steam persona states: 0 offline, 1 online, 2 busy, 3 away, 4 snooze,
/// 5 looking to trade, 6 looking to play. Trade/play and unknown codes
/// collapse to `Offline`; `Invisible` is only ever set manually.
pub fn resolve_persona(code: i32) -> Status {
    match code {
        1 => Status::Online,
        2 => Status::Busy,
        3 | 4 => Status::Away,
        _ => Status::Offline,
    }
}
