//! Single-field scanner for presence payloads.
//!
//! The presence response is only partially trusted and we need exactly one
//! scalar from it, so this is a substring scan rather than a JSON parse:
//!
//! 1. Find the first case-insensitive occurrence of `"personastate":`
//! 2. Skip whitespace
//! 3. Take the run of ASCII digits that follows
//!
//! The scan does not check what precedes the marker, so a longer key that
//! ends in `personastate` (e.g. `"xpersonastate":`) also matches. The closing
//! quote is part of the marker, so a key that merely starts with it
//! (`"personastateX":`) does not.

const PERSONA_MARKER: &str = "\"personastate\":";

/// Returns the first persona code in `payload`, or `None` when the marker is
/// missing, no digits follow it, or the digits overflow `i32`.
pub fn extract_persona_state(payload: &str) -> Option<i32> {
    let start = find_ascii_case_insensitive(payload, PERSONA_MARKER)? + PERSONA_MARKER.len();

    let rest = payload[start..].trim_start();
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    rest[..digits_len].parse::<i32>().ok()
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
