//! Text rendering of the indicator for terminals.

use std::io::Write;

use steam_status_core::{Color, IconFrame, MenuEntry, Result, StatusError, StatusSurface, UserNotice};

/// Writes one line per icon or border update to `out`; notices go to stderr.
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSurface for TerminalSurface<W> {
    fn render_icon(&mut self, frame: &IconFrame) {
        let _ = writeln!(
            self.out,
            "● {:<9} dot={} border={}  {}",
            frame.status.label(),
            frame.dot,
            frame.border,
            frame.tooltip
        );
    }

    fn render_border(&mut self, border: Color) {
        let _ = writeln!(self.out, "border {border}");
    }

    fn show_menu(&mut self, entries: &[MenuEntry]) -> Result<()> {
        let write_menu = |out: &mut W| -> std::io::Result<()> {
            for entry in entries {
                if entry.separator_before {
                    writeln!(out, "  ──────────")?;
                }
                writeln!(out, "  {} {:<9} {}", entry.dot, entry.label, entry.uri)?;
            }
            out.flush()
        };
        write_menu(&mut self.out).map_err(|err| StatusError::MenuRender(err.to_string()))
    }

    fn show_error(&mut self, notice: &UserNotice) {
        eprintln!("{}: {}", notice.title, notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steam_status_core::Status;

    #[test]
    fn icon_line_shows_status_and_colors() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render_icon(&IconFrame {
            status: Status::Away,
            dot: Color::GOLDENROD,
            border: Color::WHITE,
            tooltip: Status::Away.tooltip(),
        });
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains("Away"), "{out}");
        assert!(out.contains("dot=#FFDAA520"), "{out}");
        assert!(out.contains("border=#FFFFFFFF"), "{out}");
        assert!(out.trim_end().ends_with("Steam status: Away"), "{out}");
    }

    #[test]
    fn menu_draws_separator_before_offline() {
        let mut surface = TerminalSurface::new(Vec::new());
        let entries: Vec<_> = Status::MENU_ORDER
            .iter()
            .map(|&status| MenuEntry {
                label: status.label().to_string(),
                status,
                dot: Color::WHITE,
                uri: status.steam_uri(),
                separator_before: status == Status::Offline,
            })
            .collect();
        surface.show_menu(&entries).unwrap();

        let out = String::from_utf8(surface.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[4].contains('─'));
        assert!(lines[5].contains("Offline"));
    }
}
