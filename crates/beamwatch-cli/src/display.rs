//! Plain-text display of presented groups on stdout.

use std::io::Write;

use beamwatch_core::summary::{RowValue, Section, SummaryRow};
use beamwatch_monitor::{DisplaySink, Mode, NavigationState, PresentedGroup};

const LABEL_WIDTH: usize = 26;

pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn write_group(&mut self, group: &PresentedGroup) -> std::io::Result<()> {
        writeln!(
            self.out,
            "\n== {} ({}/{})  completed {}",
            group.group.tag,
            group.position,
            group.total,
            group.group.discovered_at_rfc3339()
        )?;
        writeln!(self.out, "   model: {}", group.paths.model.display())?;
        writeln!(self.out, "   maps:  {}", group.paths.maps.display())?;
        self.write_section(Section::Collection, &group.summary.collection)?;
        self.write_section(Section::Refinement, &group.summary.refinement)?;
        self.out.flush()
    }

    fn write_section(&mut self, section: Section, rows: &[SummaryRow]) -> std::io::Result<()> {
        writeln!(self.out, "-- {}", section.heading())?;
        for row in rows {
            match &row.value {
                RowValue::Scalar(v) => {
                    writeln!(self.out, "   {:<LABEL_WIDTH$} {v}", row.label)?;
                }
                RowValue::Group(parts) => {
                    let joined = parts
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect::<Vec<_>>()
                        .join("  ");
                    writeln!(self.out, "   {:<LABEL_WIDTH$} {joined}", row.label)?;
                }
            }
        }
        Ok(())
    }
}

/// One-line status shown after every mode or cursor change.
pub fn navigation_line(state: NavigationState) -> String {
    match state.mode {
        Mode::Automatic => "[auto] following newest results  (s: stop, q: quit)".to_string(),
        Mode::Manual => {
            let mut keys = Vec::new();
            if state.can_go_previous {
                keys.push("p: previous");
            }
            if state.can_go_next {
                keys.push("n: next");
            }
            keys.extend(["l: latest", "s: start", "q: quit"]);
            format!("[paused] {}", keys.join(", "))
        }
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn present(&mut self, group: &PresentedGroup) {
        if let Err(e) = self.write_group(group) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    fn navigation_changed(&mut self, state: NavigationState) {
        if let Err(e) = writeln!(self.out, "{}", navigation_line(state)) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}
