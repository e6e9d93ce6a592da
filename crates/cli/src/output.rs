//! Console rendering of simulation events.

use std::{io::Write, time::Duration};

use railcross_core::{Event, EventKind, EventSink};
use tracing::warn;

/// Format an offset from the start of the run as `HH:MM:SS.s`, rounded to the
/// nearest tenth of a second.
pub fn format_timestamp(at: Duration) -> String {
    let tenths = (at.as_nanos() + 50_000_000) / 100_000_000;
    let hours = tenths / 36_000;
    let minutes = tenths / 600 % 60;
    let seconds = tenths / 10 % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{}", tenths % 10)
}

/// Human-readable line for one event, without a trailing newline.
pub fn format_event(event: &Event) -> String {
    let what = match event.kind {
        EventKind::Ready { .. } => format!("is ready to go {}", event.direction),
        EventKind::OnTrack => format!("is ON the main track going {}", event.direction),
        EventKind::OffTrack => format!("is OFF the main track after going {}", event.direction),
    };
    format!("{} Train {} {}", format_timestamp(event.at), event.train, what)
}

/// Writes each event as one line, flushing so lines appear as they happen.
pub struct ConsoleSink<W> {
    writer: W,
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: &Event) {
        let line = format_event(event);
        if let Err(err) = writeln!(self.writer, "{line}").and_then(|_| self.writer.flush()) {
            warn!(?err, "failed to write event");
        }
    }
}
