//! Notification seam between the capture session and whatever visualizes
//! the decoded data (a table widget, a logger, a test probe).

use crate::record::Record;

/// Implemented by visualizers. The session calls `reset` on every
/// reconfiguration and `update` after every completed (or aborted) decode.
/// Implementations read the record; they never mutate capture state.
pub trait Output {
    fn reset(&mut self);
    fn update(&mut self, record: &Record);
}

/// Fallback output that logs the latest pass, one line per unit:
/// `uid [entry_count] entries...`.
#[derive(Debug, Default)]
pub struct LogOutput;

impl Output for LogOutput {
    fn reset(&mut self) {
        log::info!("debug record cleared");
    }

    fn update(&mut self, record: &Record) {
        let Some(pass) = record.last() else {
            return;
        };
        let mut dump = String::new();
        for (uid, entries) in pass.units().enumerate() {
            dump.push_str(&format!("{uid} [{}]", entries.len()));
            for e in entries {
                match e.mark {
                    Some(m) => dump.push_str(&format!(" {}#{m}", e.value)),
                    None => dump.push_str(&format!(" {}", e.value)),
                }
            }
            dump.push('\n');
        }
        log::info!("pass {}:\n{dump}", record.len() - 1);
    }
}
