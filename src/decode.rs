//! Host-side decode of one raw buffer snapshot into a [`Pass`].
//!
//! Pure CPU work over a word slice, so it is exercised directly by tests
//! without a device. The capture session feeds it the mapped readback
//! contents.

use crate::{
    hang::{HANG_RESOLUTION, HangGuard, Verdict},
    layout::{BufferLayout, HEADER_WORDS, MARK_UNSET, TYPE_F32, TYPE_I32, TYPE_U32},
    record::{DebugEntry, DebugValue, Pass},
};

/// What one decode observed, beyond the pass itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// The hang guard stopped the decode early; units past the stop point
    /// are present but empty, and the pass must be treated as partial.
    pub aborted: bool,
    /// Calls that bumped a unit's count past capacity and were not stored.
    pub dropped_calls: u64,
    /// True only on the first decode of this decoder's life that observed
    /// dropped calls; drives the once-per-configuration overflow warning.
    pub first_overflow: bool,
}

/// Decodes snapshots for one buffer configuration. Holds the hang guard and
/// the overflow-warning gate across passes; reconfiguring the session makes
/// a fresh one.
pub struct PassDecoder {
    layout: BufferLayout,
    guard: HangGuard,
    overflow_reported: bool,
}

impl PassDecoder {
    pub fn new(layout: BufferLayout) -> Self {
        Self::with_guard(layout, HangGuard::default())
    }

    pub fn with_guard(layout: BufferLayout, guard: HangGuard) -> Self {
        Self {
            layout,
            guard,
            overflow_reported: false,
        }
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    /// Decode one snapshot. `words` must hold at least
    /// `layout.total_words()` words.
    ///
    /// Entries come out in stored order per unit. A count word larger than
    /// capacity means detail was dropped on the device; the excess is
    /// reported, not an error. A guard abort stops iteration immediately
    /// and the partially filled pass is returned as-is.
    pub fn decode(&mut self, words: &[u32]) -> (Pass, DecodeStats) {
        debug_assert!(
            words.len() >= self.layout.total_words(),
            "snapshot too small: have {} words, layout needs {}",
            words.len(),
            self.layout.total_words()
        );

        let mut pass = Pass::with_unit_count(self.layout.unit_count);
        let mut stats = DecodeStats::default();
        self.guard.reset();

        for uid in 0..self.layout.unit_count {
            if self.guard.poll("decode", HANG_RESOLUTION) == Verdict::Abort {
                stats.aborted = true;
                break;
            }
            let count = words[self.layout.unit_offset(uid)];
            if count == 0 {
                continue;
            }
            if count > self.layout.capacity {
                stats.dropped_calls += u64::from(count - self.layout.capacity);
            }
            let stored = count.min(self.layout.capacity);
            let unit = pass.unit_mut(uid);
            unit.reserve(stored as usize);
            for entry in 0..stored {
                let off = self.layout.entry_offset(uid, entry);
                let raw = words[off + 1];
                let value = match words[off] {
                    TYPE_U32 => DebugValue::U32(raw),
                    TYPE_I32 => DebugValue::I32(raw as i32),
                    TYPE_F32 => DebugValue::F32(f32::from_bits(raw)),
                    // unknown tag: keep the raw bits rather than failing
                    _ => DebugValue::U32(raw),
                };
                let mark = match words[off + 2] {
                    MARK_UNSET => None,
                    m => Some(m),
                };
                unit.push(DebugEntry::new(value, mark));
            }
        }

        if stats.dropped_calls > 0 && !self.overflow_reported {
            self.overflow_reported = true;
            stats.first_overflow = true;
        }
        (pass, stats)
    }
}

/// The reserved 16-word header, for diagnostic dumps.
pub fn header_words(words: &[u32]) -> &[u32] {
    &words[..HEADER_WORDS.min(words.len())]
}
