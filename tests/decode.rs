//! Decode tests driven by a CPU-side simulation of the generated shader's
//! write semantics, word-for-word: count bump on every call, 3-word entry
//! stores only below capacity.

use std::time::Duration;

use wgsl_probe::{
    BufferLayout, DebugValue, HangGuard, PassDecoder,
    layout::{ENTRY_WORDS, MARK_UNSET, UNIT_HEADER_WORDS},
};

/// Replays `dbg_init`/`dbg_32m` against a host-side word buffer exactly the
/// way the active WGSL fragment does.
struct ShaderSim {
    layout: BufferLayout,
    words: Vec<u32>,
    unit: usize,
}

impl ShaderSim {
    fn new(layout: BufferLayout) -> Self {
        Self {
            layout,
            words: vec![0u32; layout.total_words()],
            unit: 0,
        }
    }

    fn dbg_init(&mut self, uid: u32) {
        self.unit = self.layout.unit_offset(uid);
        self.words[self.unit] = 0;
    }

    fn dbg_32m(&mut self, mark: u32, raw: u32, vtype: u32) {
        let entry_count = self.words[self.unit];
        self.words[self.unit] = entry_count + 1;
        if entry_count >= self.layout.capacity {
            return;
        }
        let off = self.unit + UNIT_HEADER_WORDS + entry_count as usize * ENTRY_WORDS;
        self.words[off] = vtype;
        self.words[off + 1] = raw;
        self.words[off + 2] = mark;
    }

    fn emit(&mut self, value: DebugValue, mark: Option<u32>) {
        self.dbg_32m(mark.unwrap_or(MARK_UNSET), value.raw_bits(), value.type_tag());
    }
}

#[test]
fn roundtrip_mixed_types_and_marks() {
    let layout = BufferLayout::new(3, 8);
    let mut sim = ShaderSim::new(layout);

    let emitted = [
        (DebugValue::U32(42), None),
        (DebugValue::I32(-17), Some(1)),
        (DebugValue::F32(0.25), Some(2)),
        (DebugValue::U32(u32::MAX), Some(7)),
        (DebugValue::F32(-1.5e-8), None),
        (DebugValue::I32(i32::MIN), None),
    ];
    sim.dbg_init(1);
    for (value, mark) in emitted {
        sim.emit(value, mark);
    }

    let (pass, stats) = PassDecoder::new(layout).decode(&sim.words);
    assert!(!stats.aborted);
    assert_eq!(stats.dropped_calls, 0);
    assert!(!stats.first_overflow);

    assert!(pass.unit(0).is_empty(), "unit 0 never initialized");
    assert!(pass.unit(2).is_empty(), "unit 2 never initialized");

    let got: Vec<_> = pass.unit(1).iter().map(|e| (e.value, e.mark)).collect();
    assert_eq!(got, emitted, "entries must come back in stored order");
    assert!(pass.unit(1).iter().all(|e| !e.processed));
}

#[test]
fn overflow_counts_but_does_not_store() {
    let capacity = 4;
    let layout = BufferLayout::new(1, capacity);
    let mut sim = ShaderSim::new(layout);

    sim.dbg_init(0);
    let k = 11u32;
    for i in 0..k {
        sim.emit(DebugValue::U32(i), None);
    }
    assert_eq!(sim.words[layout.unit_offset(0)], k, "count keeps growing");

    let mut decoder = PassDecoder::new(layout);
    let (pass, stats) = decoder.decode(&sim.words);
    assert_eq!(pass.unit(0).len(), capacity as usize);
    let stored: Vec<_> = pass
        .unit(0)
        .iter()
        .map(|e| match e.value {
            DebugValue::U32(v) => v,
            other => panic!("unexpected value {other:?}"),
        })
        .collect();
    assert_eq!(stored, vec![0, 1, 2, 3], "first `capacity` calls survive");
    assert_eq!(stats.dropped_calls, u64::from(k - capacity));
    assert!(stats.first_overflow, "first overflow must be reported");

    // same decoder, second pass with overflow again: diagnostic fires once
    let (_, stats2) = decoder.decode(&sim.words);
    assert_eq!(stats2.dropped_calls, u64::from(k - capacity));
    assert!(!stats2.first_overflow, "overflow diagnostic is once per setup");
}

#[test]
fn reinit_resets_the_count() {
    let layout = BufferLayout::new(2, 4);
    let mut sim = ShaderSim::new(layout);

    sim.dbg_init(0);
    sim.emit(DebugValue::U32(1), None);
    sim.emit(DebugValue::U32(2), None);
    // next dispatch reuses the unit
    sim.dbg_init(0);
    sim.emit(DebugValue::U32(3), None);

    let (pass, _) = PassDecoder::new(layout).decode(&sim.words);
    let got: Vec<_> = pass.unit(0).iter().map(|e| e.value).collect();
    assert_eq!(got, vec![DebugValue::U32(3)]);
}

#[test]
fn unknown_type_tag_decodes_as_raw_bits() {
    let layout = BufferLayout::new(1, 2);
    let mut sim = ShaderSim::new(layout);
    sim.dbg_init(0);
    sim.dbg_32m(MARK_UNSET, 0xdead_beef, 9);

    let (pass, _) = PassDecoder::new(layout).decode(&sim.words);
    assert_eq!(pass.unit(0)[0].value, DebugValue::U32(0xdead_beef));
    assert_eq!(pass.unit(0)[0].mark, None);
}

/// Clock whose reading jumps past the budget after a fixed number of reads.
struct SteppingClock {
    reads: std::cell::Cell<u32>,
    jump_after: u32,
}

impl wgsl_probe::Clock for SteppingClock {
    fn now(&self) -> Duration {
        let n = self.reads.get();
        self.reads.set(n + 1);
        if n >= self.jump_after {
            Duration::from_secs(60)
        } else {
            Duration::ZERO
        }
    }
}

#[test]
fn guard_abort_yields_partial_pass() {
    // plenty of units so the guard gets polled past its resolution
    let unit_count = 250;
    let layout = BufferLayout::new(unit_count, 2);
    let mut sim = ShaderSim::new(layout);
    for uid in 0..unit_count {
        sim.dbg_init(uid);
        sim.emit(DebugValue::U32(uid), None);
    }

    let guard = HangGuard::with_clock(
        Duration::from_millis(500),
        Box::new(SteppingClock {
            reads: std::cell::Cell::new(0),
            jump_after: 1,
        }),
    );
    let mut decoder = PassDecoder::with_guard(layout, guard);
    let (pass, stats) = decoder.decode(&sim.words);

    assert!(stats.aborted);
    assert_eq!(pass.unit_count(), unit_count, "absent units stay present but empty");
    let decoded = (0..unit_count).filter(|&u| !pass.unit(u).is_empty()).count();
    assert!(
        decoded < unit_count as usize,
        "abort must leave some units undecoded"
    );
    assert!(decoded > 0, "work before the abort is kept");
    // decoded prefix is intact
    assert_eq!(pass.unit(0)[0].value, DebugValue::U32(0));
}
